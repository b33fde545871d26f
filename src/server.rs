use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::models::{ChatMode, ChatRequest};
use crate::normalize::normalize;
use crate::reframe::{reframe_body, FrameTransform, ReframeMode, Reframer};
use crate::util::{cors_layer_from_env, AppState};

/// Query parameters for the completion endpoint.
#[derive(Debug, Deserialize)]
pub struct CompletionQuery {
    /// Service identifier fallback when the model string carries none.
    pub service: Option<String>,
}

/// Build the Axum router over the gateway endpoints.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/models", get(list_models))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors_layer_from_env())
}

/// Liveness endpoint.
async fn index() -> &'static str {
    "Unified LLM Gateway"
}

/// Model listing endpoint. The gateway holds no model catalog of its own.
async fn list_models() -> impl IntoResponse {
    Json(serde_json::json!({
        "object": "list",
        "data": []
    }))
}

/// Split the composite `<model>[:<service>[:<accessKey>]]` form.
pub fn split_model(model: &str) -> (&str, Option<&str>, Option<&str>) {
    let mut parts = model.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    (name, parts.next(), parts.next())
}

/// Unified completion endpoint: resolve the provider, normalize the request,
/// call upstream and pipe the body back through the reframing engine.
async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompletionQuery>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, GatewayError> {
    let (model, inline_service, inline_key) = split_model(&request.model);
    let model = model.to_string();
    let service = inline_service
        .map(str::to_string)
        .or(query.service)
        .unwrap_or_else(|| "openai".to_string());
    let bearer = match inline_key {
        Some(key) => Some(format!("Bearer {key}")),
        None => headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let descriptor = state
        .providers
        .lookup(&service)
        .ok_or_else(|| GatewayError::UnknownService(service.clone()))?;
    let bearer = bearer
        .filter(|b| !b.trim().is_empty())
        .ok_or(GatewayError::MissingCredential)?;

    let mut request = request;
    request.model = model;
    let streaming = request.is_streaming();

    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        %service,
        model = %request.model,
        stream = streaming,
        "dispatching chat completion"
    );

    let normalized = normalize(descriptor, &request, &bearer)?;
    let url = format!("{}{}", descriptor.base_url, normalized.path);
    let upstream = state
        .http
        .post(&url)
        .headers(normalized.headers)
        .json(&normalized.body)
        .send()
        .await?;

    let status = upstream.status();
    if !status.is_success() {
        tracing::warn!(%request_id, %status, "upstream returned an error status");
        let bytes = upstream.bytes().await.unwrap_or_default();
        return Ok((status, bytes).into_response());
    }

    let upstream_content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let mode = match descriptor.response_transform {
        None => ReframeMode::PassThrough,
        Some(transform) => {
            let chat_mode = if streaming {
                ChatMode::Chunk
            } else {
                ChatMode::Completion
            };
            let frame_transform = FrameTransform::new(request.model.clone(), chat_mode, transform);
            if streaming {
                ReframeMode::EventStream(frame_transform)
            } else {
                ReframeMode::Document(frame_transform)
            }
        }
    };

    let content_type = match &mode {
        ReframeMode::PassThrough => upstream_content_type.unwrap_or_else(|| {
            if streaming {
                HeaderValue::from_static("text/event-stream")
            } else {
                HeaderValue::from_static("application/json")
            }
        }),
        ReframeMode::Document(_) => HeaderValue::from_static("application/json"),
        ReframeMode::EventStream(_) => HeaderValue::from_static("text/event-stream"),
    };

    let reframer = Reframer::new(mode, descriptor.delimiter);
    let body = Body::from_stream(reframe_body(upstream.bytes_stream(), reframer));

    let response = http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .body(body)
        .unwrap();
    Ok(response)
}
