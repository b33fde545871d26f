use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing_subscriber::{fmt, EnvFilter};

use crate::providers::ProviderRegistry;

/// Initialize dotenv and structured tracing based on RUST_LOG.
///
/// The `.env` file (if any) is loaded first so it can provide RUST_LOG
/// itself; existing process environment always wins.
pub fn init_tracing() {
    let env_source = match dotenvy::dotenv() {
        Ok(path) => path.display().to_string(),
        Err(_) => "none".into(),
    };

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Get the bind address for the HTTP server from env or default to 0.0.0.0:8080.
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into())
}

/// Shared application state used by the HTTP server and handlers.
pub struct AppState {
    pub http: reqwest::Client,
    pub providers: Arc<ProviderRegistry>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            http: build_http_client_from_env(),
            providers: ProviderRegistry::shared(),
        }
    }
}

impl AppState {
    /// State over an explicit registry (tests wire mock upstreams this way).
    pub fn with_providers(providers: Arc<ProviderRegistry>) -> Self {
        Self {
            http: build_http_client_from_env(),
            providers,
        }
    }
}

/// Build an HTTP client honoring proxy and timeout environment variables.
///
/// Environment:
/// - UNILLM_NO_PROXY = 1|true|yes|on     -> disable all proxies
/// - UNILLM_PROXY_URL = <url>            -> proxy for all schemes
/// - HTTP_PROXY / http_proxy             -> HTTP proxy
/// - HTTPS_PROXY / https_proxy           -> HTTPS proxy
/// - UNILLM_HTTP_TIMEOUT_SECONDS         -> overall request timeout (u64)
pub fn build_http_client_from_env() -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    if let Ok(secs) = std::env::var("UNILLM_HTTP_TIMEOUT_SECONDS") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            builder = builder.timeout(Duration::from_secs(n));
        }
    }

    let no_proxy = std::env::var("UNILLM_NO_PROXY")
        .map(|v| v.trim().to_ascii_lowercase())
        .map(|v| v == "1" || v == "true" || v == "yes" || v == "on")
        .unwrap_or(false);

    if no_proxy {
        builder = builder.no_proxy();
    } else {
        if let Ok(url) = std::env::var("UNILLM_PROXY_URL") {
            let u = url.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::all(u) {
                    builder = builder.proxy(p);
                }
            }
        }
        if let Ok(http_p) = std::env::var("HTTP_PROXY").or_else(|_| std::env::var("http_proxy")) {
            let u = http_p.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::http(u) {
                    builder = builder.proxy(p);
                }
            }
        }
        if let Ok(https_p) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("https_proxy"))
        {
            let u = https_p.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::https(u) {
                    builder = builder.proxy(p);
                }
            }
        }
    }

    builder = builder.user_agent(format!("unillm/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}

/// Build a JSON error response with the given HTTP status and message.
pub fn error_response(status: StatusCode, msg: &str) -> Response {
    let body = serde_json::json!({ "error": { "message": msg } });
    (status, axum::Json(body)).into_response()
}

/// Milliseconds since the Unix epoch, for provider transforms that stamp a
/// `created` field onto fabricated frames.
pub fn now_epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Build a CORS layer from environment variables.
///
/// CORS_ALLOWED_ORIGINS: "*" or comma-separated origins; defaults are
/// permissive (Any) when not configured. Methods and headers stay
/// permissive.
pub fn cors_layer_from_env() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowOrigin, Any, CorsLayer};

    let mut layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match std::env::var("CORS_ALLOWED_ORIGINS") {
        Ok(origins) if origins.trim() != "*" => {
            let vals: Vec<_> = origins
                .split(',')
                .filter_map(|part| http::HeaderValue::from_str(part.trim()).ok())
                .collect();
            if vals.is_empty() {
                layer = layer.allow_origin(Any);
            } else {
                layer = layer.allow_origin(AllowOrigin::list(vals));
            }
        }
        _ => {
            layer = layer.allow_origin(Any);
        }
    }

    layer
}
