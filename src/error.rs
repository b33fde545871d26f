use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

use crate::util::error_response;

/// Gateway error taxonomy.
///
/// Routing errors surface as 404 before any upstream call; upstream
/// transport failures as 502. Frame-level decode errors never appear here —
/// they are recovered locally inside the reframing engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown service '{0}'")]
    UnknownService(String),
    #[error("missing credential")]
    MissingCredential,
    #[error("credential is not a valid header value")]
    InvalidCredential,
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::UnknownService(_)
            | GatewayError::MissingCredential
            | GatewayError::InvalidCredential => StatusCode::NOT_FOUND,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self.to_string())
    }
}
