//! Request normalization: unified request + provider descriptor in,
//! upstream-specific path, headers and body out. Pure data transformation;
//! no network I/O happens here.

use http::{header, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::GatewayError;
use crate::models::ChatRequest;
use crate::providers::ProviderDescriptor;

/// The upstream-specific rendition of one unified request.
#[derive(Debug)]
pub struct NormalizedRequest {
    /// Path relative to the descriptor's base URL.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Build the upstream request for `descriptor` from the unified request and
/// the resolved bearer credential (`Bearer <token>` form).
pub fn normalize(
    descriptor: &ProviderDescriptor,
    request: &ChatRequest,
    bearer: &str,
) -> Result<NormalizedRequest, GatewayError> {
    let path = match descriptor.path_builder {
        Some(build) => build(&request.model, access_key(bearer), request.is_streaming()),
        None => descriptor.chat_path.to_string(),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(bearer).map_err(|_| GatewayError::InvalidCredential)?,
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let headers = match descriptor.header_transform {
        Some(transform) => transform(headers, request),
        None => headers,
    };

    let body = match descriptor.body_transform {
        Some(transform) => transform(request),
        None => serde_json::to_value(request)?,
    };

    Ok(NormalizedRequest {
        path,
        headers,
        body,
    })
}

/// The bare token of a bearer credential, for providers that embed the key
/// in the URL rather than a header.
fn access_key(bearer: &str) -> &str {
    bearer.strip_prefix("Bearer ").unwrap_or(bearer).trim()
}
