use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chat message as accepted on the unified endpoint.
///
/// Notes:
/// - `content` may be a string or an array of content parts; we accept
///   `serde_json::Value` to allow both shapes (and future-proof for
///   multimodal content).
/// - `name` and `tool_call_id` are optional fields that may appear on
///   assistant or tool messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    /// Either a string or an array of content parts.
    pub content: Value,
    /// Optional name for function/tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional tool call identifier (tool result correlation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Unified Chat Completions request.
///
/// The `model` field arrives as a composite
/// `<modelName>[:<serviceId>[:<accessKey>]]`; the dispatcher splits it before
/// normalization, so by the time a provider transform sees this struct the
/// field holds only the bare model name.
///
/// Fields not modeled here (provider-specific sampling knobs, penalties,
/// tool definitions, ...) are captured by `extra` and passed through to the
/// upstream body opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Any remaining request fields, forwarded as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    /// Whether the client asked for a streamed (SSE) response.
    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}
