use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Whether a response frame is a complete message or an incremental delta.
///
/// Serialized into the frame's `object` field using the wire spellings
/// `"chat.completion"` and `"chat.completion.chunk"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMode {
    #[serde(rename = "chat.completion")]
    Completion,
    #[serde(rename = "chat.completion.chunk")]
    Chunk,
}

/// Token accounting as reported by the upstream provider. Pass-through only;
/// the gateway never computes these itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub completion_tokens: u64,
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

/// Message or delta payload inside a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: String,
    pub content: String,
}

/// One completion choice. `message` is set in `chat.completion` frames,
/// `delta` in `chat.completion.chunk` frames; never both.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    #[serde(default)]
    pub delta: Option<ChoiceMessage>,
}

/// Unified response frame.
///
/// Every provider response transform produces this shape, whether the frame
/// is a full document or a single streamed event. `None` fields are omitted
/// on the wire.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: String,
    pub object: ChatMode,
    #[serde(default)]
    pub created: Option<u64>,
    pub model: String,
    #[serde(default)]
    pub usage: Option<Usage>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}
