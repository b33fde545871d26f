use http::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::ProviderDescriptor;
use crate::models::{ChatMode, ChatRequest, Choice, ChoiceMessage, ResponseFrame, Usage};
use crate::util::now_epoch_millis;

/// Alibaba DashScope (Qwen). Non-standard request envelope, non-standard
/// response shape, and SSE opt-in via a request header.
pub(super) const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    base_url: "https://dashscope.aliyuncs.com/api/v1",
    chat_path: "/services/aigc/text-generation/generation",
    delimiter: "\n\n",
    path_builder: None,
    header_transform: Some(headers),
    body_transform: Some(body),
    response_transform: Some(response),
};

fn headers(mut headers: HeaderMap, request: &ChatRequest) -> HeaderMap {
    if request.is_streaming() {
        headers.insert("X-DashScope-SSE", HeaderValue::from_static("enable"));
    }
    headers
}

fn body(request: &ChatRequest) -> Value {
    let mut parameters = Map::new();
    for (key, value) in &request.extra {
        parameters.insert(key.clone(), value.clone());
    }
    // top_p is pinned and max_tokens is not forwarded.
    parameters.insert("top_p".into(), json!(0.8));
    parameters.insert(
        "incremental_output".into(),
        json!(request.is_streaming()),
    );
    json!({
        "model": request.model,
        "input": { "messages": request.messages },
        "parameters": parameters,
    })
}

#[derive(Debug, Deserialize)]
struct QwenOutput {
    finish_reason: String,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct QwenUsage {
    #[serde(default)]
    total_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    input_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct QwenResponse {
    output: QwenOutput,
    #[serde(default)]
    usage: QwenUsage,
    request_id: String,
}

fn response(model: &str, mode: ChatMode, payload: Value) -> Result<ResponseFrame, serde_json::Error> {
    let parsed: QwenResponse = serde_json::from_value(payload)?;
    let QwenResponse {
        output,
        usage,
        request_id,
    } = parsed;

    // Usage is only meaningful on the closing frame, which Qwen marks with
    // finish_reason "stop"; intermediate frames report "null" as a string.
    let usage = (output.finish_reason == "stop").then_some(Usage {
        completion_tokens: usage.output_tokens,
        prompt_tokens: usage.input_tokens,
        total_tokens: usage.total_tokens,
    });
    let finish_reason = (output.finish_reason != "null").then_some(output.finish_reason);

    let message = ChoiceMessage {
        role: "assistant".into(),
        content: output.text,
    };
    let (message, delta) = match mode {
        ChatMode::Completion => (Some(message), None),
        ChatMode::Chunk => (None, Some(message)),
    };

    Ok(ResponseFrame {
        id: request_id,
        object: mode,
        created: Some(now_epoch_millis()),
        model: model.to_string(),
        usage,
        choices: vec![Choice {
            index: 0,
            message,
            delta,
        }],
        finish_reason,
    })
}
