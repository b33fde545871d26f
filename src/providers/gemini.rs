use http::{header, HeaderMap};
use serde::Deserialize;
use serde_json::{json, Value};

use super::ProviderDescriptor;
use crate::models::{ChatMode, ChatRequest, Choice, ChoiceMessage, ResponseFrame};

/// Google Gemini. The access key travels in the URL instead of a header,
/// the streaming endpoint is a distinct method on the model resource, and
/// event frames are CRLF-delimited.
pub(super) const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    base_url: "https://generativelanguage.googleapis.com/v1beta",
    chat_path: "/chat/completions",
    delimiter: "\r\n\r\n",
    path_builder: Some(path),
    header_transform: Some(headers),
    body_transform: Some(body),
    response_transform: Some(response),
};

fn path(model: &str, access_key: &str, streaming: bool) -> String {
    let method = if streaming {
        "streamGenerateContent"
    } else {
        "generateContent"
    };
    format!("/models/{model}:{method}?key={access_key}&alt=sse")
}

fn headers(mut headers: HeaderMap, _request: &ChatRequest) -> HeaderMap {
    // The key is already in the URL; a bearer header would be rejected.
    headers.remove(header::AUTHORIZATION);
    headers
}

fn body(request: &ChatRequest) -> Value {
    let contents: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| {
            let role = if m.role == "user" { "user" } else { "model" };
            let text = m.content.as_str().unwrap_or_default();
            json!({ "role": role, "parts": [{ "text": text }] })
        })
        .collect();
    json!({ "contents": contents })
}

#[derive(Debug, Default, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    #[serde(default)]
    index: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

fn response(model: &str, mode: ChatMode, payload: Value) -> Result<ResponseFrame, serde_json::Error> {
    let parsed: GeminiResponse = serde_json::from_value(payload)?;
    let choices = parsed
        .candidates
        .into_iter()
        .map(|candidate| {
            let role = match candidate.content.role.as_deref() {
                Some("user") => "user",
                _ => "model",
            };
            let content: String = candidate
                .content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect();
            Choice {
                index: candidate.index,
                message: Some(ChoiceMessage {
                    role: role.into(),
                    content,
                }),
                delta: None,
            }
        })
        .collect();

    Ok(ResponseFrame {
        id: model.to_string(),
        object: mode,
        created: None,
        model: model.to_string(),
        usage: None,
        choices,
        finish_reason: None,
    })
}
