//! Data models for the unified gateway protocol.
//!
//! This module groups two submodules:
//! - `request`: The unified Chat Completions request accepted from clients.
//! - `frame`: The unified response frame every provider response is
//!   translated into, for both complete documents and streaming deltas.
//!
//! The per-provider translation logic lives in `crate::providers`; the
//! framing machinery that applies it lives in `crate::reframe`.

pub mod frame;
pub mod request;

// Convenience re-exports for downstream users
// (`use unillm::models::ChatRequest`).
pub use frame::{ChatMode, Choice, ChoiceMessage, ResponseFrame, Usage};
pub use request::{ChatMessage, ChatRequest};
