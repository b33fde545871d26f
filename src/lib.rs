#![forbid(unsafe_code)]
#![doc = r#"
UniLLM

Expose one unified chat-completion API and forward each request to one of
several upstream LLM providers, translating requests and streaming responses
to and from each provider's wire format.

Crate highlights
- Core: the stream reframing engine in `reframe`, which reconstructs logical
  frames from arbitrarily chunked upstream bodies and applies a per-provider
  transform without buffering whole responses.
- HTTP server (in `server`): `POST /v1/chat/completions`, `GET /v1/models`
  and a liveness root.
- Providers: static descriptors with optional header/body/path/response
  transforms, looked up by service identifier.

Modules
- `models`: Data structures for the unified request and response frames.
- `providers`: Provider descriptors and the service registry.
- `normalize`: Mapping from unified request to upstream request.
- `reframe`: The streaming response normalization engine.
- `server`: Axum router/handlers (the binary uses this).
- `error`: Gateway error taxonomy.
- `util`: Shared helpers (tracing, env, HTTP client, CORS).
"#]

pub mod error;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod reframe;
pub mod server;
pub mod util;

// Re-export the primary types for ergonomic library use.
pub use crate::error::GatewayError;
pub use crate::models::{ChatMessage, ChatMode, ChatRequest, ResponseFrame};
pub use crate::normalize::{normalize, NormalizedRequest};
pub use crate::providers::{ProviderDescriptor, ProviderRegistry};
pub use crate::reframe::{reframe_body, FrameTransform, ReframeMode, Reframer};
