//! Provider descriptors and the service registry.
//!
//! Each upstream provider is described by a static [`ProviderDescriptor`]:
//! where to reach it and, optionally, how to translate headers, body, path
//! and response frames between the unified protocol and the provider's own
//! wire format. A descriptor with no transforms means the provider already
//! speaks the unified protocol and the gateway acts as a byte-level
//! pass-through.
//!
//! Capabilities are plain optional function pointers dispatched by presence
//! check; there is no trait hierarchy to implement when adding a provider.

use std::collections::HashMap;
use std::sync::Arc;

use http::HeaderMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::models::{ChatMode, ChatRequest, ResponseFrame};

mod baichuan;
mod dashscope;
mod gemini;
mod groq;
mod minimax;
mod moonshot;
mod openai;
mod yi;

/// Builds the request path for providers that encode model, credential or
/// mode into the URL. Arguments: bare model name, access key (bearer token
/// without the `Bearer ` prefix), streaming flag.
pub type PathBuilder = fn(&str, &str, bool) -> String;

/// Rewrites the outbound header map. Receives the base headers
/// (`authorization` + `content-type`) and the normalized request.
pub type HeaderTransform = fn(HeaderMap, &ChatRequest) -> HeaderMap;

/// Produces the upstream request body from the unified request.
pub type BodyTransform = fn(&ChatRequest) -> Value;

/// Translates one upstream response payload into a unified frame.
/// Arguments: bare model name, frame mode, decoded JSON payload.
pub type ResponseTransform = fn(&str, ChatMode, Value) -> Result<ResponseFrame, serde_json::Error>;

/// Immutable description of one upstream provider.
///
/// Descriptors are `Copy` and shared read-only across all concurrent
/// requests; nothing in the request path ever mutates one.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub base_url: &'static str,
    /// Completion path used when no `path_builder` is configured.
    pub chat_path: &'static str,
    /// Frame delimiter of the provider's event stream.
    pub delimiter: &'static str,
    pub path_builder: Option<PathBuilder>,
    pub header_transform: Option<HeaderTransform>,
    pub body_transform: Option<BodyTransform>,
    pub response_transform: Option<ResponseTransform>,
}

impl ProviderDescriptor {
    /// Descriptor for a provider that natively speaks the unified protocol:
    /// default completion path, default framing, no transforms.
    pub const fn passthrough(base_url: &'static str) -> Self {
        Self {
            base_url,
            chat_path: "/chat/completions",
            delimiter: "\n\n",
            path_builder: None,
            header_transform: None,
            body_transform: None,
            response_transform: None,
        }
    }
}

/// Immutable mapping from service identifier to descriptor.
///
/// Populated once before serving traffic and read-only thereafter, so it is
/// safe for unsynchronized concurrent reads from every request task.
pub struct ProviderRegistry {
    entries: HashMap<&'static str, ProviderDescriptor>,
}

static BUILTIN: Lazy<Arc<ProviderRegistry>> =
    Lazy::new(|| Arc::new(ProviderRegistry::builtin()));

impl ProviderRegistry {
    /// Registry over an explicit set of entries. Used by tests to point
    /// descriptors at local mock upstreams; production code uses
    /// [`ProviderRegistry::shared`].
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, ProviderDescriptor)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The builtin provider table.
    pub fn builtin() -> Self {
        Self::new([
            ("openai", openai::DESCRIPTOR),
            ("groq", groq::DESCRIPTOR),
            ("moonshot", moonshot::DESCRIPTOR),
            ("minimax", minimax::DESCRIPTOR),
            ("yi", yi::DESCRIPTOR),
            ("baichuan", baichuan::DESCRIPTOR),
            ("dashscope", dashscope::DESCRIPTOR),
            ("gemini", gemini::DESCRIPTOR),
        ])
    }

    /// Process-wide registry, constructed on first use and never mutated.
    pub fn shared() -> Arc<ProviderRegistry> {
        BUILTIN.clone()
    }

    /// Look up the descriptor for a service identifier. Absence is a
    /// client-visible not-found condition, not a fault.
    pub fn lookup(&self, service: &str) -> Option<&ProviderDescriptor> {
        self.entries.get(service)
    }

    /// Registered service identifiers, for logging.
    pub fn services(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}
