//! Stream reframing engine.
//!
//! Consumes an upstream response body arriving as an unpredictable sequence
//! of byte chunks and re-emits it in the unified framing, applying the
//! provider's response transform to every logical frame. [`Reframer`] is a
//! synchronous state machine (testable without any network I/O, fed chunk by
//! chunk); [`reframe_body`] adapts it onto an async byte stream with a
//! pull-driven loop so memory stays bounded by one chunk plus the
//! undelimited residual buffer.

use std::collections::VecDeque;
use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use futures_util::{stream, Stream, StreamExt};
use serde_json::Value;

use crate::models::{ChatMode, ResponseFrame};
use crate::providers::ResponseTransform;

/// Terminal sentinel appended to every transformed event stream.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// A response transform bound to the request it serves: the bare model name
/// and the frame mode the client expects.
pub struct FrameTransform {
    model: String,
    mode: ChatMode,
    transform: ResponseTransform,
}

impl FrameTransform {
    pub fn new(model: impl Into<String>, mode: ChatMode, transform: ResponseTransform) -> Self {
        Self {
            model: model.into(),
            mode,
            transform,
        }
    }

    fn apply(&self, payload: Value) -> Result<ResponseFrame, serde_json::Error> {
        (self.transform)(&self.model, self.mode, payload)
    }
}

/// How the engine treats the upstream body.
pub enum ReframeMode {
    /// No transform configured: every chunk is forwarded byte-for-byte.
    PassThrough,
    /// Single JSON document expected (non-streaming request).
    Document(FrameTransform),
    /// Delimited event stream (streaming request).
    EventStream(FrameTransform),
}

enum EngineState {
    Streaming,
    Closed,
}

/// Per-stream reframing state machine.
///
/// One instance per upstream response, owned by that response's consumer
/// loop; never shared. Drive it with [`Reframer::push_chunk`] for each
/// upstream chunk and [`Reframer::finish`] exactly once when the upstream
/// reader reports completion.
pub struct Reframer {
    mode: ReframeMode,
    delimiter: &'static str,
    pending: BytesMut,
    state: EngineState,
}

impl Reframer {
    pub fn new(mode: ReframeMode, delimiter: &'static str) -> Self {
        Self {
            mode,
            delimiter,
            pending: BytesMut::new(),
            state: EngineState::Streaming,
        }
    }

    /// Feed one upstream chunk; returns the output buffers it completes.
    ///
    /// The accumulator holds raw bytes, so a UTF-8 sequence or delimiter
    /// split across chunk boundaries is reassembled before decoding.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        if matches!(self.state, EngineState::Closed) {
            return Vec::new();
        }
        let Self {
            mode,
            delimiter,
            pending,
            ..
        } = self;
        match mode {
            ReframeMode::PassThrough => vec![Bytes::copy_from_slice(chunk)],
            ReframeMode::Document(_) => {
                pending.extend_from_slice(chunk);
                Vec::new()
            }
            ReframeMode::EventStream(transform) => {
                pending.extend_from_slice(chunk);
                let mut out = Vec::new();
                while let Some(at) = find_delimiter(pending, delimiter.as_bytes()) {
                    let frame = pending.split_to(at + delimiter.len());
                    let frame = String::from_utf8_lossy(&frame[..at]);
                    if let Some(emitted) = transform_frame(transform, &frame) {
                        out.push(emitted);
                    }
                }
                out
            }
        }
    }

    /// Upstream exhausted: flush residual buffered content, emit the
    /// terminal sentinel for transformed event streams, and close.
    ///
    /// Idempotent; calls after the first return nothing.
    pub fn finish(&mut self) -> Vec<Bytes> {
        if matches!(self.state, EngineState::Closed) {
            return Vec::new();
        }
        self.state = EngineState::Closed;
        match &self.mode {
            ReframeMode::PassThrough => Vec::new(),
            ReframeMode::Document(transform) => {
                if self.pending.is_empty() {
                    return Vec::new();
                }
                let body = self.pending.split().freeze();
                let transformed = {
                    let text = String::from_utf8_lossy(&body);
                    serde_json::from_str::<Value>(&text)
                        .and_then(|payload| transform.apply(payload))
                        .and_then(|frame| serde_json::to_vec(&frame))
                };
                match transformed {
                    Ok(doc) => vec![Bytes::from(doc)],
                    Err(err) => {
                        tracing::debug!(%err, "document transform failed, forwarding raw body");
                        vec![body]
                    }
                }
            }
            ReframeMode::EventStream(transform) => {
                let mut out = Vec::new();
                let tail = self.pending.split();
                let tail = String::from_utf8_lossy(&tail);
                for frame in tail.split(self.delimiter) {
                    if frame.trim().is_empty() {
                        continue;
                    }
                    if let Some(emitted) = transform_frame(transform, frame) {
                        out.push(emitted);
                    }
                }
                out.push(Bytes::from_static(DONE_FRAME.as_bytes()));
                out
            }
        }
    }
}

/// Extract the payload of a frame: the last non-empty line, with an optional
/// `data:` prefix and surrounding whitespace stripped.
fn frame_payload(frame: &str) -> Option<&str> {
    let line = frame.lines().rev().find(|l| !l.trim().is_empty())?;
    let line = line.trim();
    Some(line.strip_prefix("data:").map(str::trim).unwrap_or(line))
}

/// Decode, transform and re-wrap one frame. A frame that fails to parse or
/// transform is dropped; the stream as a whole continues.
fn transform_frame(transform: &FrameTransform, frame: &str) -> Option<Bytes> {
    let payload = frame_payload(frame)?;
    match serde_json::from_str::<Value>(payload)
        .and_then(|value| transform.apply(value))
        .and_then(|frame| serde_json::to_string(&frame))
    {
        Ok(json) => Some(Bytes::from(format!("data: {json}\n\n"))),
        Err(err) => {
            tracing::debug!(%err, frame = payload, "dropping malformed upstream frame");
            None
        }
    }
}

fn find_delimiter(haystack: &[u8], delimiter: &[u8]) -> Option<usize> {
    haystack
        .windows(delimiter.len())
        .position(|window| window == delimiter)
}

struct Pump<S> {
    upstream: std::pin::Pin<Box<S>>,
    reframer: Reframer,
    ready: VecDeque<Bytes>,
    done: bool,
}

/// Drive a [`Reframer`] over an upstream byte stream.
///
/// Pull-driven: the next upstream chunk is read only once previously emitted
/// output has been accepted downstream. Frames come out in upstream order.
/// Dropping the returned stream drops the upstream reader with it, which is
/// the client-abort path: the connection is released and nothing further
/// (sentinel included) is emitted.
pub fn reframe_body<S, E>(
    upstream: S,
    reframer: Reframer,
) -> impl Stream<Item = Result<Bytes, std::io::Error>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let pump = Pump {
        upstream: Box::pin(upstream),
        reframer,
        ready: VecDeque::new(),
        done: false,
    };
    stream::unfold(pump, |mut pump| async move {
        loop {
            if let Some(buf) = pump.ready.pop_front() {
                return Some((Ok(buf), pump));
            }
            if pump.done {
                return None;
            }
            match pump.upstream.next().await {
                Some(Ok(chunk)) => {
                    pump.ready.extend(pump.reframer.push_chunk(&chunk));
                }
                Some(Err(err)) => {
                    pump.done = true;
                    return Some((Err(std::io::Error::other(err.to_string())), pump));
                }
                None => {
                    pump.done = true;
                    pump.ready.extend(pump.reframer.finish());
                }
            }
        }
    })
}
