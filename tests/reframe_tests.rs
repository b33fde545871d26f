use bytes::Bytes;
use futures_util::{stream, StreamExt};
use serde_json::Value;

use unillm::models::{ChatMode, Choice, ChoiceMessage, ResponseFrame};
use unillm::reframe::{reframe_body, FrameTransform, ReframeMode, Reframer, DONE_FRAME};

/// Minimal response transform for engine tests: requires an `id` field (so
/// malformed payloads fail) and echoes `content` into a single delta choice.
fn echo_transform(
    model: &str,
    mode: ChatMode,
    payload: Value,
) -> Result<ResponseFrame, serde_json::Error> {
    #[derive(serde::Deserialize)]
    struct Payload {
        id: String,
        #[serde(default)]
        content: String,
    }
    let parsed: Payload = serde_json::from_value(payload)?;
    Ok(ResponseFrame {
        id: parsed.id,
        object: mode,
        created: None,
        model: model.to_string(),
        usage: None,
        choices: vec![Choice {
            index: 0,
            message: None,
            delta: Some(ChoiceMessage {
                role: "assistant".into(),
                content: parsed.content,
            }),
        }],
        finish_reason: None,
    })
}

fn event_stream_reframer(delimiter: &'static str) -> Reframer {
    Reframer::new(
        ReframeMode::EventStream(FrameTransform::new("m", ChatMode::Chunk, echo_transform)),
        delimiter,
    )
}

fn document_reframer() -> Reframer {
    Reframer::new(
        ReframeMode::Document(FrameTransform::new("m", ChatMode::Completion, echo_transform)),
        "\n\n",
    )
}

/// Drive a reframer over the given chunking of the input and collect every
/// emitted buffer, including the completion flush.
fn drive(mut reframer: Reframer, chunks: &[&[u8]]) -> Vec<Bytes> {
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend(reframer.push_chunk(chunk));
    }
    out.extend(reframer.finish());
    out
}

fn byte_chunks(input: &[u8], size: usize) -> Vec<&[u8]> {
    input.chunks(size).collect()
}

const THREE_FRAMES: &str = "data: {\"id\":\"a\",\"content\":\"one\"}\n\n\
                            data: {\"id\":\"b\",\"content\":\"two\"}\n\n\
                            data: {\"id\":\"c\",\"content\":\"three\"}\n\n";

#[test]
fn streaming_reframe_is_chunk_boundary_independent() {
    let input = THREE_FRAMES.as_bytes();
    let whole = drive(event_stream_reframer("\n\n"), &[input]);
    assert_eq!(whole.len(), 4, "three frames plus the sentinel");

    for size in [1, 2, 3, 7, 11, 64, 1024] {
        let split = drive(event_stream_reframer("\n\n"), &byte_chunks(input, size));
        assert_eq!(split, whole, "chunk size {size} changed the output");
    }
}

#[test]
fn passthrough_is_byte_identical() {
    let input = b"data: {\"id\":\"a\"}\n\nleft-over partial bytes \xff\xfe";
    let mut reframer = Reframer::new(ReframeMode::PassThrough, "\n\n");
    let mut out = Vec::new();
    for chunk in byte_chunks(input, 5) {
        out.extend(reframer.push_chunk(chunk));
    }
    let flushed = reframer.finish();
    assert!(flushed.is_empty(), "pass-through buffers nothing to flush");

    let concatenated: Vec<u8> = out.iter().flat_map(|b| b.iter().copied()).collect();
    assert_eq!(concatenated, input);
}

#[test]
fn sentinel_is_emitted_exactly_once_and_last() {
    let mut reframer = event_stream_reframer("\n\n");
    let mut out = Vec::new();
    out.extend(reframer.push_chunk(THREE_FRAMES.as_bytes()));
    out.extend(reframer.finish());

    let sentinel = Bytes::from_static(DONE_FRAME.as_bytes());
    let count = out.iter().filter(|b| **b == sentinel).count();
    assert_eq!(count, 1);
    assert_eq!(out.last(), Some(&sentinel));

    // The engine is closed: further input and flushes are no-ops.
    assert!(reframer.finish().is_empty());
    assert!(reframer.push_chunk(b"data: {\"id\":\"z\"}\n\n").is_empty());
}

#[test]
fn malformed_frame_is_skipped_without_halting() {
    let input = b"data: {bad json\n\ndata: {\"id\":\"x\"}\n\n";
    let out = drive(event_stream_reframer("\n\n"), &[input]);

    assert_eq!(out.len(), 2, "one valid frame plus the sentinel");
    let first = std::str::from_utf8(&out[0]).unwrap();
    assert!(first.starts_with("data: "));
    assert!(first.contains("\"id\":\"x\""));
    assert_eq!(out[1], Bytes::from_static(DONE_FRAME.as_bytes()));
}

#[test]
fn residual_tail_is_flushed_on_completion() {
    let mut reframer = event_stream_reframer("\n\n");
    assert!(
        reframer
            .push_chunk(b"data: {\"id\":\"tail\",\"content\":\"end\"}")
            .is_empty(),
        "no delimiter seen yet"
    );
    let out = reframer.finish();
    assert_eq!(out.len(), 2);
    assert!(std::str::from_utf8(&out[0]).unwrap().contains("\"id\":\"tail\""));
    assert_eq!(out[1], Bytes::from_static(DONE_FRAME.as_bytes()));
}

#[test]
fn multibyte_utf8_split_across_chunks_survives() {
    let input = "data: {\"id\":\"u\",\"content\":\"héllo wörld\"}\n\n".as_bytes();
    let whole = drive(event_stream_reframer("\n\n"), &[input]);
    let split = drive(event_stream_reframer("\n\n"), &byte_chunks(input, 1));
    assert_eq!(split, whole);
    assert!(std::str::from_utf8(&split[0]).unwrap().contains("héllo wörld"));
}

#[test]
fn custom_delimiter_reframes_crlf_streams() {
    let input = b"data: {\"id\":\"a\",\"content\":\"one\"}\r\n\r\ndata: {\"id\":\"b\"}\r\n\r\n";
    let out = drive(event_stream_reframer("\r\n\r\n"), &byte_chunks(input, 3));
    assert_eq!(out.len(), 3, "two frames plus the sentinel");
    assert!(std::str::from_utf8(&out[0]).unwrap().contains("\"id\":\"a\""));
    assert!(std::str::from_utf8(&out[1]).unwrap().contains("\"id\":\"b\""));
}

#[test]
fn event_frames_keep_only_the_data_line() {
    let input = b"id:1\nevent:result\ndata: {\"id\":\"a\",\"content\":\"one\"}\n\n";
    let out = drive(event_stream_reframer("\n\n"), &[input]);
    assert_eq!(out.len(), 2);
    let frame = std::str::from_utf8(&out[0]).unwrap();
    assert!(frame.starts_with("data: {"));
    assert!(!frame.contains("event:result"));
}

#[test]
fn document_mode_buffers_across_chunks() {
    let body = b"{\"id\":\"doc\",\"content\":\"hi there\"}";
    let mut reframer = document_reframer();
    for chunk in byte_chunks(body, 4) {
        assert!(reframer.push_chunk(chunk).is_empty());
    }
    let out = reframer.finish();
    assert_eq!(out.len(), 1);

    let frame: Value = serde_json::from_slice(&out[0]).unwrap();
    assert_eq!(frame["id"], "doc");
    assert_eq!(frame["object"], "chat.completion");
    assert_eq!(frame["choices"][0]["delta"]["content"], "hi there");
}

#[test]
fn document_mode_falls_back_to_raw_bytes() {
    let body = b"upstream error page, not json";
    let mut reframer = document_reframer();
    for chunk in byte_chunks(body, 6) {
        assert!(reframer.push_chunk(chunk).is_empty());
    }
    let out = reframer.finish();
    assert_eq!(out.len(), 1);
    assert_eq!(&out[0][..], &body[..]);
}

#[test]
fn document_transform_is_idempotent_on_well_formed_input() {
    let body = b"{\"id\":\"doc\",\"content\":\"stable\"}";
    let mut reframer = document_reframer();
    reframer.push_chunk(body);
    let out = reframer.finish();

    let first: Value = serde_json::from_slice(&out[0]).unwrap();
    let reserialized = serde_json::to_vec(&first).unwrap();
    let second: Value = serde_json::from_slice(&reserialized).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn reframed_body_matches_sync_reframing() {
    let input = THREE_FRAMES.as_bytes();
    let expected = drive(event_stream_reframer("\n\n"), &byte_chunks(input, 5));

    let chunks: Vec<Result<Bytes, std::io::Error>> = input
        .chunks(5)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    let mut out = Box::pin(reframe_body(
        stream::iter(chunks),
        event_stream_reframer("\n\n"),
    ));

    let mut collected = Vec::new();
    while let Some(item) = out.next().await {
        collected.push(item.expect("no transport error in this stream"));
    }
    assert_eq!(collected, expected);
}

#[tokio::test]
async fn upstream_error_ends_the_stream_without_sentinel() {
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(
            b"data: {\"id\":\"a\",\"content\":\"one\"}\n\n",
        )),
        Err(std::io::Error::other("connection reset")),
    ];
    let mut out = Box::pin(reframe_body(
        stream::iter(chunks),
        event_stream_reframer("\n\n"),
    ));

    let first = out.next().await.unwrap().unwrap();
    assert!(first.starts_with(b"data: {"));
    let second = out.next().await.unwrap();
    assert!(second.is_err());
    assert!(out.next().await.is_none(), "stream terminates after the error");
}

#[tokio::test]
async fn client_abort_releases_upstream_reader() {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(4);
    let upstream = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    tx.send(Ok(Bytes::from_static(
        b"data: {\"id\":\"a\",\"content\":\"one\"}\n\n",
    )))
    .await
    .unwrap();

    let mut out = Box::pin(reframe_body(upstream, event_stream_reframer("\n\n")));
    let first = out.next().await.unwrap().unwrap();
    assert!(first.starts_with(b"data: "));
    assert!(!first.ends_with(DONE_FRAME.as_bytes()));
    assert!(!tx.is_closed());

    // Client disconnect: the consumer drops the reframed stream mid-flight.
    drop(out);
    assert!(tx.is_closed(), "upstream reader must be released on abort");
}
