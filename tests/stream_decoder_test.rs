//! Integration tests for the streaming decode pipeline

use ailite::providers::{
    ChunkHandler, ChunkSource, DecodeError, ElementStream, StreamDecoder, StreamFormat,
    Subscription,
};
use ailite::{Error, HttpRequest};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Piece {
    id: String,
    #[serde(default)]
    text: Option<String>,
}

/// Chunk source that replays a fixed script of deliveries
#[derive(Clone, Default)]
struct ScriptedSource {
    chunks: Vec<Bytes>,
    failure: Option<String>,
    hold_open: bool,
}

impl ScriptedSource {
    fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks
                .into_iter()
                .map(|c| Bytes::copy_from_slice(c.as_ref()))
                .collect(),
            ..Default::default()
        }
    }

    fn failing_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Keep the connection open after the last chunk
    fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

impl ChunkSource for ScriptedSource {
    fn open(&self, _request: HttpRequest, handler: Arc<dyn ChunkHandler>) -> Subscription {
        let mut items: Vec<ailite::Result<Bytes>> = self.chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.failure {
            items.push(Err(Error::Network {
                message: message.clone(),
                source: None,
            }));
        }
        let hold_open = self.hold_open;

        Subscription::spawn(handler, async move {
            let body = stream::iter(items);
            let body = if hold_open {
                body.chain(stream::pending()).boxed()
            } else {
                body.boxed()
            };
            Ok::<_, Error>(body)
        })
    }
}

fn request() -> HttpRequest {
    HttpRequest::post("http://localhost/v1/stream")
}

fn decode(source: &ScriptedSource) -> ElementStream<Piece> {
    StreamDecoder::default().decode(source, request())
}

async fn collect<T>(stream: ElementStream<T>) -> Vec<ailite::Result<T>> {
    tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .expect("stream did not finish")
}

async fn ids(stream: ElementStream<Piece>) -> Vec<String> {
    collect(stream)
        .await
        .into_iter()
        .map(|item| item.expect("unexpected stream error").id)
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_two_chunks_then_sentinel() {
    let source = ScriptedSource::new([
        "data: {\"id\":\"1\",\"text\":\"a\"}\n",
        "data: {\"id\":\"2\",\"text\":\"b\"}\n",
        "data: [DONE]\n",
    ]);

    let items: Vec<Piece> = collect(decode(&source))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(
        items,
        vec![
            Piece {
                id: "1".into(),
                text: Some("a".into())
            },
            Piece {
                id: "2".into(),
                text: Some("b".into())
            },
        ]
    );
}

#[test_log::test(tokio::test)]
async fn test_malformed_frame_is_skipped() {
    let source = ScriptedSource::new(["garbage\n", "data: {\"id\":\"3\"}\n"]);
    assert_eq!(ids(decode(&source)).await, vec!["3"]);
}

#[test_log::test(tokio::test)]
async fn test_malformed_frame_between_good_frames() {
    let source = ScriptedSource::new([
        "data: {\"id\":\"1\"}\ndata: {\"id\": oops}\ndata: {\"text\":\"no id\"}\ndata: {\"id\":\"2\"}\n",
    ]);
    assert_eq!(ids(decode(&source)).await, vec!["1", "2"]);
}

#[tokio::test]
async fn test_line_split_across_chunks() {
    let source = ScriptedSource::new(["data: {\"id\":", "\"4\"}\n"]);
    assert_eq!(ids(decode(&source)).await, vec!["4"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chunk_boundaries_do_not_change_output() {
    let body = "data: {\"id\":\"1\",\"text\":\"héllo\"}\r\n\n\
                data: {\"id\":\"2\",\"text\":\"日本語 👋\"}\n\
                : comment line\n\
                data: {\"id\":\"3\"}\n\
                data: [DONE]\n\
                data: {\"id\":\"4\"}\n"
        .as_bytes();

    let whole = collect(decode(&ScriptedSource::new([body])))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect::<Vec<_>>();
    assert_eq!(whole.len(), 3);
    assert_eq!(whole[1].text.as_deref(), Some("日本語 👋"));

    for split in 1..body.len() {
        let source = ScriptedSource::new([&body[..split], &body[split..]]);
        let pieces = collect(decode(&source))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect::<Vec<_>>();
        assert_eq!(pieces, whole, "split at byte {}", split);
    }

    let bytewise = ScriptedSource::new(body.chunks(1));
    let pieces = collect(decode(&bytewise))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect::<Vec<_>>();
    assert_eq!(pieces, whole);
}

#[tokio::test]
async fn test_nothing_after_sentinel() {
    let source = ScriptedSource::new([
        "data: {\"id\":\"1\"}\ndata: [DONE]\ndata: {\"id\":\"2\"}\n",
        "data: {\"id\":\"3\"}\n",
    ]);
    assert_eq!(ids(decode(&source)).await, vec!["1"]);
}

#[tokio::test]
async fn test_sentinel_prefix_match_terminates() {
    let source = ScriptedSource::new(["data: {\"id\":\"1\"}\n", "[DONE] and then some\n"]);
    assert_eq!(ids(decode(&source)).await, vec!["1"]);
}

#[test_log::test(tokio::test)]
async fn test_sentinel_releases_open_connection() {
    let source = ScriptedSource::new(["data: {\"id\":\"1\"}\ndata: [DONE]\n"]).held_open();

    let mut stream = decode(&source);
    assert_eq!(stream.next().await.unwrap().unwrap().id, "1");
    let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("sentinel did not end the stream");
    assert!(end.is_none());
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_connection_close_without_sentinel_flushes_remainder() {
    let source = ScriptedSource::new(["data: {\"id\":\"8\"}\n", "data: {\"id\":\"9\"}"]);
    assert_eq!(ids(decode(&source)).await, vec!["8", "9"]);
}

#[test_log::test(tokio::test)]
async fn test_transport_failure_is_terminal() {
    let source = ScriptedSource::new(["data: {\"id\":\"1\"}\n", "data: {\"id\":"])
        .failing_with("connection reset by peer");

    let items = collect(decode(&source)).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().id, "1");
    match &items[1] {
        Err(Error::Network { message, .. }) => assert_eq!(message, "connection reset by peer"),
        other => panic!("expected network error, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn test_cancel_mid_stream() {
    let source = ScriptedSource::new(["data: {\"id\":\"1\"}\n"]).held_open();

    let mut stream = decode(&source);
    assert_eq!(stream.next().await.unwrap().unwrap().id, "1");
    assert!(!stream.is_closed());

    stream.cancel();
    assert!(stream.is_closed());
    assert!(stream.next().await.is_none());

    // Closing again changes nothing
    stream.cancel();
    stream.subscription().close();
    assert!(stream.is_closed());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_cancel_discards_undelivered_elements() {
    let source = ScriptedSource::new(["data: {\"id\":\"1\"}\ndata: {\"id\":\"2\"}\n"]).held_open();

    let mut stream = decode(&source);
    assert_eq!(stream.next().await.unwrap().unwrap().id, "1");
    stream.cancel();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_dropping_stream_closes_subscription() {
    let source = ScriptedSource::new(["data: {\"id\":\"1\"}\n"]).held_open();

    let mut stream = decode(&source);
    assert_eq!(stream.next().await.unwrap().unwrap().id, "1");
    let subscription = stream.subscription().clone();
    assert!(!subscription.is_closed());

    drop(stream);
    assert!(subscription.is_closed());
}

#[tokio::test]
async fn test_each_decode_is_independent() {
    let source = ScriptedSource::new(["data: {\"id\":\"1\"}\n", "data: [DONE]\n"]);
    let decoder = StreamDecoder::default();

    let first: ElementStream<Piece> = decoder.decode(&source, request());
    let second: ElementStream<Piece> = decoder.decode(&source, request());

    assert_eq!(ids(first).await, vec!["1"]);
    assert_eq!(ids(second).await, vec!["1"]);
}

#[tokio::test]
async fn test_custom_decoder_with_ndjson() {
    let source = ScriptedSource::new(["alpha\nbe", "ta\n\n", "\u{FFFD}\n"]);
    let decoder = StreamDecoder::new(StreamFormat::ndjson());

    let stream = decoder.decode_with(&source, request(), |payload: &[u8]| {
        let text = std::str::from_utf8(payload).map_err(|e| DecodeError::Custom(e.to_string()))?;
        if text.chars().all(char::is_alphabetic) {
            Ok(text.to_uppercase())
        } else {
            Err(DecodeError::Custom(format!("not a word: {}", text)))
        }
    });

    let words: Vec<String> = collect(stream).await.into_iter().map(Result::unwrap).collect();
    assert_eq!(words, vec!["ALPHA", "BETA"]);
}
