//! Server-sent event bodies to text, and fragment accumulation
//!
//! Providers stream their answer as `text/event-stream`. Event framing is
//! left to `eventsource-stream`; [`text_chunks`] maps each event's data to
//! text through a provider-supplied parser, and [`accumulate`] turns the
//! resulting chunk stream into cumulative fragments.

use crate::mt::error::{MtError, MtResult};
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::future;
use futures_util::stream::{Stream, StreamExt};
use std::fmt::Display;

/// Decode an SSE body into a lazy stream of text chunks.
///
/// `parse` maps one event's data to its text (`None` for events without
/// text). The stream ends when the body ends or right after the first error.
pub fn text_chunks<S, B, E, P>(body: S, parse: P) -> impl Stream<Item = MtResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Into<MtError> + Display + Send,
    P: Fn(&str) -> MtResult<Option<String>> + Send,
{
    body.eventsource()
        .filter_map(move |event| {
            let item = match event {
                Ok(event) => match parse(&event.data) {
                    Ok(Some(text)) if !text.is_empty() => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                },
                Err(EventStreamError::Transport(e)) => Some(Err(e.into())),
                Err(e) => Some(Err(MtError::StreamError(format!(
                    "Malformed event stream: {}",
                    e
                )))),
            };
            future::ready(item)
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
}

/// Turn a stream of text chunks into cumulative fragments.
///
/// Every item is the full text received so far. Errors pass through unchanged.
pub fn accumulate<S>(chunks: S) -> impl Stream<Item = MtResult<String>> + Send
where
    S: Stream<Item = MtResult<String>> + Send,
{
    chunks.scan(String::new(), |buffer, chunk| {
        let item = chunk.map(|text| {
            buffer.push_str(&text);
            buffer.clone()
        });
        future::ready(Some(item))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn plain(payload: &str) -> MtResult<Option<String>> {
        if payload == "[DONE]" {
            Ok(None)
        } else if let Some(msg) = payload.strip_prefix("ERR ") {
            Err(MtError::ApiError(msg.to_string()))
        } else {
            Ok(Some(payload.to_string()))
        }
    }

    fn body(chunks: &[&[u8]]) -> impl Stream<Item = Result<Vec<u8>, MtError>> + Send {
        let chunks: Vec<Result<Vec<u8>, MtError>> =
            chunks.iter().map(|c| Ok(c.to_vec())).collect();
        stream::iter(chunks)
    }

    async fn texts(chunks: &[&[u8]]) -> Vec<String> {
        text_chunks(body(chunks), plain)
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_single_event() {
        assert_eq!(texts(&[b"data: hello\n\n"]).await, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let items = texts(&[b"data: hel", b"lo\n", b"\ndata: x\n\n"]).await;
        assert_eq!(items, vec!["hello", "x"]);
    }

    #[tokio::test]
    async fn test_crlf_and_comments() {
        let items = texts(&[b": keep-alive\r\n\r\nevent: message\r\ndata: a\r\n\r\n"]).await;
        assert_eq!(items, vec!["a"]);
    }

    #[tokio::test]
    async fn test_cr_only_line_endings() {
        let items = texts(&[b"data: a\r\rdata: b\r\r", b"data: c\n\n"]).await;
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_multiline_data() {
        assert_eq!(texts(&[b"data: one\ndata:two\n\n"]).await, vec!["one\ntwo"]);
    }

    #[tokio::test]
    async fn test_utf8_split_across_chunks() {
        let bytes = "data: こんにちは\n\n".as_bytes();
        let items = texts(&[&bytes[..8], &bytes[8..]]).await;
        assert_eq!(items, vec!["こんにちは"]);
    }

    #[tokio::test]
    async fn test_skips_done_marker() {
        let items = texts(&[b"data: a\n\ndata: b\n\n", b"data: [DONE]\n\n"]).await;
        assert_eq!(items, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stops_on_parse_error() {
        let items: Vec<MtResult<String>> = text_chunks(
            body(&[b"data: a\n\ndata: ERR quota\n\ndata: c\n\n"]),
            plain,
        )
        .collect()
        .await;
        assert_eq!(
            items,
            vec![
                Ok("a".to_string()),
                Err(MtError::ApiError("quota".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error() {
        let failing = stream::iter(vec![
            Ok(b"data: a\n\n".to_vec()),
            Err(MtError::NetworkError("reset".to_string())),
            Ok(b"data: b\n\n".to_vec()),
        ]);
        let items: Vec<MtResult<String>> = text_chunks(failing, plain).collect().await;
        assert_eq!(
            items,
            vec![
                Ok("a".to_string()),
                Err(MtError::NetworkError("reset".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn test_accumulate_is_cumulative() {
        let chunks = stream::iter(vec![Ok("こ".to_string()), Ok("んにちは".to_string())]);
        let fragments: Vec<String> = accumulate(chunks).map(|r| r.unwrap()).collect().await;
        assert_eq!(fragments, vec!["こ", "こんにちは"]);
    }
}
