//! Decoder for OpenAI-style server-sent completion streams.
//!
//! The body is a sequence of events separated by a blank line:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"He"}}]}
//!
//! data: {"choices":[{"delta":{"content":"llo"},"finish_reason":"stop"}]}
//!
//! data: [DONE]
//! ```
//!
//! Bytes may arrive split anywhere, including inside a multi-byte UTF-8
//! sequence. Events without a `data:` prefix are skipped, and events whose
//! payload is not valid JSON are dropped without aborting the stream.

use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use coachcraft_types::llm::LlmError;

use super::sink::TokenSink;

const EVENT_SEPARATOR: &str = "\n\n";
const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Content and finish reason accumulated from one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedStream {
    pub content: String,
    pub finish_reason: Option<String>,
}

/// Incremental stream decoder.
///
/// Feed raw body chunks to [`push`](Self::push) and call
/// [`finish`](Self::finish) once the body ends. Content fragments are
/// forwarded to the sink as soon as their event is complete.
pub struct StreamDecoder<'s> {
    /// Undecoded tail of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a separator.
    buffer: String,
    content: String,
    finish_reason: Option<String>,
    dropped_events: usize,
    sink: Option<&'s dyn TokenSink>,
}

impl<'s> StreamDecoder<'s> {
    pub fn new(sink: Option<&'s dyn TokenSink>) -> Self {
        Self {
            pending: Vec::new(),
            buffer: String::new(),
            content: String::new(),
            finish_reason: None,
            dropped_events: 0,
            sink,
        }
    }

    /// Content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of events dropped because their payload was not valid JSON.
    pub fn dropped_events(&self) -> usize {
        self.dropped_events
    }

    /// Feed the next chunk of the body.
    pub fn push(&mut self, bytes: &[u8]) {
        let text = self.decode_utf8(bytes);
        self.buffer.push_str(&text);

        while let Some(end) = self.buffer.find(EVENT_SEPARATOR) {
            let event: String = self.buffer.drain(..end + EVENT_SEPARATOR.len()).collect();
            self.handle_event(&event[..end]);
        }
    }

    /// Process whatever is left in the buffer and return the result.
    pub fn finish(mut self) -> DecodedStream {
        if !self.pending.is_empty() {
            tracing::debug!(
                bytes = self.pending.len(),
                "Stream ended inside a UTF-8 sequence, discarding tail"
            );
        }
        let rest = std::mem::take(&mut self.buffer);
        self.handle_event(&rest);

        DecodedStream {
            content: self.content,
            finish_reason: self.finish_reason,
        }
    }

    /// Drain `stream` through the decoder.
    ///
    /// A failed read surfaces as [`LlmError::StreamUnavailable`]; a fired
    /// `cancel` token as [`LlmError::Cancelled`].
    pub async fn decode<S, B, E>(
        mut self,
        stream: S,
        cancel: &CancellationToken,
    ) -> Result<DecodedStream, LlmError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut stream = std::pin::pin!(stream);
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(chunk)) => self.push(chunk.as_ref()),
                Some(Err(e)) => {
                    return Err(LlmError::StreamUnavailable(format!(
                        "response body read failed: {e}"
                    )));
                }
                None => break,
            }
        }

        if self.dropped_events > 0 {
            tracing::debug!(dropped = self.dropped_events, "Malformed stream events skipped");
        }
        Ok(self.finish())
    }

    /// Decode as much of `pending + bytes` as forms complete characters.
    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            let rest = &self.pending[start..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));
                    match e.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start += valid_up_to + invalid;
                        }
                        // Incomplete sequence at the end; wait for more bytes.
                        None => {
                            start += valid_up_to;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
        out
    }

    fn handle_event(&mut self, event: &str) {
        let Some(payload) = event.trim().strip_prefix(DATA_PREFIX) else {
            return;
        };
        let payload = payload.trim();

        if payload.is_empty() || payload == DONE_SENTINEL {
            self.finish_reason.get_or_insert_with(|| "stop".to_string());
            return;
        }

        let frame: Value = match serde_json::from_str(payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping unparseable stream event");
                self.dropped_events += 1;
                return;
            }
        };

        let Some(choice) = frame.get("choices").and_then(|c| c.get(0)) else {
            return;
        };

        if let Some(delta) = choice
            .pointer("/delta/content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            self.content.push_str(delta);
            if let Some(sink) = self.sink {
                sink.on_token(delta);
            }
        }

        if let Some(reason) = choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
        {
            self.finish_reason = Some(reason.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Mutex;

    use futures_util::stream;

    use super::*;

    fn event(json: &str) -> String {
        format!("data: {json}\n\n")
    }

    fn decode_all(chunks: &[&[u8]]) -> DecodedStream {
        let mut decoder = StreamDecoder::new(None);
        for chunk in chunks {
            decoder.push(chunk);
        }
        decoder.finish()
    }

    #[test]
    fn test_decodes_deltas_and_done() {
        let body = [
            event(r#"{"choices":[{"delta":{"content":"He"}}]}"#),
            event(r#"{"choices":[{"delta":{"content":"llo"},"finish_reason":"stop"}]}"#),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();

        let decoded = decode_all(&[body.as_bytes()]);
        assert_eq!(decoded.content, "Hello");
        assert_eq!(decoded.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_malformed_event_is_skipped() {
        let body = [
            event(r#"{"choices":[{"delta":{"content":"A"}}]}"#),
            "data: {not json\n\n".to_string(),
            event(r#"{"choices":[{"delta":{"content":"B"}}]}"#),
        ]
        .concat();

        let mut decoder = StreamDecoder::new(None);
        decoder.push(body.as_bytes());
        assert_eq!(decoder.dropped_events(), 1);
        assert_eq!(decoder.finish().content, "AB");
    }

    #[test]
    fn test_event_split_across_chunks() {
        let body = event(r#"{"choices":[{"delta":{"content":"教练"}}]}"#);
        let bytes = body.as_bytes();
        let (a, rest) = bytes.split_at(7);
        let (b, c) = rest.split_at(20);

        let decoded = decode_all(&[a, b, c]);
        assert_eq!(decoded.content, "教练");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let body = event(r#"{"choices":[{"delta":{"content":"你好"}}]}"#);
        let bytes = body.as_bytes();
        // "你" is three bytes; cut after its first byte.
        let cut = body.find('你').unwrap() + 1;

        let mut decoder = StreamDecoder::new(None);
        decoder.push(&bytes[..cut]);
        assert_eq!(decoder.content(), "");
        decoder.push(&bytes[cut..]);
        assert_eq!(decoder.content(), "你好");
    }

    #[test]
    fn test_invalid_utf8_becomes_replacement_char() {
        let mut body = b"data: {\"choices\":[{\"delta\":{\"content\":\"a".to_vec();
        body.push(0xFF);
        body.extend_from_slice(b"b\"}}]}\n\n");

        let decoded = decode_all(&[body.as_slice()]);
        assert_eq!(decoded.content, "a\u{FFFD}b");
    }

    #[test]
    fn test_trailing_event_without_separator_is_flushed() {
        let body = format!(
            "{}data: {}",
            event(r#"{"choices":[{"delta":{"content":"x"}}]}"#),
            r#"{"choices":[{"delta":{"content":"y"},"finish_reason":"length"}]}"#
        );

        let decoded = decode_all(&[body.as_bytes()]);
        assert_eq!(decoded.content, "xy");
        assert_eq!(decoded.finish_reason.as_deref(), Some("length"));
    }

    #[test]
    fn test_non_data_lines_are_ignored() {
        let body = [
            ": keep-alive\n\n".to_string(),
            "event: ping\n\n".to_string(),
            event(r#"{"choices":[{"delta":{"content":"ok"}}]}"#),
        ]
        .concat();

        let decoded = decode_all(&[body.as_bytes()]);
        assert_eq!(decoded.content, "ok");
        assert!(decoded.finish_reason.is_none());
    }

    #[test]
    fn test_done_does_not_override_provider_reason() {
        let body = [
            event(r#"{"choices":[{"delta":{},"finish_reason":"length"}]}"#),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();

        let decoded = decode_all(&[body.as_bytes()]);
        assert_eq!(decoded.finish_reason.as_deref(), Some("length"));
    }

    #[test]
    fn test_later_finish_reason_wins() {
        let body = [
            event(r#"{"choices":[{"delta":{"content":"a"},"finish_reason":"length"}]}"#),
            event(r#"{"choices":[{"delta":{"content":"b"},"finish_reason":"stop"}]}"#),
        ]
        .concat();

        let decoded = decode_all(&[body.as_bytes()]);
        assert_eq!(decoded.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_empty_finish_reason_keeps_earlier_reason() {
        let body = [
            event(r#"{"choices":[{"delta":{"content":"a"},"finish_reason":"length"}]}"#),
            event(r#"{"choices":[{"delta":{"content":"b"},"finish_reason":""}]}"#),
        ]
        .concat();

        let decoded = decode_all(&[body.as_bytes()]);
        assert_eq!(decoded.content, "ab");
        assert_eq!(decoded.finish_reason.as_deref(), Some("length"));
    }

    #[test]
    fn test_empty_body() {
        let decoded = decode_all(&[]);
        assert_eq!(decoded, DecodedStream::default());
    }

    #[test]
    fn test_sink_sees_tokens_in_order() {
        let seen = Mutex::new(Vec::new());
        let sink = |token: &str| seen.lock().unwrap().push(token.to_string());
        let body = [
            event(r#"{"choices":[{"delta":{"content":"现象"}}]}"#),
            event(r#"{"choices":[{"delta":{"content":""}}]}"#),
            event(r#"{"choices":[{"delta":{"content":"原因"}}]}"#),
        ]
        .concat();

        let mut decoder = StreamDecoder::new(Some(&sink));
        decoder.push(body.as_bytes());
        decoder.finish();

        assert_eq!(*seen.lock().unwrap(), vec!["现象", "原因"]);
    }

    #[tokio::test]
    async fn test_decode_drains_byte_stream() {
        let body = [
            event(r#"{"choices":[{"delta":{"content":"He"}}]}"#),
            event(r#"{"choices":[{"delta":{"content":"llo"}}]}"#),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();
        let chunks: Vec<Result<Vec<u8>, Infallible>> = body
            .as_bytes()
            .chunks(5)
            .map(|c| Ok(c.to_vec()))
            .collect();

        let decoded = StreamDecoder::new(None)
            .decode(stream::iter(chunks), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(decoded.content, "Hello");
        assert_eq!(decoded.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_decode_read_error_is_stream_unavailable() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(event(r#"{"choices":[{"delta":{"content":"He"}}]}"#).into_bytes()),
            Err("connection reset".to_string()),
        ];

        let err = StreamDecoder::new(None)
            .decode(stream::iter(chunks), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::StreamUnavailable(ref m) if m.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_decode_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = StreamDecoder::new(None)
            .decode(stream::pending::<Result<Vec<u8>, Infallible>>(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Cancelled));
    }
}
