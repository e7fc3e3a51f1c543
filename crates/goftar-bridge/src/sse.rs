//! Incremental SSE parsing for the Core streaming endpoint.
//!
//! Network chunks do not respect event boundaries: one read may carry half
//! a `data:` line, or several events plus a partial one. The parser buffers
//! raw bytes and only interprets complete lines, so nothing is dropped or
//! reordered regardless of how the body is chunked.

use goftar_core::{Error, Result};

use crate::types::StreamDelta;

/// A parsed upstream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A verbatim text fragment.
    Delta(String),
    /// The explicit end-of-stream sentinel.
    Done,
}

/// Stateful parser fed with raw body bytes.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and collect every event completed by them. Incomplete
    /// trailing lines stay buffered for the next call.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<SseEvent>> {
        self.buf.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes still waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Interpret one complete line of the event protocol.
fn parse_line(line: &str) -> Option<Result<SseEvent>> {
    // Blank separators and comments carry no event.
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?.trim_start();

    if data == "[DONE]" {
        return Some(Ok(SseEvent::Done));
    }

    match serde_json::from_str::<StreamDelta>(data) {
        Ok(ev) if ev.delta.is_empty() => None,
        Ok(ev) => Some(Ok(SseEvent::Delta(ev.delta))),
        Err(e) => Some(Err(Error::StreamInterrupted(format!(
            "malformed stream event: {}",
            e
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(events: Vec<Result<SseEvent>>) -> Vec<SseEvent> {
        events.into_iter().map(|e| e.unwrap()).collect()
    }

    #[test]
    fn test_parse_single_event() {
        let mut parser = SseParser::new();
        let events = deltas(parser.push(b"data: {\"delta\":\"A\"}\n"));
        assert_eq!(events, vec![SseEvent::Delta("A".to_string())]);
    }

    #[test]
    fn test_parse_done_sentinel() {
        let mut parser = SseParser::new();
        let events = deltas(parser.push(b"data: [DONE]\n"));
        assert_eq!(events, vec![SseEvent::Done]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut parser = SseParser::new();
        let chunk = b"data: {\"delta\":\"A\"}\n\ndata: {\"delta\":\"B\"}\n\ndata: [DONE]\n";
        let events = deltas(parser.push(chunk));
        assert_eq!(
            events,
            vec![
                SseEvent::Delta("A".to_string()),
                SseEvent::Delta("B".to_string()),
                SseEvent::Done,
            ]
        );
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: {\"del").is_empty());
        assert!(parser.pending() > 0);
        let events = deltas(parser.push(b"ta\":\"AB\"}\n"));
        assert_eq!(events, vec![SseEvent::Delta("AB".to_string())]);
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn test_multibyte_utf8_split_across_chunks() {
        let mut parser = SseParser::new();
        let full = "data: {\"delta\":\"سلام\"}\n".as_bytes();
        // Split in the middle of a multi-byte character.
        let mid = full.len() - 6;
        assert!(parser.push(&full[..mid]).is_empty());
        let events = deltas(parser.push(&full[mid..]));
        assert_eq!(events, vec![SseEvent::Delta("سلام".to_string())]);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let mut parser = SseParser::new();
        let events = parser.push(b": keepalive\n\n\r\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut parser = SseParser::new();
        let events = deltas(parser.push(b"data: {\"delta\":\"X\"}\r\n"));
        assert_eq!(events, vec![SseEvent::Delta("X".to_string())]);
    }

    #[test]
    fn test_empty_delta_yields_nothing() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: {\"delta\":\"\"}\n").is_empty());
        assert!(parser.push(b"data: {}\n").is_empty());
    }

    #[test]
    fn test_malformed_event_is_an_error_not_a_skip() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: {not json}\n");
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Err(Error::StreamInterrupted(_))
        ));
    }

    #[test]
    fn test_order_preserved() {
        let mut parser = SseParser::new();
        let mut all = Vec::new();
        for chunk in [
            &b"data: {\"delta\":\"1\"}\ndata: {\"de"[..],
            &b"lta\":\"2\"}\n"[..],
            &b"data: {\"delta\":\"3\"}\ndata: [DONE]\n"[..],
        ] {
            all.extend(deltas(parser.push(chunk)));
        }
        assert_eq!(
            all,
            vec![
                SseEvent::Delta("1".to_string()),
                SseEvent::Delta("2".to_string()),
                SseEvent::Delta("3".to_string()),
                SseEvent::Done,
            ]
        );
    }
}
