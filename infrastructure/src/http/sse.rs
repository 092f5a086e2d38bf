//! Incremental server-sent-events decoding.
//!
//! [`SseDecoder`] is fed raw body chunks as they arrive and yields complete
//! frames. Chunks may split lines (or UTF-8 sequences) anywhere.

use council_application::StreamError;
use council_domain::{CouncilEvent, DecodeError};
use serde_json::Value;

/// One dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// The `event:` field, if the frame had one
    pub event: Option<String>,
    /// All `data:` lines joined with `\n`
    pub data: String,
}

impl SseFrame {
    /// Decode the frame into a council event.
    ///
    /// The event type comes from the payload's `type` field, falling back to
    /// the frame's `event:` field.
    pub fn decode(&self) -> Result<CouncilEvent, StreamError> {
        let payload: Value =
            serde_json::from_str(&self.data).map_err(|source| DecodeError::InvalidField {
                event_type: "event",
                field: "data",
                source,
            })?;
        let event_type = payload
            .get("type")
            .and_then(Value::as_str)
            .or(self.event.as_deref())
            .ok_or(DecodeError::MissingField {
                event_type: "event",
                field: "type",
            })?;
        Ok(CouncilEvent::decode(event_type, &payload)?)
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(frame) = self.line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush at end of body: a trailing frame without its blank line is
    /// still dispatched.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).into_owned();
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(frame) = self.line(line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // id and retry carry nothing this client uses
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<SseFrame> {
        let mut decoder = SseDecoder::new();
        let mut frames: Vec<SseFrame> = chunks.iter().flat_map(|c| decoder.push(c)).collect();
        frames.extend(decoder.finish());
        frames
    }

    #[test]
    fn frames_split_across_chunks() {
        let frames = decode_all(&[
            b"data: {\"type\":\"stage1_",
            b"start\"}\n",
            b"\ndata: {\"type\":\"complete\"}\n\n",
        ]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "{\"type\":\"stage1_start\"}");
        assert_eq!(frames[0].decode().unwrap(), CouncilEvent::Stage1Start);
        assert_eq!(frames[1].decode().unwrap(), CouncilEvent::Complete);
    }

    #[test]
    fn crlf_comments_and_multiline_data() {
        let frames = decode_all(&[b": keepalive\r\nevent: error\r\ndata: {\"message\":\r\ndata: \"boom\"}\r\n\r\n"]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("error"));
        assert_eq!(frames[0].data, "{\"message\":\n\"boom\"}");
        assert_eq!(
            frames[0].decode().unwrap(),
            CouncilEvent::Error {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn utf8_split_inside_character() {
        let text = "data: {\"type\":\"error\",\"message\":\"é\"}\n\n".as_bytes();
        let split = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let frames = decode_all(&[&text[..split], &text[split..]]);
        assert_eq!(
            frames[0].decode().unwrap(),
            CouncilEvent::Error {
                message: "é".to_string()
            }
        );
    }

    #[test]
    fn finish_flushes_unterminated_frame() {
        let frames = decode_all(&[b"data: {\"type\":\"complete\"}"]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].decode().unwrap(), CouncilEvent::Complete);
    }

    #[test]
    fn event_without_data_is_dropped() {
        assert!(decode_all(&[b"event: ping\n\n"]).is_empty());
    }

    #[test]
    fn malformed_payloads_are_decode_errors() {
        let not_json = SseFrame {
            event: None,
            data: "not json".to_string(),
        };
        assert!(matches!(not_json.decode(), Err(StreamError::Decode(_))));

        let untyped = SseFrame {
            event: None,
            data: "{}".to_string(),
        };
        assert!(matches!(untyped.decode(), Err(StreamError::Decode(_))));

        let bad_stage = SseFrame {
            event: None,
            data: "{\"type\":\"stage1_complete\",\"data\":\"oops\"}".to_string(),
        };
        assert!(matches!(bad_stage.decode(), Err(StreamError::Decode(_))));
    }

    #[test]
    fn unknown_type_is_unrecognized() {
        let frame = SseFrame {
            event: None,
            data: "{\"type\":\"stage4_start\"}".to_string(),
        };
        assert_eq!(
            frame.decode().unwrap(),
            CouncilEvent::Unrecognized {
                event_type: "stage4_start".to_string()
            }
        );
    }
}
