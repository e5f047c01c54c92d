use serde::Deserialize;
use serde_json::Value;

use crate::client::CompletionError;

/// One decoded server-sent event from a completion stream
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// A content delta (may be empty for role-only or usage chunks)
    Delta(String),
    /// The `[DONE]` end marker
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental parser for SSE byte streams.
///
/// Bytes are buffered until a full frame (a blank line, `\n\n` or CRLF) is available so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>, CompletionError> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some((split, separator_len)) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..split + separator_len).collect();
            let frame = String::from_utf8_lossy(&frame[..split]);

            if let Some(payload) = extract_data_payload(&frame) {
                events.push(parse_payload(&payload)?);
            }
        }

        Ok(events)
    }

    /// Parse whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Result<Vec<SseEvent>, CompletionError> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = String::from_utf8_lossy(&rest);
        match extract_data_payload(&rest) {
            Some(payload) => Ok(vec![parse_payload(&payload)?]),
            None => Ok(Vec::new()),
        }
    }
}

const FRAME_SEPARATORS: &[&[u8]] = &[b"\r\n\r\n", b"\n\n", b"\r\r"];

/// Earliest blank-line frame boundary as (start, separator length)
fn find_frame_end(buffer: &[u8]) -> Option<(usize, usize)> {
    FRAME_SEPARATORS
        .iter()
        .filter_map(|separator| {
            buffer
                .windows(separator.len())
                .position(|window| window == *separator)
                .map(|start| (start, separator.len()))
        })
        .min()
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

fn parse_payload(payload: &str) -> Result<SseEvent, CompletionError> {
    if payload == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| CompletionError::InvalidResponse(format!("{}: {}", e, payload)))?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(ToString::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(CompletionError::Api(message));
    }

    let chunk: StreamChunk = serde_json::from_value(value)
        .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

    let delta = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    Ok(SseEvent::Delta(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_frame(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_parse_frames_incrementally() {
        let mut parser = SseParser::default();
        let frame = delta_frame("Hello");
        let (head, tail) = frame.as_bytes().split_at(10);

        assert!(parser.feed(head).unwrap().is_empty());
        assert_eq!(parser.feed(tail).unwrap(), vec![SseEvent::Delta("Hello".to_string())]);
        assert_eq!(parser.feed(b"data: [DONE]\n\n").unwrap(), vec![SseEvent::Done]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut parser = SseParser::default();
        let frame = delta_frame("月亮");
        let bytes = frame.as_bytes();
        let pos = frame.find('月').unwrap() + 1; // inside the first character

        let mut events = parser.feed(&bytes[..pos]).unwrap();
        events.extend(parser.feed(&bytes[pos..]).unwrap());
        assert_eq!(events, vec![SseEvent::Delta("月亮".to_string())]);
    }

    #[test]
    fn test_role_only_chunk_yields_empty_delta() {
        let mut parser = SseParser::default();
        let events = parser
            .feed(b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n")
            .unwrap();
        assert_eq!(events, vec![SseEvent::Delta(String::new())]);
    }

    #[test]
    fn test_error_payload_is_reported() {
        let mut parser = SseParser::default();
        let result = parser.feed(b"data: {\"error\":{\"message\":\"quota exceeded\"}}\n\n");
        match result {
            Err(CompletionError::Api(message)) => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_non_data_lines_are_ignored() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b": keep-alive\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b"data: [DONE]").unwrap().is_empty());
        assert_eq!(parser.finish().unwrap(), vec![SseEvent::Done]);
    }

    #[test]
    fn test_crlf_framed_stream() {
        let mut parser = SseParser::default();
        let stream = format!(
            "{}{}data: [DONE]\r\n\r\n",
            delta_frame("Hi").replace("\n\n", "\r\n\r\n"),
            delta_frame(" there").replace("\n\n", "\r\n\r\n")
        );
        let (head, tail) = stream.as_bytes().split_at(stream.find('\r').unwrap() + 1);

        let mut events = parser.feed(head).unwrap();
        events.extend(parser.feed(tail).unwrap());
        assert_eq!(
            events,
            vec![
                SseEvent::Delta("Hi".to_string()),
                SseEvent::Delta(" there".to_string()),
                SseEvent::Done,
            ]
        );
        assert!(parser.finish().unwrap().is_empty());
    }
}
