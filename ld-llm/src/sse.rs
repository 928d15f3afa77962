//! Incremental server-sent-events decoding over a reqwest byte stream.

use crate::error::{LlmError, Result};
use bytes::Bytes;
use futures_util::Stream;
use futures_util::StreamExt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseFrame {
    /// `event:` field, `"message"` when the frame has none.
    pub event: String,
    pub data: String,
}

pub(crate) fn decode_sse<S>(bytes_stream: S) -> impl Stream<Item = Result<SseFrame>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    futures_util::stream::unfold(
        (bytes_stream, Vec::<u8>::new(), false),
        |(mut stream, mut buffer, mut finished)| async move {
            loop {
                if let Some((raw, rest)) = split_frame(&buffer) {
                    buffer = rest;
                    match parse_frame(&raw) {
                        Some(frame) => return Some((Ok(frame), (stream, buffer, finished))),
                        None => continue,
                    }
                }

                if finished {
                    if buffer.is_empty() {
                        return None;
                    }
                    let raw = std::mem::take(&mut buffer);
                    if let Some(frame) = parse_frame(&raw) {
                        return Some((Ok(frame), (stream, buffer, finished)));
                    }
                    return None;
                }

                match stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        finished = true;
                        buffer.clear();
                        return Some((Err(LlmError::Transport(e)), (stream, buffer, finished)));
                    }
                    None => finished = true,
                }
            }
        },
    )
}

/// Split off the first complete frame, accepting `\n\n` or `\r\n\r\n` as the delimiter.
fn split_frame(buffer: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let lf = find(buffer, b"\n\n").map(|i| (i, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|i| (i, 4));
    let (idx, len) = match (lf, crlf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((buffer[..idx].to_vec(), buffer[idx + len..].to_vec()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_frame(raw: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(raw);
    let mut event = String::new();
    let mut data_lines = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim_start().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start().to_string());
        }
    }

    if event.is_empty() && data_lines.is_empty() {
        return None;
    }
    if event.is_empty() {
        event = "message".to_string();
    }
    Some(SseFrame {
        event,
        data: data_lines.join("\n"),
    })
}
