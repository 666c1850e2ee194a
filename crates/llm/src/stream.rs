//! Line framing over a streamed HTTP body.
//!
//! Both backends deliver one JSON document per line (Ollama NDJSON, or
//! `data: ` lines for server-sent events). [`decode_lines`] buffers raw
//! bytes, splits on `\n` and hands each complete line to a decoder that
//! turns it into zero or one token, or signals the end of the stream.
//! Lines are decoded as UTF-8 only once complete, so a character split
//! across two network chunks survives.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::provider::{LlmError, TokenStream};

/// What a decoder made of one line.
#[derive(Debug, PartialEq)]
pub enum LineEvent {
    Token(String),
    Skip,
    Done,
}

struct State<S, F> {
    bytes: S,
    buffer: Vec<u8>,
    decode: F,
    finished: bool,
}

impl<S, F> State<S, F>
where
    F: FnMut(&str) -> Result<LineEvent, LlmError>,
{
    /// Decode complete lines already in the buffer until one yields
    /// something worth emitting.
    fn next_buffered(&mut self) -> Option<Result<String, LlmError>> {
        while !self.finished {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(item) = self.apply_bytes(&line[..newline_pos]) {
                return Some(item);
            }
        }
        None
    }

    fn apply_bytes(&mut self, line: &[u8]) -> Option<Result<String, LlmError>> {
        match std::str::from_utf8(line) {
            Ok(line) => self.apply(line.trim_end_matches('\r')),
            Err(e) => {
                self.finished = true;
                self.buffer.clear();
                Some(Err(LlmError::ParseError(format!("invalid UTF-8 in stream: {e}"))))
            }
        }
    }

    fn apply(&mut self, line: &str) -> Option<Result<String, LlmError>> {
        if line.trim().is_empty() {
            return None;
        }
        match (self.decode)(line) {
            Ok(LineEvent::Token(text)) if text.is_empty() => None,
            Ok(LineEvent::Token(text)) => Some(Ok(text)),
            Ok(LineEvent::Skip) => None,
            Ok(LineEvent::Done) => {
                self.finished = true;
                self.buffer.clear();
                None
            }
            Err(e) => {
                self.finished = true;
                self.buffer.clear();
                Some(Err(e))
            }
        }
    }
}

/// Turn a byte stream into a token stream using `decode` per line.
/// A trailing line without a newline is decoded when the body ends.
pub fn decode_lines<S, F>(bytes: S, decode: F) -> TokenStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
    F: FnMut(&str) -> Result<LineEvent, LlmError> + Send + 'static,
{
    let state = State {
        bytes,
        buffer: Vec::new(),
        decode,
        finished: false,
    };

    let tokens = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.next_buffered() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(LlmError::StreamError(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    let rest = std::mem::take(&mut state.buffer);
                    return state.apply_bytes(&rest).map(|item| (item, state));
                }
            }
        }
    });

    Box::pin(tokens)
}
