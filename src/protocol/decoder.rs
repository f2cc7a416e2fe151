//! Incremental decoder for newline-delimited stream events.
//!
//! Network chunks do not respect line boundaries: a single event may be split
//! across several reads, and a multi-byte UTF-8 character may be split between
//! two of them. The decoder keeps raw bytes until a full line is available.

use super::{StreamEvent, KNOWN_EVENTS};
use serde::Deserialize;
use thiserror::Error;

/// Upper bound on a single buffered line
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// How much of an offending line is kept in error messages
const ERROR_PREVIEW_CHARS: usize = 120;

/// A successfully framed line
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(StreamEvent),
    /// Well-formed JSON with an event tag this version does not know
    Unknown(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("stream line is not valid UTF-8")]
    InvalidUtf8,

    #[error("malformed event ({source}): {preview}")]
    Json {
        preview: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stream line exceeded {limit} bytes without a newline")]
    LineTooLong { limit: usize },
}

#[derive(Deserialize)]
struct TaggedLine {
    event: String,
}

pub struct EventDecoder {
    buf: Vec<u8>,
    /// Bytes of `buf` already known not to contain a newline
    scanned: usize,
    max_line: usize,
    /// Dropping the rest of a line that already overflowed
    discarding: bool,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::with_max_line(DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            max_line,
            discarding: false,
        }
    }

    /// Feed a chunk and decode every line it completes.
    ///
    /// A line longer than the limit yields exactly one `LineTooLong`, however
    /// the stream was chunked, and its remaining bytes are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<Decoded, DecodeError>> {
        self.buf.extend_from_slice(chunk);

        let mut out = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;

        while let Some(pos) = self.buf[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + pos;
            if self.discarding {
                self.discarding = false;
            } else if end - start > self.max_line {
                out.push(Err(self.too_long()));
            } else if let Some(item) = decode_line(&self.buf[start..end]) {
                out.push(item);
            }
            start = end + 1;
            search_from = start;
        }

        self.buf.drain(..start);
        self.scanned = self.buf.len();

        if self.discarding {
            self.buf.clear();
            self.scanned = 0;
        } else if self.buf.len() > self.max_line {
            self.buf.clear();
            self.scanned = 0;
            self.discarding = true;
            out.push(Err(self.too_long()));
        }

        out
    }

    /// Decode whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<Result<Decoded, DecodeError>> {
        let rest = std::mem::take(&mut self.buf);
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        decode_line(&rest)
    }

    fn too_long(&self) -> DecodeError {
        DecodeError::LineTooLong {
            limit: self.max_line,
        }
    }

    /// Number of bytes waiting for a newline
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_line(raw: &[u8]) -> Option<Result<Decoded, DecodeError>> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim(),
        Err(_) => return Some(Err(DecodeError::InvalidUtf8)),
    };
    if line.is_empty() {
        return None;
    }

    Some(match serde_json::from_str::<StreamEvent>(line) {
        Ok(event) => Ok(Decoded::Event(event)),
        Err(source) => match serde_json::from_str::<TaggedLine>(line) {
            Ok(tagged) if !KNOWN_EVENTS.contains(&tagged.event.as_str()) => {
                Ok(Decoded::Unknown(tagged.event))
            }
            _ => Err(DecodeError::Json {
                preview: line.chars().take(ERROR_PREVIEW_CHARS).collect(),
                source,
            }),
        },
    })
}
