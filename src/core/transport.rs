//! Splits a chunked response body into trimmed text lines.
//!
//! Splitting happens on raw bytes before any UTF-8 decoding. A newline byte
//! can never occur inside a multi-byte sequence, so a code point split
//! across two network chunks is reassembled in the buffer before its line
//! is decoded.

use futures_util::{Stream, StreamExt};
use memchr::memchr;
use std::pin::Pin;

use crate::core::chat_stream::StreamError;

/// Body chunks as produced by a chat transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, StreamError>> + Send>>;

/// Incremental, chunk-boundary independent line splitter.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and collect every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(line) = self.next_complete_line() {
            lines.push(line);
        }
        lines
    }

    /// Pop the next complete, non-empty line already in the buffer.
    pub fn next_complete_line(&mut self) -> Option<String> {
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line = decode_line(&self.buffer[..newline_pos]);
            self.buffer.drain(..=newline_pos);
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }

    /// Flush whatever follows the last newline once the source is done.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let line = decode_line(&rest);
        (!line.is_empty()).then_some(line)
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Lazily yields lines from a [`ByteStream`].
pub struct LineReader {
    source: ByteStream,
    splitter: LineSplitter,
    exhausted: bool,
}

impl LineReader {
    pub fn new(source: ByteStream) -> Self {
        Self {
            source,
            splitter: LineSplitter::new(),
            exhausted: false,
        }
    }

    /// Next line, `Ok(None)` once the source and the trailing buffer are
    /// both drained. A transport error ends the read.
    pub async fn next_line(&mut self) -> Result<Option<String>, StreamError> {
        loop {
            if let Some(line) = self.splitter.next_complete_line() {
                return Ok(Some(line));
            }
            if self.exhausted {
                return Ok(self.splitter.finish());
            }
            match self.source.next().await {
                Some(Ok(chunk)) => {
                    self.splitter.buffer.extend_from_slice(&chunk);
                }
                Some(Err(err)) => {
                    self.exhausted = true;
                    self.splitter.buffer.clear();
                    return Err(err);
                }
                None => self.exhausted = true,
            }
        }
    }
}
