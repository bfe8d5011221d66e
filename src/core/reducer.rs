//! Folds streamed content fragments into one assistant message.

use serde_json::Value;
use tracing::debug;

use crate::api::ChatChunk;

/// Outcome of decoding one streamed line.
#[derive(Debug)]
pub enum LineDecode {
    Fragment(String),
    /// Valid JSON carrying no content (heartbeats, final `done` records).
    NoContent,
    Malformed(serde_json::Error),
}

pub fn decode_line(line: &str) -> LineDecode {
    let chunk = match serde_json::from_str::<ChatChunk>(line) {
        Ok(chunk) => chunk,
        Err(err) => return LineDecode::Malformed(err),
    };

    match chunk.message.and_then(|message| message.content) {
        None | Some(Value::Null) => LineDecode::NoContent,
        Some(Value::String(text)) => LineDecode::Fragment(text),
        Some(other) => LineDecode::Fragment(other.to_string()),
    }
}

/// Accumulator for a single in-flight assistant message.
#[derive(Debug, Clone)]
pub struct StreamReducer {
    message_id: String,
    accumulator: String,
    applied: usize,
}

impl StreamReducer {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            accumulator: String::new(),
            applied: 0,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn content(&self) -> &str {
        &self.accumulator
    }

    /// Number of fragments applied so far.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Apply one line; returns the new content snapshot when it carried a
    /// fragment. Undecodable lines are skipped.
    pub fn apply_line(&mut self, line: &str) -> Option<&str> {
        match decode_line(line) {
            LineDecode::Fragment(fragment) => {
                self.accumulator.push_str(&fragment);
                self.applied += 1;
                Some(&self.accumulator)
            }
            LineDecode::NoContent => None,
            LineDecode::Malformed(err) => {
                debug!(message_id = %self.message_id, error = %err, "skipping undecodable stream line");
                None
            }
        }
    }

    pub fn into_content(self) -> String {
        self.accumulator
    }
}
