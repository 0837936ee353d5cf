//! Incremental message framer for the agent channel.
//!
//! Two modes:
//!
//!   * `LengthPrefixed`: `<u32 big-endian length><utf-8 json>`. Boundaries are
//!     explicit, so several messages in one read are fine.
//!   * `Legacy`: bare JSON text (or a bare scalar such as `True`) with no
//!     delimiter. A read that does not yet form a complete value is kept and
//!     concatenated with the next read. Two complete values in one read cannot
//!     be told apart reliably and are rejected with [`ProtocolError::BackToBack`].
//!
//! Feed arbitrary chunks with [`MessageFramer::push`] and pull whole messages with
//! [`MessageFramer::next_message`].
use bytes::{Buf, BufMut, BytesMut};
use log::warn;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::ProtocolError;
use crate::logutil::wire_preview;

const PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    #[default]
    LengthPrefixed,
    Legacy,
}

pub struct MessageFramer {
    framing: Framing,
    buf: BytesMut,
    max_message_bytes: usize,
    max_partial_reads: usize,
    partial_reads: usize,
}

impl MessageFramer {
    pub fn new(framing: Framing, max_message_bytes: usize, max_partial_reads: usize) -> Self {
        Self {
            framing,
            buf: BytesMut::with_capacity(4096),
            max_message_bytes,
            max_partial_reads,
            partial_reads: 0,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Bytes waiting for the rest of a message.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Buffer a chunk read from the stream. In legacy mode the accumulated text
    /// is bounded by the message limit; prefixed frames are checked against their
    /// declared length instead.
    pub fn push(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let size = self.buf.len() + data.len();
        if self.framing == Framing::Legacy && size > self.max_message_bytes {
            self.buf.clear();
            self.partial_reads = 0;
            return Err(ProtocolError::MessageTooLarge {
                size,
                limit: self.max_message_bytes,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Extract the next complete message, if one is buffered.
    pub fn next_message(&mut self) -> Result<Option<String>, ProtocolError> {
        match self.framing {
            Framing::LengthPrefixed => self.next_prefixed(),
            Framing::Legacy => self.next_legacy(),
        }
    }

    fn next_prefixed(&mut self) -> Result<Option<String>, ProtocolError> {
        if self.buf.len() < PREFIX_LEN {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > self.max_message_bytes {
            self.buf.clear();
            return Err(ProtocolError::MessageTooLarge {
                size: len,
                limit: self.max_message_bytes,
            });
        }
        if self.buf.len() < PREFIX_LEN + len {
            return Ok(None);
        }
        self.buf.advance(PREFIX_LEN);
        let payload = self.buf.split_to(len);
        let text = String::from_utf8(payload.to_vec())?;
        Ok(Some(text))
    }

    fn next_legacy(&mut self) -> Result<Option<String>, ProtocolError> {
        let text = match std::str::from_utf8(&self.buf) {
            Ok(t) => t,
            // A multi-byte character split across reads.
            Err(e) if e.error_len().is_none() => return self.partial(),
            Err(e) => {
                self.buf.clear();
                return Err(e.into());
            }
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.buf.clear();
            return Ok(None);
        }

        let end = match legacy_extent(trimmed) {
            Extent::Complete(end) => end,
            Extent::Incomplete => return self.partial(),
            Extent::Malformed(reason) => {
                warn!(
                    "discarding malformed agent data ({}): {}",
                    reason,
                    wire_preview(trimmed)
                );
                self.buf.clear();
                self.partial_reads = 0;
                return Ok(None);
            }
        };
        if !trimmed[end..].trim().is_empty() {
            self.buf.clear();
            self.partial_reads = 0;
            return Err(ProtocolError::BackToBack);
        }
        let message = trimmed[..end].to_string();
        self.buf.clear();
        self.partial_reads = 0;
        Ok(Some(message))
    }

    fn partial(&mut self) -> Result<Option<String>, ProtocolError> {
        self.partial_reads += 1;
        if self.partial_reads > self.max_partial_reads {
            self.buf.clear();
            self.partial_reads = 0;
            return Err(ProtocolError::RetryBudgetExhausted(self.max_partial_reads));
        }
        Ok(None)
    }
}

/// Encode `payload` for the wire.
pub fn encode(framing: Framing, payload: &str) -> Vec<u8> {
    match framing {
        Framing::LengthPrefixed => {
            let mut out = BytesMut::with_capacity(PREFIX_LEN + payload.len());
            out.put_u32(payload.len() as u32);
            out.put_slice(payload.as_bytes());
            out.to_vec()
        }
        Framing::Legacy => payload.as_bytes().to_vec(),
    }
}

enum Extent {
    Complete(usize),
    Incomplete,
    Malformed(String),
}

/// Where the first value in `text` ends, if it is complete.
fn legacy_extent(text: &str) -> Extent {
    for word in ["True", "False"] {
        if let Some(rest) = text.strip_prefix(word) {
            if rest.starts_with(|c: char| c.is_alphanumeric()) {
                return Extent::Malformed("unexpected token".to_string());
            }
            return Extent::Complete(word.len());
        }
        if word.starts_with(text) {
            return Extent::Incomplete;
        }
    }
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<IgnoredAny>();
    match stream.next() {
        Some(Ok(_)) => Extent::Complete(stream.byte_offset()),
        Some(Err(e)) if e.is_eof() => Extent::Incomplete,
        Some(Err(e)) => Extent::Malformed(e.to_string()),
        None => Extent::Incomplete,
    }
}
