//! # Remote agent protocol
//!
//! One long-lived stream per agent. The host sends a request naming a decision
//! point (plus a board snapshot), the agent sends back exactly one reply, and
//! the exchange repeats until `end_tournament`.
//!
//! ```text
//! Connecting --handshake--> AwaitingRequest --request--> AwaitingResponse
//!                                 ^                           |
//!                                 +-----------reply-----------+
//! any state --end_tournament / error--> Closed
//! ```
//!
//! - [`framer`]: message boundaries (length-prefixed or legacy bare JSON)
//! - [`wire`]: request/reply encoding
//! - [`handshake`]: shared-secret challenge
//! - [`host`]: the game side ([`RemoteAgent`])
//! - [`client`]: the agent side ([`AgentClient`])

pub mod client;
pub mod framer;
pub mod handshake;
pub mod host;
pub mod wire;

pub use client::{AgentClient, SessionSummary};
pub use framer::{Framing, MessageFramer};
pub use host::RemoteAgent;
pub use wire::Request;

use log::{debug, trace};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::ProtocolConfig;
use crate::logutil::wire_preview;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message is not valid utf-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("message is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge { size: usize, limit: usize },

    #[error("no complete message after {0} partial reads")]
    RetryBudgetExhausted(usize),

    #[error("more than one message arrived in a single unframed read")]
    BackToBack,

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("illegal state transition {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    #[error("unexpected message: {0}")]
    UnexpectedReply(String),
}

impl From<std::string::FromUtf8Error> for ProtocolError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        ProtocolError::Utf8(e.utf8_error())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    AwaitingRequest,
    AwaitingResponse,
    Closed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, AwaitingRequest)
                | (AwaitingRequest, AwaitingResponse)
                | (AwaitingResponse, AwaitingRequest)
                | (_, Closed)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::AwaitingRequest => "awaiting-request",
            ConnectionState::AwaitingResponse => "awaiting-response",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Any byte stream the channel can run over (TCP, in-memory duplex, mocks).
pub trait AgentStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AgentStream for T {}

/// A framed, stateful message channel shared by both ends of the protocol.
pub struct Channel {
    stream: Box<dyn AgentStream>,
    framer: MessageFramer,
    state: ConnectionState,
    /// Reused for every socket read.
    scratch: Vec<u8>,
}

impl Channel {
    pub fn new(stream: impl AgentStream + 'static, cfg: &ProtocolConfig) -> Self {
        Self {
            stream: Box::new(stream),
            framer: MessageFramer::new(cfg.framing, cfg.max_message_bytes, cfg.max_partial_reads),
            state: ConnectionState::Connecting,
            scratch: vec![0u8; cfg.read_chunk_bytes.max(1)],
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn framing(&self) -> Framing {
        self.framer.framing()
    }

    pub fn transition(&mut self, next: ConnectionState) -> Result<(), ProtocolError> {
        if !self.state.can_transition_to(next) {
            return Err(ProtocolError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        trace!("channel {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    pub async fn send(&mut self, payload: &str) -> Result<(), ProtocolError> {
        if self.state == ConnectionState::Closed {
            return Err(ProtocolError::ConnectionClosed);
        }
        debug!("send {}", wire_preview(payload));
        let bytes = framer::encode(self.framer.framing(), payload);
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read until one complete message is available.
    pub async fn recv(&mut self) -> Result<String, ProtocolError> {
        if self.state == ConnectionState::Closed {
            return Err(ProtocolError::ConnectionClosed);
        }
        loop {
            if let Some(message) = self.framer.next_message()? {
                debug!("recv {}", wire_preview(&message));
                return Ok(message);
            }
            let n = self.stream.read(&mut self.scratch).await?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            self.framer.push(&self.scratch[..n])?;
        }
    }

    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        self.state = ConnectionState::Closed;
        self.stream.shutdown().await?;
        Ok(())
    }
}
