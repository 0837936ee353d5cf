//! Game-host end of the agent protocol.
use log::{error, info, warn};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

use super::handshake::challenge_agent;
use super::wire::{decode_reply, Request};
use super::{AgentStream, Channel, ConnectionState, ProtocolError};
use crate::agent::{Decision, DecisionPoint, DispatchError};
use crate::config::ProtocolConfig;
use crate::engine::BoardSnapshot;

/// A connected, authenticated remote agent.
pub struct RemoteAgent {
    channel: Channel,
    peer: String,
    response_timeout: Duration,
    next_request_id: u64,
}

impl RemoteAgent {
    /// Wait for one agent on `listener` and authenticate it.
    pub async fn accept(
        listener: &TcpListener,
        cfg: &ProtocolConfig,
        authkey: &str,
    ) -> Result<Self, ProtocolError> {
        let (stream, addr) = listener.accept().await?;
        info!("agent connected from {}", addr);
        Self::establish(stream, cfg, authkey, addr.to_string()).await
    }

    /// Run the handshake over an already-open stream.
    pub async fn establish(
        stream: impl AgentStream + 'static,
        cfg: &ProtocolConfig,
        authkey: &str,
        peer: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let peer = peer.into();
        let response_timeout = cfg.response_timeout();
        let mut channel = Channel::new(stream, cfg);
        let outcome = match timeout(response_timeout, challenge_agent(&mut channel, authkey)).await {
            Ok(result) => result,
            Err(_) => Err(ProtocolError::Timeout(response_timeout)),
        };
        if let Err(e) = outcome {
            warn!("handshake with {} failed: {}", peer, e);
            let _ = channel.close().await;
            return Err(e);
        }
        channel.transition(ConnectionState::AwaitingRequest)?;
        Ok(Self {
            channel,
            peer,
            response_timeout,
            next_request_id: 1,
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Send one decision request and wait, bounded, for the reply.
    ///
    /// Transport failures and timeouts close the connection. An error record
    /// from the agent is returned as [`DispatchError::Remote`] and leaves the
    /// connection usable. After `end_tournament` is acknowledged the connection
    /// is closed.
    pub async fn request(
        &mut self,
        point: &DecisionPoint,
        board: Option<BoardSnapshot>,
    ) -> Result<Decision, DispatchError> {
        self.channel.transition(ConnectionState::AwaitingResponse)?;
        let id = self.next_request_id;
        self.next_request_id += 1;
        let payload = Request::new(point.clone(), board)
            .with_id(id)
            .encode()
            .map_err(ProtocolError::from)?;

        let limit = self.response_timeout;
        let channel = &mut self.channel;
        let exchange = async move {
            channel.send(&payload).await?;
            channel.recv().await
        };
        let reply = match timeout(limit, exchange).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!("agent {} failed during {}: {}", self.peer, point.name(), e);
                let _ = self.channel.close().await;
                return Err(e.into());
            }
            Err(_) => {
                error!(
                    "agent {} did not answer {} within {:?}",
                    self.peer,
                    point.name(),
                    self.response_timeout
                );
                let _ = self.channel.close().await;
                return Err(ProtocolError::Timeout(self.response_timeout).into());
            }
        };

        if *point == DecisionPoint::EndTournament {
            info!("tournament over; closing connection to {}", self.peer);
            let _ = self.channel.close().await;
        } else {
            self.channel.transition(ConnectionState::AwaitingRequest)?;
        }
        decode_reply(point.response_shape(), &reply)
    }
}
