//! Agent end of the protocol: connect to a game host and answer its decision
//! requests with a local [`Policy`] until the tournament ends.
use log::{debug, info, warn};
use serde::Serialize;
use tokio::net::TcpStream;

use super::handshake::answer_challenge;
use super::wire::{encode_error, encode_reply, Request};
use super::{Channel, ConnectionState, ProtocolError};
use crate::agent::{respond, DecisionPoint, Policy};
use crate::config::{AgentConfig, ProtocolConfig};
use crate::logutil::wire_preview;

/// Counters for one connection, reported when the host ends the tournament.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub requests: u64,
    pub games: u64,
    /// Requests answered with an error record instead of a decision.
    pub errors: u64,
}

pub struct AgentClient<P: Policy> {
    policy: P,
    protocol: ProtocolConfig,
}

impl<P: Policy> AgentClient<P> {
    pub fn new(policy: P, protocol: ProtocolConfig) -> Self {
        Self { policy, protocol }
    }

    /// Open a TCP connection to the host and authenticate.
    pub async fn connect(&self, agent: &AgentConfig) -> Result<Channel, ProtocolError> {
        info!("connecting to game host at {}:{}", agent.address, agent.port);
        let stream = TcpStream::connect((agent.address.as_str(), agent.port)).await?;
        let mut channel = Channel::new(stream, &self.protocol);
        answer_challenge(&mut channel, &agent.authkey).await?;
        channel.transition(ConnectionState::AwaitingRequest)?;
        Ok(channel)
    }

    /// Connect and serve until the host ends the tournament.
    pub async fn play_remote_game(&mut self, agent: &AgentConfig) -> Result<SessionSummary, ProtocolError> {
        let channel = self.connect(agent).await?;
        self.serve(channel).await
    }

    /// Answer requests on an authenticated channel until `end_tournament`.
    ///
    /// A request that cannot be parsed or decided is answered with an error
    /// record and the loop carries on. Transport errors end the session.
    pub async fn serve(&mut self, mut channel: Channel) -> Result<SessionSummary, ProtocolError> {
        let mut summary = SessionSummary::default();
        loop {
            let text = channel.recv().await?;
            channel.transition(ConnectionState::AwaitingResponse)?;
            summary.requests += 1;

            let request = match Request::decode(&text) {
                Ok(r) => r,
                Err(e) => {
                    warn!("unreadable request ({}): {}", e, wire_preview(&text));
                    summary.errors += 1;
                    channel.send(&encode_error(&format!("unreadable request: {e}"))).await?;
                    channel.transition(ConnectionState::AwaitingRequest)?;
                    continue;
                }
            };

            match &request.point {
                DecisionPoint::StartTournament => info!("Tournament starts!"),
                DecisionPoint::Startup => {
                    summary.games += 1;
                    info!("Game {} starts", summary.games);
                }
                DecisionPoint::Shutdown => info!("Game {} over", summary.games),
                DecisionPoint::EndTournament => {}
                other => debug!("request {} for {:?}", other.name(), other.player()),
            }

            let reply = match respond(&mut self.policy, &request.point, request.current_gameboard.as_ref()) {
                Ok(decision) => encode_reply(&decision)?,
                Err(e) => {
                    warn!("cannot answer {}: {}", request.point.name(), e);
                    summary.errors += 1;
                    encode_error(&e.to_string())
                }
            };
            channel.send(&reply).await?;

            if request.point == DecisionPoint::EndTournament {
                info!("Tournament Finished! {} games played", summary.games);
                channel.close().await?;
                return Ok(summary);
            }
            channel.transition(ConnectionState::AwaitingRequest)?;
        }
    }
}
