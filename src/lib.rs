//! # Landlord - rule engine and remote agents for property-trading games
//!
//! Landlord resolves the money and ownership side of a Monopoly-style game and
//! lets the players' decisions come from separate agent processes over a
//! long-lived connection.
//!
//! ## Features
//!
//! - **Rule Engine**: auctions, purchases (plain, discount and adjacency variants),
//!   house/hotel improvement under the uniform-building rule, settlement and bankruptcy.
//! - **Event Log**: every state change is appended as a structured record and can be
//!   exported as JSON lines.
//! - **Decision Dispatch**: a closed set of decision points, each with a fixed reply
//!   shape, answered by an in-process policy or a remote agent.
//! - **Agent Protocol**: framed JSON over TCP with a shared-secret handshake, bounded
//!   reads and a reply timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use landlord::agent::SimpleAgent;
//! use landlord::protocol::AgentClient;
//! use landlord::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut client = AgentClient::new(SimpleAgent::new(), config.protocol.clone());
//!     let summary = client.play_remote_game(&config.agent).await?;
//!     println!("played {} games", summary.games);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - game board, bank, rule operations and the event log
//! - [`agent`] - decision points, the dispatcher and the built-in agent
//! - [`protocol`] - framing, handshake, and both ends of the agent connection
//! - [`config`] - TOML configuration
//! - [`logutil`] - log-safe previews of wire payloads
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Rule Engine   │ ← one GameBoard per game instance
//! └─────────────────┘
//!          │ decide()
//! ┌─────────────────┐
//! │   Dispatcher    │ ← local Policy or RemoteAgent per player
//! └─────────────────┘
//!          │ request / reply
//! ┌─────────────────┐
//! │ Agent Protocol  │ ← framed JSON over TCP
//! └─────────────────┘
//! ```

pub mod agent;
pub mod config;
pub mod engine;
pub mod logutil;
pub mod protocol;
