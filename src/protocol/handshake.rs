//! Shared-secret challenge run once per connection, before any decision request.
//!
//! host  -> `{"function": "challenge", "nonce": "<hex>"}`
//! agent -> `{"function": "authenticate", "digest": "<hex sha256(nonce ++ authkey)>"}`
//! host  -> `1` (accepted) or `0` (rejected, then the host closes)
//! agent -> `1` (acknowledges acceptance)
//!
//! Every step waits for the peer, so no two messages are ever in flight in
//! the same direction. Unframed transports rely on that.
use log::{info, warn};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write;

use super::{Channel, ProtocolError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
enum HandshakeMessage {
    Challenge { nonce: String },
    Authenticate { digest: String },
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Hex SHA-256 of the nonce text followed by the shared key.
pub fn digest(nonce: &str, authkey: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce.as_bytes());
    hasher.update(authkey.as_bytes());
    to_hex(&hasher.finalize())
}

/// Constant-time comparison so a wrong digest leaks no prefix length.
fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn new_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Host side. Returns `AuthenticationFailed` (after telling the agent) when the
/// digest does not match.
pub async fn challenge_agent(channel: &mut Channel, authkey: &str) -> Result<(), ProtocolError> {
    let nonce = new_nonce();
    let challenge = HandshakeMessage::Challenge {
        nonce: nonce.clone(),
    };
    channel.send(&serde_json::to_string(&challenge)?).await?;

    let reply = channel.recv().await?;
    let accepted = match serde_json::from_str::<HandshakeMessage>(&reply) {
        Ok(HandshakeMessage::Authenticate { digest: got }) => digests_match(&got, &digest(&nonce, authkey)),
        _ => false,
    };
    channel.send(if accepted { "1" } else { "0" }).await?;
    if !accepted {
        warn!("agent failed authentication");
        return Err(ProtocolError::AuthenticationFailed);
    }
    match channel.recv().await?.trim() {
        "1" => {
            info!("agent authenticated");
            Ok(())
        }
        other => Err(ProtocolError::UnexpectedReply(other.to_string())),
    }
}

/// Agent side.
pub async fn answer_challenge(channel: &mut Channel, authkey: &str) -> Result<(), ProtocolError> {
    let text = channel.recv().await?;
    let nonce = match serde_json::from_str::<HandshakeMessage>(&text) {
        Ok(HandshakeMessage::Challenge { nonce }) => nonce,
        _ => return Err(ProtocolError::UnexpectedReply(text)),
    };
    let answer = HandshakeMessage::Authenticate {
        digest: digest(&nonce, authkey),
    };
    channel.send(&serde_json::to_string(&answer)?).await?;
    match channel.recv().await?.trim() {
        "1" => {}
        "0" => return Err(ProtocolError::AuthenticationFailed),
        other => return Err(ProtocolError::UnexpectedReply(other.to_string())),
    }
    channel.send("1").await
}
