//! # Configuration
//!
//! All runtime settings live in one TOML file (default `config.toml`), written
//! by `landlord init` and read at startup.
//!
//! - [`AgentConfig`] - where the game host listens and the shared auth key
//! - [`ProtocolConfig`] - framing and the limits that bound every read and wait
//! - [`RulesConfig`] - bank inventory, improvement limits and rule-variant values
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ```toml
//! [agent]
//! address = "127.0.0.1"
//! port = 6010
//! authkey = "password"
//!
//! [protocol]
//! framing = "length_prefixed"   # or "legacy" for unframed JSON peers
//! response_timeout_ms = 30000
//!
//! [rules]
//! total_houses = 32
//! total_hotels = 12
//!
//! [[rules.build_prerequisites]]
//! color = "Red"
//! requires_color = "Yellow"
//! ```
//!
//! Every section has defaults, so a partial file is fine.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::engine::{BuildPrerequisite, PurchaseVariant};
use crate::protocol::Framing;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub address: String,
    pub port: u16,
    /// Shared secret checked during the connection handshake.
    pub authkey: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 6010,
            authkey: "password".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub framing: Framing,
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
    /// Reads allowed to end mid-message (legacy framing) before giving up.
    #[serde(default = "default_max_partial_reads")]
    pub max_partial_reads: usize,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn default_max_message_bytes() -> usize {
    1024 * 1024
}

fn default_read_chunk_bytes() -> usize {
    64 * 1024
}

fn default_max_partial_reads() -> usize {
    64
}

fn default_response_timeout_ms() -> u64 {
    30_000
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            framing: Framing::default(),
            max_message_bytes: default_max_message_bytes(),
            read_chunk_bytes: default_read_chunk_bytes(),
            max_partial_reads: default_max_partial_reads(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl ProtocolConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub house_limit_before_hotel: u32,
    pub hotel_limit: u32,
    pub total_houses: u32,
    pub total_hotels: u32,
    /// Amount knocked off the affordability check by the discount purchase rule.
    pub discount_value: i64,
    /// Buy from the bank under the discount rule instead of the plain one.
    pub discount_purchases: bool,
    pub street_repair_per_house: i64,
    pub street_repair_per_hotel: i64,
    pub build_prerequisites: Vec<BuildPrerequisite>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            house_limit_before_hotel: 4,
            hotel_limit: 1,
            total_houses: 32,
            total_hotels: 12,
            discount_value: 10,
            discount_purchases: false,
            street_repair_per_house: 40,
            street_repair_per_hotel: 115,
            build_prerequisites: Vec::new(),
        }
    }
}

impl RulesConfig {
    pub fn discount_variant(&self) -> PurchaseVariant {
        PurchaseVariant::Discount {
            amount: self.discount_value,
        }
    }

    /// The purchase rule a game built from this config buys under.
    pub fn purchase_variant(&self) -> PurchaseVariant {
        if self.discount_purchases {
            self.discount_variant()
        } else {
            PurchaseVariant::Plain
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path`
    pub async fn create_default(path: &str) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.protocol;
        if p.max_message_bytes == 0 {
            return Err(anyhow!("protocol.max_message_bytes must be greater than 0"));
        }
        if p.max_message_bytes > u32::MAX as usize {
            return Err(anyhow!("protocol.max_message_bytes must fit in a 32-bit length prefix"));
        }
        if p.read_chunk_bytes == 0 || p.read_chunk_bytes > p.max_message_bytes {
            return Err(anyhow!(
                "protocol.read_chunk_bytes must be between 1 and max_message_bytes ({})",
                p.max_message_bytes
            ));
        }
        if p.max_partial_reads == 0 {
            return Err(anyhow!("protocol.max_partial_reads must be greater than 0"));
        }
        if p.response_timeout_ms == 0 {
            return Err(anyhow!("protocol.response_timeout_ms must be greater than 0"));
        }

        let r = &self.rules;
        if r.house_limit_before_hotel == 0 || r.hotel_limit == 0 {
            return Err(anyhow!("rules.house_limit_before_hotel and rules.hotel_limit must be greater than 0"));
        }
        if r.discount_value < 0 || r.street_repair_per_house < 0 || r.street_repair_per_hotel < 0 {
            return Err(anyhow!("rules amounts must not be negative"));
        }
        if self.agent.authkey.is_empty() {
            return Err(anyhow!("agent.authkey must not be empty"));
        }
        Ok(())
    }
}
