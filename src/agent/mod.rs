//! # Decision layer
//!
//! A decision point is a named moment where an agent must choose something
//! (buy?, bid?, what to do before rolling?). Points form a closed set,
//! [`DecisionPoint`], and each one has a fixed response shape
//! ([`ResponseShape`]): either an action record or a bare scalar.
//!
//! The [`Dispatcher`] maps a player to the handler that answers for them:
//! an in-process [`Policy`] or a [`RemoteAgent`](crate::protocol::RemoteAgent)
//! reached over the wire.

pub mod dispatch;
pub mod simple;

pub use dispatch::{respond, Dispatcher, Handler, Policy};
pub use simple::SimpleAgent;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::protocol::ProtocolError;

/// Every decision point an agent can be asked about, including the lifecycle
/// notifications. Serialised with the wire name in the `function` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum DecisionPoint {
    StartTournament,
    Startup,
    Shutdown,
    EndTournament,
    #[serde(rename = "make_pre_roll_move")]
    PreRollMove {
        player: String,
        #[serde(default)]
        allowable_moves: Vec<String>,
        #[serde(default)]
        code: i64,
    },
    #[serde(rename = "make_out_of_turn_move")]
    OutOfTurnMove {
        player: String,
        #[serde(default)]
        allowable_moves: Vec<String>,
        #[serde(default)]
        code: i64,
    },
    #[serde(rename = "make_post_roll_move")]
    PostRollMove {
        player: String,
        #[serde(default)]
        allowable_moves: Vec<String>,
        #[serde(default)]
        code: i64,
    },
    #[serde(rename = "make_buy_property_decision")]
    BuyPropertyDecision { player: String, asset: String },
    #[serde(rename = "make_bid")]
    Bid {
        player: String,
        asset: String,
        #[serde(deserialize_with = "whole_amount")]
        current_bid: i64,
    },
    HandleNegativeCashBalance { player: String },
}

/// Hosts written in dynamic languages send bids as floats; money here is whole units.
fn whole_amount<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let v = f64::deserialize(d)?;
    Ok(v.floor() as i64)
}

impl DecisionPoint {
    /// Name used in the `function` field on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            DecisionPoint::StartTournament => "start_tournament",
            DecisionPoint::Startup => "startup",
            DecisionPoint::Shutdown => "shutdown",
            DecisionPoint::EndTournament => "end_tournament",
            DecisionPoint::PreRollMove { .. } => "make_pre_roll_move",
            DecisionPoint::OutOfTurnMove { .. } => "make_out_of_turn_move",
            DecisionPoint::PostRollMove { .. } => "make_post_roll_move",
            DecisionPoint::BuyPropertyDecision { .. } => "make_buy_property_decision",
            DecisionPoint::Bid { .. } => "make_bid",
            DecisionPoint::HandleNegativeCashBalance { .. } => "handle_negative_cash_balance",
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            DecisionPoint::StartTournament
            | DecisionPoint::Startup
            | DecisionPoint::Shutdown
            | DecisionPoint::EndTournament => ResponseShape::Code,
            DecisionPoint::PreRollMove { .. }
            | DecisionPoint::OutOfTurnMove { .. }
            | DecisionPoint::PostRollMove { .. }
            | DecisionPoint::HandleNegativeCashBalance { .. } => ResponseShape::Action,
            DecisionPoint::BuyPropertyDecision { .. } => ResponseShape::Flag,
            DecisionPoint::Bid { .. } => ResponseShape::Amount,
        }
    }

    pub fn player(&self) -> Option<&str> {
        match self {
            DecisionPoint::PreRollMove { player, .. }
            | DecisionPoint::OutOfTurnMove { player, .. }
            | DecisionPoint::PostRollMove { player, .. }
            | DecisionPoint::BuyPropertyDecision { player, .. }
            | DecisionPoint::Bid { player, .. }
            | DecisionPoint::HandleNegativeCashBalance { player } => Some(player),
            _ => None,
        }
    }

    pub fn is_lifecycle(&self) -> bool {
        self.player().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{function, param_dict}` record.
    Action,
    /// Yes/no (buy decision).
    Flag,
    /// Whole-unit money amount (bid).
    Amount,
    /// Integer status code (lifecycle acknowledgements, novelty indicator).
    Code,
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseShape::Action => "action",
            ResponseShape::Flag => "boolean",
            ResponseShape::Amount => "amount",
            ResponseShape::Code => "code",
        };
        f.write_str(s)
    }
}

/// An action the agent wants the host to execute, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionChoice {
    pub function: Option<String>,
    #[serde(default)]
    pub param_dict: Map<String, Value>,
}

impl ActionChoice {
    /// An action that takes no parameters (`skip_turn`, `concluded_actions`).
    pub fn bare(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            param_dict: Map::new(),
        }
    }

    pub fn call(function: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            function: Some(function.into()),
            param_dict: params,
        }
    }

    /// No action, only a status code (negative-balance handling).
    pub fn with_code(code: i64) -> Self {
        let mut params = Map::new();
        params.insert("code".to_string(), Value::from(code));
        Self {
            function: None,
            param_dict: params,
        }
    }

    pub fn code(&self) -> Option<i64> {
        self.param_dict.get("code").and_then(Value::as_i64)
    }
}

/// An agent's answer to a decision point.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Action(ActionChoice),
    Flag(bool),
    Amount(i64),
    Code(i64),
}

impl Decision {
    pub fn shape(&self) -> ResponseShape {
        match self {
            Decision::Action(_) => ResponseShape::Action,
            Decision::Flag(_) => ResponseShape::Flag,
            Decision::Amount(_) => ResponseShape::Amount,
            Decision::Code(_) => ResponseShape::Code,
        }
    }

    fn mismatch(self, expected: ResponseShape) -> DispatchError {
        DispatchError::UnexpectedShape {
            expected,
            got: self.shape(),
        }
    }

    pub fn into_action(self) -> Result<ActionChoice, DispatchError> {
        match self {
            Decision::Action(choice) => Ok(choice),
            other => Err(other.mismatch(ResponseShape::Action)),
        }
    }

    pub fn into_flag(self) -> Result<bool, DispatchError> {
        match self {
            Decision::Flag(v) => Ok(v),
            other => Err(other.mismatch(ResponseShape::Flag)),
        }
    }

    pub fn into_amount(self) -> Result<i64, DispatchError> {
        match self {
            Decision::Amount(v) => Ok(v),
            other => Err(other.mismatch(ResponseShape::Amount)),
        }
    }

    pub fn into_code(self) -> Result<i64, DispatchError> {
        match self {
            Decision::Code(v) => Ok(v),
            other => Err(other.mismatch(ResponseShape::Code)),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The handler could not decide (e.g. the move it needs was not offered).
    /// Never papered over with a guessed action.
    #[error("no decision available for {point}: {reason}")]
    NoDecision { point: &'static str, reason: String },

    #[error("expected a {expected} response, got {got}")]
    UnexpectedShape {
        expected: ResponseShape,
        got: ResponseShape,
    },

    #[error("reply is not a valid {expected} response: {reply}")]
    MalformedReply {
        expected: ResponseShape,
        reply: String,
    },

    /// The remote agent answered with an explicit error record.
    #[error("remote agent reported: {0}")]
    Remote(String),

    #[error("{0} needs the current game board")]
    MissingBoard(&'static str),

    #[error("no handler registered for player {0}")]
    UnknownPlayer(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
