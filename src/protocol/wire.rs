//! Request and reply encoding.
//!
//! A request is a JSON object whose `function` field names the decision point,
//! with the point's fields alongside and an optional `current_gameboard`
//! snapshot. Replies are either the action record `{"function", "param_dict"}`
//! or a bare scalar in its literal text form. Booleans go out as `True`/`False`,
//! which is what existing agents and hosts expect.
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::{ActionChoice, Decision, DecisionPoint, DispatchError, ResponseShape};
use crate::engine::BoardSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(flatten)]
    pub point: DecisionPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_gameboard: Option<BoardSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

impl Request {
    pub fn new(point: DecisionPoint, board: Option<BoardSnapshot>) -> Self {
        Self {
            point,
            current_gameboard: board,
            request_id: None,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

pub fn encode_reply(decision: &Decision) -> serde_json::Result<String> {
    Ok(match decision {
        Decision::Action(choice) => serde_json::to_string(choice)?,
        Decision::Flag(true) => "True".to_string(),
        Decision::Flag(false) => "False".to_string(),
        Decision::Amount(v) | Decision::Code(v) => v.to_string(),
    })
}

/// Reply sent when the agent cannot produce a decision for a request.
pub fn encode_error(reason: &str) -> String {
    json!({ "error": reason }).to_string()
}

/// Parse a reply of the expected `shape`.
pub fn decode_reply(shape: ResponseShape, text: &str) -> Result<Decision, DispatchError> {
    let text = text.trim();
    let malformed = || DispatchError::MalformedReply {
        expected: shape,
        reply: text.to_string(),
    };

    let value: Value = match text {
        "True" => Value::Bool(true),
        "False" => Value::Bool(false),
        _ => serde_json::from_str(text).map_err(|_| malformed())?,
    };
    if let Some(reason) = value.get("error").and_then(Value::as_str) {
        return Err(DispatchError::Remote(reason.to_string()));
    }

    match shape {
        ResponseShape::Action => serde_json::from_value::<ActionChoice>(value)
            .map(Decision::Action)
            .map_err(|_| malformed()),
        ResponseShape::Flag => match value {
            Value::Bool(b) => Ok(Decision::Flag(b)),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Ok(Decision::Flag(true)),
                Some(0) => Ok(Decision::Flag(false)),
                _ => Err(malformed()),
            },
            _ => Err(malformed()),
        },
        ResponseShape::Amount => whole(&value).map(Decision::Amount).ok_or_else(malformed),
        ResponseShape::Code => match value {
            Value::Bool(b) => Ok(Decision::Code(i64::from(b))),
            other => whole(&other).map(Decision::Code).ok_or_else(malformed),
        },
    }
}

fn whole(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}
