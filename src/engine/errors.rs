use thiserror::Error;

use crate::agent::DispatchError;

/// Errors that stop a rule-engine call outright.
///
/// Ordinary rule refusals (not enough cash, uneven building, ...) are not
/// errors; they come back as [`super::ActionOutcome::Failure`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown player index {0}")]
    UnknownPlayer(usize),

    #[error("unknown location position {0}")]
    UnknownAsset(usize),

    /// The location exists but is not real estate, a railroad or a utility.
    #[error("{0} cannot be owned")]
    NotPurchaseable(String),

    /// A decision needed mid-operation (bid, settlement) could not be obtained.
    #[error("decision failed: {0}")]
    Dispatch(#[from] DispatchError),
}
