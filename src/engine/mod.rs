//! # Rule engine
//!
//! Resolves the state changes of a property-trading game: auctions, purchases
//! (with the discount and adjacency variants), house/hotel improvement under the
//! uniform-building rule, cash settlement and bankruptcy.
//!
//! Every operation takes the [`GameBoard`] of one game instance by mutable
//! reference; nothing here is process-global. Operations that need an agent's
//! choice mid-way (auction bids, negative-balance handling) also take the
//! [`Dispatcher`](crate::agent::Dispatcher) and are `async` because a remote
//! agent may have to answer over the wire.
//!
//! Every mutation appends to the board's [`EventLog`]. Refused operations return
//! [`ActionOutcome::Failure`] with a [`Refusal`] explaining why and, unless
//! documented otherwise, leave both the board and the log untouched.

pub mod auction;
pub mod board;
pub mod errors;
pub mod history;
pub mod improvement;
pub mod purchase;
pub mod settlement;
pub mod types;

pub use auction::auction;
pub use board::{BoardSnapshot, GameBoard, LocationSnapshot, PlayerSnapshot};
pub use errors::EngineError;
pub use history::{EventLog, LogEntry, Operation};
pub use improvement::improve_property;
pub use purchase::{buy_property, AdjacencyReference, PurchaseVariant};
pub use settlement::{
    charge_player, charge_street_repairs, declare_bankruptcy, handle_negative_cash_balance,
    pay_player, receive_cash, reset_option_to_buy, update_asset_owner,
};
pub use types::{
    AssetId, Bank, BuildPrerequisite, Location, LocationClass, Owner, Player, PlayerId,
    PlayerStatus,
};

use thiserror::Error;

/// Result of an action a player attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failure(Refusal),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }

    pub fn refusal(&self) -> Option<&Refusal> {
        match self {
            ActionOutcome::Success => None,
            ActionOutcome::Failure(r) => Some(r),
        }
    }
}

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("{asset} is not owned by the bank")]
    NotOwnedByBank { asset: String },

    #[error("{asset} went to auction because {player} could not afford it")]
    SentToAuction { player: String, asset: String },

    #[error("the location before {asset} is not owned by {required}")]
    AdjacencyUnmet { asset: String, required: String },

    #[error("cannot work out the neighbouring player of {player}")]
    NoNeighbor { player: String },

    #[error("{player} does not own {asset} or it is mortgaged")]
    NotOwnerOrMortgaged { player: String, asset: String },

    #[error("{asset} is not real estate")]
    NotRealEstate { asset: String },

    #[error("{player} does not own the full {color} set")]
    IncompleteColorSet { player: String, color: String },

    #[error("{player} cannot afford an improvement costing {price}")]
    CannotAffordImprovement { player: String, price: i64 },

    #[error("{color} can only be improved after some {requires_color} property is improved")]
    PrerequisiteUnmet { color: String, requires_color: String },

    #[error("{asset} already has the maximum of {limit} hotel(s)")]
    HotelLimitReached { asset: String, limit: u32 },

    #[error("{asset} needs {required} houses before a hotel")]
    NotEnoughHouses { asset: String, required: u32 },

    #[error("{asset} already has a hotel or the maximum number of houses")]
    HouseLimitReached { asset: String },

    #[error("every {color} property must be improved evenly first")]
    UnevenImprovement { color: String },

    #[error("the bank has no houses left")]
    NoHousesLeft,

    #[error("the bank has no hotels left")]
    NoHotelsLeft,

    #[error("no improvement was requested")]
    NothingRequested,

    #[error("{player} went bankrupt")]
    Bankrupt { player: String },
}
