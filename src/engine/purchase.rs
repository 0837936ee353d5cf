//! Buying a bank-held asset, with the discount and adjacency rule variants.
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::auction::auction;
use super::board::GameBoard;
use super::errors::EngineError;
use super::history::Operation;
use super::settlement::{charge_player, reset_option_to_buy, update_asset_owner};
use super::types::{AssetId, LocationClass, Owner, PlayerId};
use super::{ActionOutcome, Refusal};
use crate::agent::Dispatcher;

/// Which purchase rule applies. All variants share the same charge/transfer
/// ending and the same fall-through to an auction when the buyer is short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum PurchaseVariant {
    Plain,
    /// Knock `amount` off the affordability check when the buyer already owns a
    /// railroad (for railroads), a utility (for utilities) or a same-coloured
    /// property (for real estate).
    ///
    /// The amount charged on success is still the full price. On the auction
    /// path the asset's stored price is lowered by the discount permanently.
    Discount { amount: i64 },
    /// The location just counter-clockwise of the asset, when ownable, must
    /// belong to the reference player or the purchase is refused outright.
    Adjacent { reference: AdjacencyReference },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyReference {
    /// The buyer themselves.
    Buyer,
    /// The player at turn index `(buyer ordinal + 1) % player count`, where the
    /// ordinal is the number at the end of the buyer's name.
    RightNeighbor,
}

/// Buy `asset` from the bank for `player`.
///
/// Fails without an auction when the bank does not own the asset (the buyer's
/// option to buy is cleared) or when an adjacency requirement is not met. When
/// the buyer cannot afford it, the option is cleared and the asset is auctioned
/// starting with the next player; this always reports failure, even if the
/// buyer then wins the auction.
///
/// On success the log gains three entries: charge, ownership transfer,
/// option reset.
pub async fn buy_property(
    board: &mut GameBoard,
    player: PlayerId,
    asset: AssetId,
    variant: &PurchaseVariant,
    dispatcher: &mut Dispatcher,
) -> Result<ActionOutcome, EngineError> {
    let loc = board.location(asset)?;
    if !loc.class.is_purchaseable() {
        return Err(EngineError::NotPurchaseable(loc.name.clone()));
    }
    let asset_name = loc.name.clone();
    let price = loc.price;
    let owner = loc.owner;
    let player_name = board.player(player)?.name.clone();

    if owner != Owner::Bank {
        debug!(
            "{} is not owned by Bank! Resetting option_to_buy for {}",
            asset_name, player_name
        );
        reset_option_to_buy(board, player)?;
        return Ok(ActionOutcome::Failure(Refusal::NotOwnedByBank { asset: asset_name }));
    }

    let mut discount = 0;
    match variant {
        PurchaseVariant::Plain => {}
        PurchaseVariant::Discount { amount } => {
            if discount_eligible(board, player, asset)? {
                debug!("{} is eligible for a discount of {}", player_name, amount);
                discount = *amount;
            }
        }
        PurchaseVariant::Adjacent { reference } => {
            if let Some(refusal) = adjacency_refusal(board, player, asset, *reference)? {
                debug!("{} cannot buy {}: {}", player_name, asset_name, refusal);
                return Ok(ActionOutcome::Failure(refusal));
            }
        }
    }

    if board.player(player)?.cash < price - discount {
        if discount != 0 {
            board.location_mut(asset)?.price -= discount;
        }
        let starting_player_index = board.next_player_index(player);
        reset_option_to_buy(board, player)?;
        debug!(
            "{} is going up for auction since {} does not have enough cash to purchase it",
            asset_name, player_name
        );
        let winner = auction(starting_player_index, board, asset, dispatcher).await?;
        let winner_name = winner.map(|w| board.owner_label(Owner::Player(w)));
        board.record(
            Operation::Auction,
            json!({ "starting_player_index": starting_player_index, "asset": asset_name }),
            winner_name.map(Value::String).unwrap_or(Value::Null),
        );
        return Ok(ActionOutcome::Failure(Refusal::SentToAuction {
            player: player_name,
            asset: asset_name,
        }));
    }

    debug!("Charging {} amount {} for asset {}", player_name, price, asset_name);
    charge_player(board, player, price, "buy property")?;
    update_asset_owner(board, asset, Owner::Player(player))?;
    reset_option_to_buy(board, player)?;
    Ok(ActionOutcome::Success)
}

fn discount_eligible(board: &GameBoard, player: PlayerId, asset: AssetId) -> Result<bool, EngineError> {
    let owned = &board.player(player)?.assets;
    let loc = board.location(asset)?;
    let eligible = match loc.class {
        LocationClass::Railroad => board
            .railroad_positions
            .iter()
            .any(|pos| owned.contains(&AssetId(*pos))),
        LocationClass::Utility => board
            .utility_positions
            .iter()
            .any(|pos| owned.contains(&AssetId(*pos))),
        LocationClass::RealEstate => loc
            .color
            .as_ref()
            .and_then(|c| board.color_assets.get(c))
            .is_some_and(|members| members.iter().any(|a| owned.contains(a))),
        _ => false,
    };
    Ok(eligible)
}

fn adjacency_refusal(
    board: &GameBoard,
    player: PlayerId,
    asset: AssetId,
    reference: AdjacencyReference,
) -> Result<Option<Refusal>, EngineError> {
    let required = match reference {
        AdjacencyReference::Buyer => player,
        AdjacencyReference::RightNeighbor => {
            let buyer = board.player(player)?;
            match buyer.ordinal() {
                Some(ordinal) => PlayerId((ordinal + 1) % board.players.len()),
                None => {
                    return Ok(Some(Refusal::NoNeighbor {
                        player: buyer.name.clone(),
                    }))
                }
            }
        }
    };
    let left = board.location(board.counter_clockwise_of(asset))?;
    if left.class.is_purchaseable() && left.owner != Owner::Player(required) {
        return Ok(Some(Refusal::AdjacencyUnmet {
            asset: board.location(asset)?.name.clone(),
            required: board.owner_label(Owner::Player(required)),
        }));
    }
    Ok(None)
}
