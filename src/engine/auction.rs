//! Sequential open auction for a bank-held asset.
use log::{debug, info};

use super::board::GameBoard;
use super::errors::EngineError;
use super::settlement::{charge_player, update_asset_owner};
use super::types::{AssetId, Owner, PlayerId};
use crate::agent::{DecisionPoint, Dispatcher};

/// Run an auction for `asset`, asking players for bids in turn order starting at
/// `starting_player_index`.
///
/// A bid must strictly beat the current high bid (initially 0) or the bidder is
/// out for the rest of the auction; a bid of 0 is a withdrawal. Bidding goes
/// round until at most one bidder is left. The holder of the last accepted bid
/// pays it and takes the asset; if nobody ever bid above 0 the bank keeps it.
/// Bidders may bid beyond their cash; any shortfall is settled later.
///
/// Returns the winner, if any. Bankrupt players are never asked.
pub async fn auction(
    starting_player_index: usize,
    board: &mut GameBoard,
    asset: AssetId,
    dispatcher: &mut Dispatcher,
) -> Result<Option<PlayerId>, EngineError> {
    let loc = board.location(asset)?;
    if !loc.class.is_purchaseable() {
        return Err(EngineError::NotPurchaseable(loc.name.clone()));
    }
    let asset_name = loc.name.clone();
    let n = board.players.len();
    if n == 0 {
        return Ok(None);
    }

    let mut in_auction: Vec<bool> = board.players.iter().map(|p| p.is_active()).collect();
    let mut current_bid: i64 = 0;
    let mut winner: Option<PlayerId> = None;
    let mut idx = starting_player_index % n;
    info!(
        "Auction for {} opens with {}",
        asset_name, board.players[idx].name
    );

    while in_auction.iter().filter(|b| **b).count() > 1 {
        if !in_auction[idx] {
            idx = (idx + 1) % n;
            continue;
        }
        let name = board.players[idx].name.clone();
        let point = DecisionPoint::Bid {
            player: name.clone(),
            asset: asset_name.clone(),
            current_bid,
        };
        let bid = dispatcher.decide(&name, point, board).await?.into_amount()?;

        if bid == 0 {
            debug!("{} withdraws from the auction for {}", name, asset_name);
            in_auction[idx] = false;
        } else if bid <= current_bid {
            debug!(
                "{} bid {} does not beat {}; removed from the auction",
                name, bid, current_bid
            );
            in_auction[idx] = false;
        } else {
            debug!("{} bids {} for {}", name, bid, asset_name);
            current_bid = bid;
            winner = Some(PlayerId(idx));
        }
        idx = (idx + 1) % n;
    }

    match winner {
        Some(w) => {
            info!(
                "{} wins the auction for {} at {}",
                board.players[w.0].name, asset_name, current_bid
            );
            charge_player(board, w, current_bid, "auction")?;
            update_asset_owner(board, asset, Owner::Player(w))?;
        }
        None => debug!("No bids above 0; {} stays with the bank", asset_name),
    }
    Ok(winner)
}
