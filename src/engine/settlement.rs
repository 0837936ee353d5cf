//! Cash settlement, ownership transfer and bankruptcy.
//!
//! These are the primitive mutations the higher-level rules are built from;
//! each one appends exactly one entry to the event log.
use log::{debug, info};
use serde_json::{json, Value};

use super::board::GameBoard;
use super::errors::EngineError;
use super::history::Operation;
use super::types::{AssetId, Owner, PlayerId, PlayerStatus};
use super::{ActionOutcome, Refusal};
use crate::agent::{DecisionPoint, Dispatcher};
use crate::config::RulesConfig;

/// Take `amount` from a player. Cash is allowed to go negative; settlement
/// happens later through [`handle_negative_cash_balance`].
pub fn charge_player(
    board: &mut GameBoard,
    player: PlayerId,
    amount: i64,
    description: &str,
) -> Result<(), EngineError> {
    let p = board.player_mut(player)?;
    p.cash -= amount;
    let name = p.name.clone();
    debug!("Charged {} amount {} for {}", name, amount, description);
    board.record(
        Operation::ChargePlayer,
        json!({ "player": name, "amount": amount, "description": description }),
        Value::Null,
    );
    Ok(())
}

pub fn receive_cash(
    board: &mut GameBoard,
    player: PlayerId,
    amount: i64,
    description: &str,
) -> Result<(), EngineError> {
    let p = board.player_mut(player)?;
    p.cash += amount;
    let name = p.name.clone();
    debug!("{} received {} for {}", name, amount, description);
    board.record(
        Operation::ReceiveCash,
        json!({ "player": name, "amount": amount, "description": description }),
        Value::Null,
    );
    Ok(())
}

/// Move cash between two players (rent and the like): one charge, one credit.
pub fn pay_player(
    board: &mut GameBoard,
    from: PlayerId,
    to: PlayerId,
    amount: i64,
    description: &str,
) -> Result<(), EngineError> {
    board.player(to)?;
    charge_player(board, from, amount, description)?;
    receive_cash(board, to, amount, description)
}

/// Hand `asset` to `new_owner`, detaching it from any previous owner and
/// refreshing both players' full colour sets.
pub fn update_asset_owner(
    board: &mut GameBoard,
    asset: AssetId,
    new_owner: Owner,
) -> Result<(), EngineError> {
    let loc = board.location(asset)?;
    if !loc.class.is_purchaseable() {
        return Err(EngineError::NotPurchaseable(loc.name.clone()));
    }
    let previous = loc.owner;
    let asset_name = loc.name.clone();
    if let Owner::Player(next) = new_owner {
        board.player(next)?;
    }

    if let Owner::Player(prev) = previous {
        if let Some(p) = board.players.get_mut(prev.0) {
            p.assets.remove(&asset);
        }
    }
    if let Owner::Player(next) = new_owner {
        board.player_mut(next)?.assets.insert(asset);
    }
    board.location_mut(asset)?.owner = new_owner;

    if let Owner::Player(prev) = previous {
        board.refresh_color_sets(prev);
    }
    if let Owner::Player(next) = new_owner {
        board.refresh_color_sets(next);
    }

    let from = board.owner_label(previous);
    let to = board.owner_label(new_owner);
    debug!("{} changes hands: {} -> {}", asset_name, from, to);
    board.record(
        Operation::UpdateAssetOwner,
        json!({ "asset": asset_name, "from": from, "to": to }),
        Value::Null,
    );
    Ok(())
}

pub fn reset_option_to_buy(board: &mut GameBoard, player: PlayerId) -> Result<(), EngineError> {
    let p = board.player_mut(player)?;
    p.option_to_buy = false;
    let name = p.name.clone();
    board.record(Operation::ResetOptionToBuy, json!({ "player": name }), Value::Null);
    Ok(())
}

/// Charge a player for every house and hotel they own at the configured
/// street-repair rates.
pub fn charge_street_repairs(
    board: &mut GameBoard,
    player: PlayerId,
    rules: &RulesConfig,
) -> Result<i64, EngineError> {
    let p = board.player(player)?;
    let cost = i64::from(p.num_total_houses) * rules.street_repair_per_house
        + i64::from(p.num_total_hotels) * rules.street_repair_per_hotel;
    debug!("calculating street repair cost for {}: {}", p.name, cost);
    charge_player(board, player, cost, "street repairs")?;
    Ok(cost)
}

/// Ask a player with a negative balance to fix it, and bankrupt them if they
/// give up (code -1) or are still negative afterwards.
pub async fn handle_negative_cash_balance(
    board: &mut GameBoard,
    player: PlayerId,
    dispatcher: &mut Dispatcher,
) -> Result<ActionOutcome, EngineError> {
    let p = board.player(player)?;
    if p.cash >= 0 || !p.is_active() {
        return Ok(ActionOutcome::Success);
    }
    let name = p.name.clone();
    let point = DecisionPoint::HandleNegativeCashBalance {
        player: name.clone(),
    };
    let choice = dispatcher.decide(&name, point, board).await?.into_action()?;
    let code = choice.code().unwrap_or(-1);

    if code == -1 || board.player(player)?.cash < 0 {
        debug!("{} could not restore a non-negative balance (code {})", name, code);
        declare_bankruptcy(board, player)?;
        return Ok(ActionOutcome::Failure(Refusal::Bankrupt { player: name }));
    }
    Ok(ActionOutcome::Success)
}

/// Return every asset and improvement of `player` to the bank and mark them lost.
pub fn declare_bankruptcy(board: &mut GameBoard, player: PlayerId) -> Result<(), EngineError> {
    let assets: Vec<AssetId> = board.player(player)?.assets.iter().copied().collect();
    for asset in assets {
        let loc = board.location_mut(asset)?;
        let (houses, hotels) = (loc.num_houses, loc.num_hotels);
        let asset_name = loc.name.clone();
        loc.num_houses = 0;
        loc.num_hotels = 0;
        loc.is_mortgaged = false;
        if houses > 0 || hotels > 0 {
            board.bank.total_houses += houses;
            board.bank.total_hotels += hotels;
            board.record(
                Operation::ReturnImprovements,
                json!({ "asset": asset_name, "houses": houses, "hotels": hotels }),
                Value::Null,
            );
        }
        update_asset_owner(board, asset, Owner::Bank)?;
    }

    let p = board.player_mut(player)?;
    p.status = PlayerStatus::Lost;
    p.num_total_houses = 0;
    p.num_total_hotels = 0;
    p.option_to_buy = false;
    let name = p.name.clone();
    let cash = p.cash;
    info!("{} is bankrupt with cash {}", name, cash);
    board.record(
        Operation::DeclareBankruptcy,
        json!({ "player": name, "cash": cash }),
        Value::Null,
    );
    Ok(())
}
