//! Adding houses and hotels under the uniform-building rule.
use log::debug;

use super::board::GameBoard;
use super::errors::EngineError;
use super::settlement::charge_player;
use super::types::{AssetId, LocationClass, Owner, PlayerId};
use super::{ActionOutcome, Refusal};

/// Add a house (`add_house`) or convert four houses to a hotel (`add_hotel`) on
/// `asset`.
///
/// Checked in order, first failure wins: the player owns the asset and it is
/// not mortgaged; it is real estate; the player holds the full colour set; the
/// player's cash strictly exceeds the per-house price; any build prerequisite
/// configured for the colour is met. If both flags are set the hotel path is
/// taken; if neither is, the call fails.
///
/// Refusals change nothing and log nothing. Success logs one charge entry.
pub fn improve_property(
    board: &mut GameBoard,
    player: PlayerId,
    asset: AssetId,
    add_house: bool,
    add_hotel: bool,
) -> Result<ActionOutcome, EngineError> {
    if let Some(refusal) = legality_refusal(board, player, asset)? {
        debug!("Improvement refused: {}", refusal);
        return Ok(ActionOutcome::Failure(refusal));
    }

    let outcome = if add_hotel {
        add_hotel_to(board, player, asset)?
    } else if add_house {
        add_house_to(board, player, asset)?
    } else {
        ActionOutcome::Failure(Refusal::NothingRequested)
    };
    if let ActionOutcome::Failure(refusal) = &outcome {
        debug!("Improvement refused: {}", refusal);
    }
    Ok(outcome)
}

fn legality_refusal(
    board: &GameBoard,
    player: PlayerId,
    asset: AssetId,
) -> Result<Option<Refusal>, EngineError> {
    let p = board.player(player)?;
    let loc = board.location(asset)?;

    if loc.owner != Owner::Player(player) || loc.is_mortgaged {
        return Ok(Some(Refusal::NotOwnerOrMortgaged {
            player: p.name.clone(),
            asset: loc.name.clone(),
        }));
    }
    let color = match (&loc.class, &loc.color) {
        (LocationClass::RealEstate, Some(color)) => color,
        _ => {
            return Ok(Some(Refusal::NotRealEstate {
                asset: loc.name.clone(),
            }))
        }
    };
    if !p.full_color_sets_possessed.contains(color) {
        return Ok(Some(Refusal::IncompleteColorSet {
            player: p.name.clone(),
            color: color.clone(),
        }));
    }
    if p.cash <= loc.price_per_house {
        return Ok(Some(Refusal::CannotAffordImprovement {
            player: p.name.clone(),
            price: loc.price_per_house,
        }));
    }
    for rule in board.build_prerequisites.iter().filter(|r| &r.color == color) {
        let satisfied = board
            .color_assets
            .get(&rule.requires_color)
            .is_some_and(|members| {
                members
                    .iter()
                    .filter_map(|a| board.locations.get(a.0))
                    .any(|l| l.is_improved())
            });
        if !satisfied {
            return Ok(Some(Refusal::PrerequisiteUnmet {
                color: rule.color.clone(),
                requires_color: rule.requires_color.clone(),
            }));
        }
    }
    Ok(None)
}

fn siblings(board: &GameBoard, asset: AssetId) -> Vec<AssetId> {
    board
        .locations
        .get(asset.0)
        .and_then(|l| l.color.as_ref())
        .and_then(|c| board.color_assets.get(c))
        .map(|members| members.iter().copied().filter(|a| *a != asset).collect())
        .unwrap_or_default()
}

fn add_hotel_to(
    board: &mut GameBoard,
    player: PlayerId,
    asset: AssetId,
) -> Result<ActionOutcome, EngineError> {
    let loc = board.location(asset)?;
    let limit = board.bank.house_limit_before_hotel;
    let (name, houses, hotels) = (loc.name.clone(), loc.num_houses, loc.num_hotels);
    let color = loc.color.clone().unwrap_or_default();

    if hotels == board.bank.hotel_limit {
        return Ok(ActionOutcome::Failure(Refusal::HotelLimitReached {
            asset: name,
            limit: board.bank.hotel_limit,
        }));
    }
    if hotels == 0 && houses != limit {
        return Ok(ActionOutcome::Failure(Refusal::NotEnoughHouses {
            asset: name,
            required: limit,
        }));
    }

    let uniform = siblings(board, asset).iter().all(|s| {
        let sib = &board.locations[s.0];
        if hotels == 0 {
            sib.num_houses == limit || sib.num_hotels == 1
        } else {
            sib.num_hotels >= hotels
        }
    });
    if !uniform {
        return Ok(ActionOutcome::Failure(Refusal::UnevenImprovement { color }));
    }
    if !board.bank.improvement_possible(false, true) {
        return Ok(ActionOutcome::Failure(Refusal::NoHotelsLeft));
    }

    let price = loc_price_per_house(board, asset)?;
    let p = board.player_mut(player)?;
    p.num_total_hotels += 1;
    p.num_total_houses = p.num_total_houses.saturating_sub(houses);
    charge_player(board, player, price, "improvements")?;
    board.bank.total_hotels -= 1;
    board.bank.total_houses += houses;
    let loc = board.location_mut(asset)?;
    loc.num_houses = 0;
    loc.num_hotels += 1;
    debug!(
        "Hotel added to {}; bank now has {} houses and {} hotels",
        name, board.bank.total_houses, board.bank.total_hotels
    );
    Ok(ActionOutcome::Success)
}

fn add_house_to(
    board: &mut GameBoard,
    player: PlayerId,
    asset: AssetId,
) -> Result<ActionOutcome, EngineError> {
    let loc = board.location(asset)?;
    let (name, houses, hotels) = (loc.name.clone(), loc.num_houses, loc.num_hotels);
    let color = loc.color.clone().unwrap_or_default();

    if hotels > 0 || houses == board.bank.house_limit_before_hotel {
        return Ok(ActionOutcome::Failure(Refusal::HouseLimitReached { asset: name }));
    }
    let uniform = siblings(board, asset).iter().all(|s| {
        let sib = &board.locations[s.0];
        sib.num_houses >= houses && sib.num_hotels == 0
    });
    if !uniform {
        return Ok(ActionOutcome::Failure(Refusal::UnevenImprovement { color }));
    }
    if !board.bank.improvement_possible(true, false) {
        return Ok(ActionOutcome::Failure(Refusal::NoHousesLeft));
    }

    let price = loc_price_per_house(board, asset)?;
    board.player_mut(player)?.num_total_houses += 1;
    charge_player(board, player, price, "improvements")?;
    board.bank.total_houses -= 1;
    board.location_mut(asset)?.num_houses += 1;
    debug!(
        "House added to {}; bank now has {} houses left",
        name, board.bank.total_houses
    );
    Ok(ActionOutcome::Success)
}

fn loc_price_per_house(board: &GameBoard, asset: AssetId) -> Result<i64, EngineError> {
    Ok(board.location(asset)?.price_per_house)
}
