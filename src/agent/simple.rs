//! The built-in agent: buys what it can afford, bids up to half the gap to
//! the list price, and gives up when its balance goes negative.
use log::debug;
use serde_json::{Map, Value};

use super::{ActionChoice, DispatchError, Policy};
use crate::engine::BoardSnapshot;

#[derive(Debug, Default, Clone)]
pub struct SimpleAgent {
    novelty_detected: Option<bool>,
}

impl SimpleAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember whether a rule novelty was noticed; reported at shutdown.
    pub fn record_novelty(&mut self, detected: bool) {
        self.novelty_detected = Some(detected);
    }
}

fn skip_or_fail(point: &'static str, allowable_moves: &[String]) -> Result<ActionChoice, DispatchError> {
    if allowable_moves.iter().any(|m| m == "skip_turn") {
        Ok(ActionChoice::bare("skip_turn"))
    } else {
        Err(DispatchError::NoDecision {
            point,
            reason: "skip_turn was not offered".to_string(),
        })
    }
}

fn cash_of(point: &'static str, board: &BoardSnapshot, player: &str) -> Result<i64, DispatchError> {
    board
        .player(player)
        .map(|p| p.current_cash)
        .ok_or_else(|| DispatchError::NoDecision {
            point,
            reason: format!("{player} is not on the board"),
        })
}

fn price_of(point: &'static str, board: &BoardSnapshot, asset: &str) -> Result<i64, DispatchError> {
    board
        .location(asset)
        .and_then(|l| l.price)
        .ok_or_else(|| DispatchError::NoDecision {
            point,
            reason: format!("{asset} has no price"),
        })
}

impl Policy for SimpleAgent {
    fn pre_roll_move(
        &mut self,
        _player: &str,
        _board: &BoardSnapshot,
        allowable_moves: &[String],
        _code: i64,
    ) -> Result<ActionChoice, DispatchError> {
        skip_or_fail("make_pre_roll_move", allowable_moves)
    }

    fn out_of_turn_move(
        &mut self,
        _player: &str,
        _board: &BoardSnapshot,
        allowable_moves: &[String],
        _code: i64,
    ) -> Result<ActionChoice, DispatchError> {
        skip_or_fail("make_out_of_turn_move", allowable_moves)
    }

    fn post_roll_move(
        &mut self,
        player: &str,
        board: &BoardSnapshot,
        allowable_moves: &[String],
        code: i64,
    ) -> Result<ActionChoice, DispatchError> {
        const POINT: &str = "make_post_roll_move";
        let cash = cash_of(POINT, board, player)?;
        let offered = |m: &str| allowable_moves.iter().any(|a| a == m);

        if let Some(here) = board.current_location(player) {
            let affordable = here.price.is_some_and(|price| price < cash);
            if offered("buy_property") && affordable {
                if code == -1 {
                    debug!("{}: last purchase attempt failed; concluding actions", player);
                    return Ok(ActionChoice::bare("concluded_actions"));
                }
                debug!("{}: will attempt to buy {} from the bank", player, here.name);
                let mut params = Map::new();
                params.insert("player".into(), Value::from(player));
                params.insert("asset".into(), Value::from(here.name.clone()));
                params.insert("current_gameboard".into(), Value::from("current_gameboard"));
                return Ok(ActionChoice::call("buy_property", params));
            }
        }
        if offered("concluded_actions") {
            return Ok(ActionChoice::bare("concluded_actions"));
        }
        Err(DispatchError::NoDecision {
            point: POINT,
            reason: "neither buy_property nor concluded_actions is usable".to_string(),
        })
    }

    fn buy_property_decision(
        &mut self,
        player: &str,
        asset: &str,
        board: &BoardSnapshot,
    ) -> Result<bool, DispatchError> {
        const POINT: &str = "make_buy_property_decision";
        Ok(cash_of(POINT, board, player)? >= price_of(POINT, board, asset)?)
    }

    fn bid(
        &mut self,
        player: &str,
        asset: &str,
        current_bid: i64,
        board: &BoardSnapshot,
    ) -> Result<i64, DispatchError> {
        const POINT: &str = "make_bid";
        let cash = cash_of(POINT, board, player)?;
        let price = price_of(POINT, board, asset)?;
        if current_bid >= price {
            return Ok(0);
        }
        // always raise by at least one so a bid never ties the high bid
        let new_bid = current_bid + ((price - current_bid) / 2).max(1);
        Ok(if new_bid < cash { new_bid } else { 0 })
    }

    fn handle_negative_cash_balance(
        &mut self,
        _player: &str,
        _board: &BoardSnapshot,
    ) -> Result<ActionChoice, DispatchError> {
        Ok(ActionChoice::with_code(-1))
    }

    fn shutdown(&mut self, _board: Option<&BoardSnapshot>) -> i64 {
        i64::from(self.novelty_detected.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Bank, GameBoard, Location, LocationClass, Player};

    fn snapshot(cash: i64) -> BoardSnapshot {
        GameBoard::new(
            vec![Player::new("player_1", cash).at_position(1)],
            vec![
                Location::fixed("Go", LocationClass::DoNothing),
                Location::real_estate("Park Place", 350, "Blue", 200),
            ],
            Bank::default(),
        )
        .snapshot()
    }

    fn moves(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn post_roll_buys_when_strictly_affordable() {
        let mut a = SimpleAgent::new();
        let choice = a
            .post_roll_move("player_1", &snapshot(400), &moves(&["buy_property", "concluded_actions"]), 0)
            .unwrap();
        assert_eq!(choice.function.as_deref(), Some("buy_property"));
        assert_eq!(choice.param_dict["asset"], "Park Place");

        let choice = a
            .post_roll_move("player_1", &snapshot(400), &moves(&["buy_property", "concluded_actions"]), -1)
            .unwrap();
        assert_eq!(choice.function.as_deref(), Some("concluded_actions"));

        let choice = a
            .post_roll_move("player_1", &snapshot(350), &moves(&["buy_property", "concluded_actions"]), 0)
            .unwrap();
        assert_eq!(choice.function.as_deref(), Some("concluded_actions"));
    }

    #[test]
    fn missing_move_is_surfaced_not_guessed() {
        let mut a = SimpleAgent::new();
        let err = a.pre_roll_move("player_1", &snapshot(400), &moves(&["use_get_out_of_jail_card"]), 0);
        assert!(matches!(err, Err(DispatchError::NoDecision { point: "make_pre_roll_move", .. })));
        let err = a.post_roll_move("player_1", &snapshot(100), &moves(&["buy_property"]), 0);
        assert!(matches!(err, Err(DispatchError::NoDecision { .. })));
    }

    #[test]
    fn bids_halfway_to_price() {
        let mut a = SimpleAgent::new();
        let snap = snapshot(1000);
        assert_eq!(a.bid("player_1", "Park Place", 0, &snap).unwrap(), 175);
        assert_eq!(a.bid("player_1", "Park Place", 300, &snap).unwrap(), 325);
        assert_eq!(a.bid("player_1", "Park Place", 350, &snap).unwrap(), 0);
        assert_eq!(a.bid("player_1", "Park Place", 0, &snapshot(100)).unwrap(), 0);
    }

    #[test]
    fn bid_one_below_price_still_raises() {
        let mut a = SimpleAgent::new();
        let snap = snapshot(1000);
        assert_eq!(a.bid("player_1", "Park Place", 349, &snap).unwrap(), 350);
        assert_eq!(a.bid("player_1", "Park Place", 348, &snap).unwrap(), 349);
    }

    #[test]
    fn shutdown_reports_novelty() {
        let mut a = SimpleAgent::new();
        assert_eq!(a.shutdown(None), 0);
        a.record_novelty(true);
        assert_eq!(a.shutdown(None), 1);
    }
}
