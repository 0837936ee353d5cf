//! Routing decision requests to the handler that answers for each player.
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

use super::{ActionChoice, Decision, DecisionPoint, DispatchError};
use crate::engine::{BoardSnapshot, GameBoard};
use crate::protocol::RemoteAgent;

/// An in-process decision policy. One method per decision point, each with the
/// response type that point requires.
pub trait Policy: Send {
    fn pre_roll_move(
        &mut self,
        player: &str,
        board: &BoardSnapshot,
        allowable_moves: &[String],
        code: i64,
    ) -> Result<ActionChoice, DispatchError>;

    fn out_of_turn_move(
        &mut self,
        player: &str,
        board: &BoardSnapshot,
        allowable_moves: &[String],
        code: i64,
    ) -> Result<ActionChoice, DispatchError>;

    fn post_roll_move(
        &mut self,
        player: &str,
        board: &BoardSnapshot,
        allowable_moves: &[String],
        code: i64,
    ) -> Result<ActionChoice, DispatchError>;

    fn buy_property_decision(
        &mut self,
        player: &str,
        asset: &str,
        board: &BoardSnapshot,
    ) -> Result<bool, DispatchError>;

    fn bid(
        &mut self,
        player: &str,
        asset: &str,
        current_bid: i64,
        board: &BoardSnapshot,
    ) -> Result<i64, DispatchError>;

    fn handle_negative_cash_balance(
        &mut self,
        player: &str,
        board: &BoardSnapshot,
    ) -> Result<ActionChoice, DispatchError>;

    fn start_tournament(&mut self) -> i64 {
        1
    }

    fn startup(&mut self, _board: Option<&BoardSnapshot>) -> i64 {
        1
    }

    /// 1 if the agent detected a rule novelty during the game, else 0.
    fn shutdown(&mut self, _board: Option<&BoardSnapshot>) -> i64 {
        0
    }

    fn end_tournament(&mut self) -> i64 {
        1
    }
}

/// Answer `point` with `policy`. Shared by the in-process dispatcher and the
/// remote agent client loop.
pub fn respond<P: Policy + ?Sized>(
    policy: &mut P,
    point: &DecisionPoint,
    board: Option<&BoardSnapshot>,
) -> Result<Decision, DispatchError> {
    let need = || board.ok_or(DispatchError::MissingBoard(point.name()));
    let decision = match point {
        DecisionPoint::StartTournament => Decision::Code(policy.start_tournament()),
        DecisionPoint::Startup => Decision::Code(policy.startup(board)),
        DecisionPoint::Shutdown => Decision::Code(policy.shutdown(board)),
        DecisionPoint::EndTournament => Decision::Code(policy.end_tournament()),
        DecisionPoint::PreRollMove {
            player,
            allowable_moves,
            code,
        } => Decision::Action(policy.pre_roll_move(player, need()?, allowable_moves, *code)?),
        DecisionPoint::OutOfTurnMove {
            player,
            allowable_moves,
            code,
        } => Decision::Action(policy.out_of_turn_move(player, need()?, allowable_moves, *code)?),
        DecisionPoint::PostRollMove {
            player,
            allowable_moves,
            code,
        } => Decision::Action(policy.post_roll_move(player, need()?, allowable_moves, *code)?),
        DecisionPoint::BuyPropertyDecision { player, asset } => {
            Decision::Flag(policy.buy_property_decision(player, asset, need()?)?)
        }
        DecisionPoint::Bid {
            player,
            asset,
            current_bid,
        } => Decision::Amount(policy.bid(player, asset, *current_bid, need()?)?),
        DecisionPoint::HandleNegativeCashBalance { player } => {
            Decision::Action(policy.handle_negative_cash_balance(player, need()?)?)
        }
    };
    Ok(decision)
}

pub enum Handler {
    Local(Box<dyn Policy>),
    Remote(RemoteAgent),
}

impl Handler {
    async fn decide(
        &mut self,
        point: &DecisionPoint,
        board: Option<&BoardSnapshot>,
    ) -> Result<Decision, DispatchError> {
        match self {
            Handler::Local(policy) => respond(policy.as_mut(), point, board),
            Handler::Remote(agent) => agent.request(point, board.cloned()).await,
        }
    }
}

/// Per-game registry of decision handlers keyed by player name.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, player: impl Into<String>, handler: Handler) {
        self.handlers.insert(player.into(), handler);
    }

    pub fn with_local(mut self, player: impl Into<String>, policy: impl Policy + 'static) -> Self {
        self.register(player, Handler::Local(Box::new(policy)));
        self
    }

    pub fn with_remote(mut self, player: impl Into<String>, agent: RemoteAgent) -> Self {
        self.register(player, Handler::Remote(agent));
        self
    }

    /// Ask `player`'s handler about `point`, sending along a snapshot of `board`.
    ///
    /// The reply is checked against the point's fixed response shape. Whether
    /// the chosen action is allowed right now is the caller's business.
    pub async fn decide(
        &mut self,
        player: &str,
        point: DecisionPoint,
        board: &GameBoard,
    ) -> Result<Decision, DispatchError> {
        let snapshot = board.snapshot();
        self.decide_with(player, point, Some(&snapshot)).await
    }

    pub async fn decide_with(
        &mut self,
        player: &str,
        point: DecisionPoint,
        board: Option<&BoardSnapshot>,
    ) -> Result<Decision, DispatchError> {
        let handler = self
            .handlers
            .get_mut(player)
            .ok_or_else(|| DispatchError::UnknownPlayer(player.to_string()))?;
        let decision = handler.decide(&point, board).await?;
        let expected = point.response_shape();
        if decision.shape() != expected {
            warn!(
                "{} answered {} with a {} response",
                player,
                point.name(),
                decision.shape()
            );
            return Err(DispatchError::UnexpectedShape {
                expected,
                got: decision.shape(),
            });
        }
        debug!("{} decided {}: {:?}", player, point.name(), decision);
        Ok(decision)
    }

    /// Deliver a lifecycle notification to every handler and collect each code.
    pub async fn notify_all(
        &mut self,
        point: DecisionPoint,
        board: Option<&BoardSnapshot>,
    ) -> Result<BTreeMap<String, i64>, DispatchError> {
        let mut codes = BTreeMap::new();
        let mut players: Vec<String> = self.handlers.keys().cloned().collect();
        players.sort();
        for player in players {
            let code = self
                .decide_with(&player, point.clone(), board)
                .await?
                .into_code()?;
            codes.insert(player, code);
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SimpleAgent;
    use crate::engine::{Bank, Location, Player};

    fn board() -> GameBoard {
        GameBoard::new(
            vec![Player::new("player_1", 500)],
            vec![Location::real_estate("Boardwalk", 400, "Blue", 200)],
            Bank::default(),
        )
    }

    #[tokio::test]
    async fn unknown_player_is_an_error() {
        let mut d = Dispatcher::new();
        let err = d
            .decide("ghost", DecisionPoint::HandleNegativeCashBalance { player: "ghost".into() }, &board())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownPlayer(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn local_handler_answers_with_fixed_shape() {
        let mut d = Dispatcher::new().with_local("player_1", SimpleAgent::new());
        let decision = d
            .decide(
                "player_1",
                DecisionPoint::BuyPropertyDecision {
                    player: "player_1".into(),
                    asset: "Boardwalk".into(),
                },
                &board(),
            )
            .await
            .unwrap();
        assert_eq!(decision, Decision::Flag(true));

        let codes = d.notify_all(DecisionPoint::Shutdown, None).await.unwrap();
        assert_eq!(codes.get("player_1"), Some(&0));
    }

    #[test]
    fn board_required_for_player_decisions() {
        let mut agent = SimpleAgent::new();
        let err = respond(
            &mut agent,
            &DecisionPoint::HandleNegativeCashBalance { player: "p".into() },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::MissingBoard("handle_negative_cash_balance")));
    }
}
