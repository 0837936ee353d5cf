//! Test utilities & fixtures: small boards and a scripted decision policy.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use landlord::agent::{ActionChoice, DispatchError, Policy};
use landlord::engine::{Bank, BoardSnapshot, GameBoard, Location, LocationClass, Owner, Player, PlayerId};

/// Three players and a board with a full brown group, a two-member blue group,
/// two railroads and a utility.
///
/// ```text
/// 0 Go | 1 Mediterranean | 2 Baltic | 3 Reading RR | 4 Park Place | 5 Boardwalk
/// 6 Pennsylvania RR | 7 Electric Company | 8 Income Tax
/// ```
pub fn three_player_board(cash: [i64; 3]) -> GameBoard {
    let players = vec![
        Player::new("player_1", cash[0]),
        Player::new("player_2", cash[1]),
        Player::new("player_3", cash[2]),
    ];
    GameBoard::new(players, standard_locations(), Bank::default())
}

pub fn standard_locations() -> Vec<Location> {
    vec![
        Location::fixed("Go", LocationClass::DoNothing),
        Location::real_estate("Mediterranean Avenue", 60, "Brown", 50),
        Location::real_estate("Baltic Avenue", 60, "Brown", 50),
        Location::railroad("Reading Railroad", 200),
        Location::real_estate("Park Place", 350, "Blue", 200),
        Location::real_estate("Boardwalk", 400, "Blue", 200),
        Location::railroad("Pennsylvania Railroad", 200),
        Location::utility("Electric Company", 150),
        Location::fixed("Income Tax", LocationClass::Tax),
    ]
}

pub fn asset(board: &GameBoard, name: &str) -> landlord::engine::AssetId {
    board.asset_by_name(name).expect("asset on fixture board")
}

pub fn owner_of(board: &GameBoard, name: &str) -> Owner {
    board.location(asset(board, name)).unwrap().owner
}

pub fn cash_of(board: &GameBoard, player: usize) -> i64 {
    board.player(PlayerId(player)).unwrap().cash
}

/// Shared record of which decision points a scripted policy was asked.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Answers from a script: queued bids, a fixed buy answer and a fixed
/// negative-balance code. Running out of bids is a withdrawal.
pub struct ScriptedPolicy {
    pub name: String,
    pub bids: VecDeque<i64>,
    pub buy: bool,
    pub negative_balance_code: i64,
    pub calls: CallLog,
}

impl ScriptedPolicy {
    pub fn new(name: &str, calls: CallLog) -> Self {
        Self {
            name: name.to_string(),
            bids: VecDeque::new(),
            buy: false,
            negative_balance_code: -1,
            calls,
        }
    }

    pub fn with_bids(mut self, bids: &[i64]) -> Self {
        self.bids = bids.iter().copied().collect();
        self
    }

    pub fn with_negative_balance_code(mut self, code: i64) -> Self {
        self.negative_balance_code = code;
        self
    }

    fn note(&self, what: String) {
        self.calls.lock().unwrap().push(what);
    }
}

impl Policy for ScriptedPolicy {
    fn pre_roll_move(&mut self, _: &str, _: &BoardSnapshot, _: &[String], _: i64) -> Result<ActionChoice, DispatchError> {
        self.note(format!("{} pre_roll", self.name));
        Ok(ActionChoice::bare("skip_turn"))
    }

    fn out_of_turn_move(&mut self, _: &str, _: &BoardSnapshot, _: &[String], _: i64) -> Result<ActionChoice, DispatchError> {
        self.note(format!("{} out_of_turn", self.name));
        Ok(ActionChoice::bare("skip_turn"))
    }

    fn post_roll_move(&mut self, _: &str, _: &BoardSnapshot, _: &[String], _: i64) -> Result<ActionChoice, DispatchError> {
        self.note(format!("{} post_roll", self.name));
        Ok(ActionChoice::bare("concluded_actions"))
    }

    fn buy_property_decision(&mut self, _: &str, asset: &str, _: &BoardSnapshot) -> Result<bool, DispatchError> {
        self.note(format!("{} buy {}", self.name, asset));
        Ok(self.buy)
    }

    fn bid(&mut self, _: &str, _: &str, current_bid: i64, _: &BoardSnapshot) -> Result<i64, DispatchError> {
        let bid = self.bids.pop_front().unwrap_or(0);
        self.note(format!("{} bid {} over {}", self.name, bid, current_bid));
        Ok(bid)
    }

    fn handle_negative_cash_balance(&mut self, _: &str, _: &BoardSnapshot) -> Result<ActionChoice, DispatchError> {
        self.note(format!("{} negative_balance", self.name));
        Ok(ActionChoice::with_code(self.negative_balance_code))
    }
}

/// A dispatcher with one scripted policy per player of `board`, bids taken from
/// `bids` by turn index.
pub fn scripted_dispatcher(board: &GameBoard, bids: HashMap<usize, Vec<i64>>) -> (landlord::agent::Dispatcher, CallLog) {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let mut dispatcher = landlord::agent::Dispatcher::new();
    for (idx, player) in board.players.iter().enumerate() {
        let script = bids.get(&idx).cloned().unwrap_or_default();
        let policy = ScriptedPolicy::new(&player.name, calls.clone()).with_bids(&script);
        dispatcher = dispatcher.with_local(player.name.clone(), policy);
    }
    (dispatcher, calls)
}
