//! The per-game shared context and its serialisable snapshot.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::errors::EngineError;
use super::history::{EventLog, Operation};
use super::types::{
    AssetId, Bank, BuildPrerequisite, Location, LocationClass, Owner, Player, PlayerId,
    PlayerStatus,
};

/// Owner label used for bank-held assets in snapshots and log entries.
pub const BANK_LABEL: &str = "bank";

/// Everything one game instance mutates.
///
/// Players are kept in turn order and locations in board order, so a
/// [`PlayerId`] is a turn index and an [`AssetId`] is a board position.
/// Concurrent games each own their own board; there is no shared state
/// between instances.
#[derive(Debug, Clone)]
pub struct GameBoard {
    pub game_id: Uuid,
    pub players: Vec<Player>,
    pub locations: Vec<Location>,
    pub color_assets: BTreeMap<String, Vec<AssetId>>,
    pub railroad_positions: Vec<usize>,
    pub utility_positions: Vec<usize>,
    pub bank: Bank,
    pub build_prerequisites: Vec<BuildPrerequisite>,
    pub time_step: u64,
    history: EventLog,
}

impl GameBoard {
    /// Build a board from players in turn order and locations in board order.
    ///
    /// Location positions are reassigned from their index. Ownership already set
    /// on a location is mirrored into the owning player's asset set and
    /// improvement totals, and full colour sets are computed.
    pub fn new(players: Vec<Player>, mut locations: Vec<Location>, bank: Bank) -> Self {
        let mut color_assets: BTreeMap<String, Vec<AssetId>> = BTreeMap::new();
        let mut railroad_positions = Vec::new();
        let mut utility_positions = Vec::new();
        for (pos, loc) in locations.iter_mut().enumerate() {
            loc.position = pos;
            match loc.class {
                LocationClass::RealEstate => {
                    if let Some(color) = &loc.color {
                        color_assets.entry(color.clone()).or_default().push(AssetId(pos));
                    }
                }
                LocationClass::Railroad => railroad_positions.push(pos),
                LocationClass::Utility => utility_positions.push(pos),
                _ => {}
            }
        }

        let mut board = Self {
            game_id: Uuid::new_v4(),
            players,
            locations,
            color_assets,
            railroad_positions,
            utility_positions,
            bank,
            build_prerequisites: Vec::new(),
            time_step: 0,
            history: EventLog::new(),
        };

        for pos in 0..board.locations.len() {
            let loc = &mut board.locations[pos];
            if let Owner::Player(pid) = loc.owner {
                match board.players.get_mut(pid.0) {
                    Some(player) => {
                        player.assets.insert(AssetId(pos));
                        player.num_total_houses += loc.num_houses;
                        player.num_total_hotels += loc.num_hotels;
                    }
                    None => loc.owner = Owner::Bank,
                }
            }
        }
        for idx in 0..board.players.len() {
            board.refresh_color_sets(PlayerId(idx));
        }
        board
    }

    pub fn with_build_prerequisites(mut self, prerequisites: Vec<BuildPrerequisite>) -> Self {
        self.build_prerequisites = prerequisites;
        self
    }

    pub fn history(&self) -> &EventLog {
        &self.history
    }

    /// Called by the turn driver once per resolved action.
    pub fn advance_time_step(&mut self) -> u64 {
        self.time_step += 1;
        self.time_step
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, EngineError> {
        self.players.get(id.0).ok_or(EngineError::UnknownPlayer(id.0))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, EngineError> {
        self.players.get_mut(id.0).ok_or(EngineError::UnknownPlayer(id.0))
    }

    pub fn location(&self, id: AssetId) -> Result<&Location, EngineError> {
        self.locations.get(id.0).ok_or(EngineError::UnknownAsset(id.0))
    }

    pub fn location_mut(&mut self, id: AssetId) -> Result<&mut Location, EngineError> {
        self.locations.get_mut(id.0).ok_or(EngineError::UnknownAsset(id.0))
    }

    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players.iter().position(|p| p.name == name).map(PlayerId)
    }

    pub fn asset_by_name(&self, name: &str) -> Option<AssetId> {
        self.locations.iter().position(|l| l.name == name).map(AssetId)
    }

    pub fn owner_label(&self, owner: Owner) -> String {
        match owner {
            Owner::Bank => BANK_LABEL.to_string(),
            Owner::Player(pid) => self
                .players
                .get(pid.0)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("player#{}", pid.0)),
        }
    }

    /// Turn index after `id`, wrapping at the end of the player list.
    pub fn next_player_index(&self, id: PlayerId) -> usize {
        if self.players.is_empty() {
            0
        } else {
            (id.0 + 1) % self.players.len()
        }
    }

    /// The location one step counter-clockwise of `id` (position 0 wraps to the last).
    pub fn counter_clockwise_of(&self, id: AssetId) -> AssetId {
        if id.0 == 0 {
            AssetId(self.locations.len().saturating_sub(1))
        } else {
            AssetId(id.0 - 1)
        }
    }

    pub(crate) fn record(&mut self, operation: Operation, params: Value, returned: Value) {
        let step = self.time_step;
        self.history.record(operation, params, returned, step);
    }

    /// Recompute which colour groups `id` fully owns.
    pub(crate) fn refresh_color_sets(&mut self, id: PlayerId) {
        let Some(player) = self.players.get(id.0) else {
            return;
        };
        let full: Vec<String> = self
            .color_assets
            .iter()
            .filter(|(_, members)| {
                !members.is_empty() && members.iter().all(|a| player.assets.contains(a))
            })
            .map(|(color, _)| color.clone())
            .collect();
        if let Some(player) = self.players.get_mut(id.0) {
            player.full_color_sets_possessed = full.into_iter().collect();
        }
    }

    /// Serialisable view handed to agents along with each decision request.
    pub fn snapshot(&self) -> BoardSnapshot {
        let players = self
            .players
            .iter()
            .map(|p| {
                let snap = PlayerSnapshot {
                    player_name: p.name.clone(),
                    current_cash: p.cash,
                    current_position: p.current_position,
                    status: p.status,
                    assets: p
                        .assets
                        .iter()
                        .filter_map(|a| self.locations.get(a.0).map(|l| l.name.clone()))
                        .collect(),
                    num_total_houses: p.num_total_houses,
                    num_total_hotels: p.num_total_hotels,
                    full_color_sets_possessed: p.full_color_sets_possessed.iter().cloned().collect(),
                };
                (p.name.clone(), snap)
            })
            .collect();

        let locations = self
            .locations
            .iter()
            .map(|l| {
                let purchaseable = l.class.is_purchaseable();
                let snap = LocationSnapshot {
                    name: l.name.clone(),
                    loc_class: l.class,
                    start_position: l.position,
                    price: purchaseable.then_some(l.price),
                    owned_by: purchaseable.then(|| self.owner_label(l.owner)),
                    color: l.color.clone(),
                    price_per_house: l.price_per_house,
                    num_houses: l.num_houses,
                    num_hotels: l.num_hotels,
                    is_mortgaged: l.is_mortgaged,
                };
                (l.name.clone(), snap)
            })
            .collect();

        BoardSnapshot {
            game_id: self.game_id,
            time_step: self.time_step,
            players,
            locations,
            location_sequence: self.locations.iter().map(|l| l.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_name: String,
    pub current_cash: i64,
    pub current_position: usize,
    pub status: PlayerStatus,
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub num_total_houses: u32,
    #[serde(default)]
    pub num_total_hotels: u32,
    #[serde(default)]
    pub full_color_sets_possessed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub name: String,
    pub loc_class: LocationClass,
    pub start_position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub price_per_house: i64,
    #[serde(default)]
    pub num_houses: u32,
    #[serde(default)]
    pub num_hotels: u32,
    #[serde(default)]
    pub is_mortgaged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub game_id: Uuid,
    pub time_step: u64,
    pub players: BTreeMap<String, PlayerSnapshot>,
    pub locations: BTreeMap<String, LocationSnapshot>,
    pub location_sequence: Vec<String>,
}

impl BoardSnapshot {
    pub fn player(&self, name: &str) -> Option<&PlayerSnapshot> {
        self.players.get(name)
    }

    pub fn location(&self, name: &str) -> Option<&LocationSnapshot> {
        self.locations.get(name)
    }

    /// The location `player` is standing on.
    pub fn current_location(&self, player: &str) -> Option<&LocationSnapshot> {
        let pos = self.players.get(player)?.current_position;
        let name = self.location_sequence.get(pos)?;
        self.locations.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> GameBoard {
        let players = vec![Player::new("player_1", 500), Player::new("player_2", 500)];
        let locations = vec![
            Location::fixed("Go", LocationClass::DoNothing),
            Location::real_estate("Mediterranean Avenue", 60, "Brown", 50)
                .owned_by(Owner::Player(PlayerId(0)))
                .with_improvements(1, 0),
            Location::fixed("Community Chest", LocationClass::Action),
            Location::real_estate("Baltic Avenue", 60, "Brown", 50)
                .owned_by(Owner::Player(PlayerId(0))),
            Location::railroad("Reading Railroad", 200),
            Location::utility("Electric Company", 150).owned_by(Owner::Player(PlayerId(7))),
        ];
        GameBoard::new(players, locations, Bank::default())
    }

    #[test]
    fn construction_mirrors_preassigned_ownership() {
        let b = board();
        let p1 = &b.players[0];
        assert_eq!(p1.assets.len(), 2);
        assert_eq!(p1.num_total_houses, 1);
        assert!(p1.full_color_sets_possessed.contains("Brown"));
        assert_eq!(b.railroad_positions, vec![4]);
        assert_eq!(b.utility_positions, vec![5]);
        // Owner index out of range falls back to the bank.
        assert_eq!(b.locations[5].owner, Owner::Bank);
    }

    #[test]
    fn counter_clockwise_wraps_from_go() {
        let b = board();
        assert_eq!(b.counter_clockwise_of(AssetId(0)), AssetId(5));
        assert_eq!(b.counter_clockwise_of(AssetId(3)), AssetId(2));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let b = board();
        let snap = b.snapshot();
        assert_eq!(snap.location("Baltic Avenue").unwrap().owned_by.as_deref(), Some("player_1"));
        assert_eq!(snap.location("Reading Railroad").unwrap().owned_by.as_deref(), Some(BANK_LABEL));
        assert_eq!(snap.location("Go").unwrap().price, None);
        let text = serde_json::to_string(&snap).unwrap();
        let back: BoardSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.current_location("player_2").unwrap().name, "Go");
    }
}
