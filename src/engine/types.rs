//! Board records shared by every rule: players, locations and the bank's
//! improvement inventory.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::RulesConfig;

/// Index of a player in turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

/// Board position of a location; doubles as its index in the location sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationClass {
    RealEstate,
    Railroad,
    Utility,
    Action,
    Tax,
    DoNothing,
}

impl LocationClass {
    pub fn is_purchaseable(self) -> bool {
        matches!(
            self,
            LocationClass::RealEstate | LocationClass::Railroad | LocationClass::Utility
        )
    }
}

/// Who holds an asset. The asset never owns the player; this is a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Bank,
    Player(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    /// Bankrupt. The record stays in the player list so history can still refer to it.
    Lost,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    /// May dip below zero until settlement runs.
    pub cash: i64,
    pub current_position: usize,
    pub status: PlayerStatus,
    pub assets: BTreeSet<AssetId>,
    pub num_total_houses: u32,
    pub num_total_hotels: u32,
    pub full_color_sets_possessed: BTreeSet<String>,
    pub option_to_buy: bool,
}

impl Player {
    pub fn new(name: impl Into<String>, cash: i64) -> Self {
        Self {
            name: name.into(),
            cash,
            current_position: 0,
            status: PlayerStatus::Active,
            assets: BTreeSet::new(),
            num_total_houses: 0,
            num_total_hotels: 0,
            full_color_sets_possessed: BTreeSet::new(),
            option_to_buy: false,
        }
    }

    pub fn at_position(mut self, position: usize) -> Self {
        self.current_position = position;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }

    /// Trailing decimal digits of the player name (`player_3` -> 3).
    pub fn ordinal(&self) -> Option<usize> {
        let digits: String = self
            .name
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse().ok()
    }
}

/// A board location. Only real estate, railroads and utilities can be owned;
/// the other classes exist so positions line up with the physical board.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: String,
    pub position: usize,
    pub class: LocationClass,
    pub owner: Owner,
    pub price: i64,
    pub color: Option<String>,
    pub price_per_house: i64,
    pub num_houses: u32,
    pub num_hotels: u32,
    pub is_mortgaged: bool,
}

impl Location {
    fn base(name: impl Into<String>, class: LocationClass, price: i64) -> Self {
        Self {
            name: name.into(),
            position: 0,
            class,
            owner: Owner::Bank,
            price,
            color: None,
            price_per_house: 0,
            num_houses: 0,
            num_hotels: 0,
            is_mortgaged: false,
        }
    }

    pub fn real_estate(
        name: impl Into<String>,
        price: i64,
        color: impl Into<String>,
        price_per_house: i64,
    ) -> Self {
        let mut loc = Self::base(name, LocationClass::RealEstate, price);
        loc.color = Some(color.into());
        loc.price_per_house = price_per_house;
        loc
    }

    pub fn railroad(name: impl Into<String>, price: i64) -> Self {
        Self::base(name, LocationClass::Railroad, price)
    }

    pub fn utility(name: impl Into<String>, price: i64) -> Self {
        Self::base(name, LocationClass::Utility, price)
    }

    /// A location nobody can buy (Go, taxes, card draws, jail).
    pub fn fixed(name: impl Into<String>, class: LocationClass) -> Self {
        Self::base(name, class, 0)
    }

    pub fn owned_by(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_improvements(mut self, houses: u32, hotels: u32) -> Self {
        self.num_houses = houses;
        self.num_hotels = hotels;
        self
    }

    pub fn mortgaged(mut self) -> Self {
        self.is_mortgaged = true;
        self
    }

    pub fn is_improved(&self) -> bool {
        self.num_houses > 0 || self.num_hotels > 0
    }
}

/// Remaining improvement inventory and the per-asset limits that govern it.
///
/// Inventory counters are unsigned: an improvement that would take them below
/// zero is refused up front by [`Bank::improvement_possible`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub total_houses: u32,
    pub total_hotels: u32,
    pub house_limit_before_hotel: u32,
    pub hotel_limit: u32,
}

impl Bank {
    pub fn from_rules(rules: &RulesConfig) -> Self {
        Self {
            total_houses: rules.total_houses,
            total_hotels: rules.total_hotels,
            house_limit_before_hotel: rules.house_limit_before_hotel,
            hotel_limit: rules.hotel_limit,
        }
    }

    pub fn improvement_possible(&self, add_house: bool, add_hotel: bool) -> bool {
        if add_hotel {
            self.total_hotels > 0
        } else if add_house {
            self.total_houses > 0
        } else {
            false
        }
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self {
            total_houses: 32,
            total_hotels: 12,
            house_limit_before_hotel: 4,
            hotel_limit: 1,
        }
    }
}

/// A colour group that may only be improved once some asset of
/// `requires_color` already carries a house or hotel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPrerequisite {
    pub color: String,
    pub requires_color: String,
}
