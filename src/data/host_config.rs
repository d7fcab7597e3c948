//! Host configuration and host version tags.
//!
//! The configuration is a read-only store of per-player and scalar options,
//! plus the player-to-race mapping. Only the options the simulator consults
//! are carried; unknown keys in a JSON file are ignored on load.

use serde::{Deserialize, Serialize};

use crate::MAX_PLAYERS;

/// Per-player integer option. A shorter array repeats its last value for the
/// remaining players; an empty one yields the type default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerPlayer<T>(Vec<T>);

impl<T: Copy + Default> PerPlayer<T> {
    pub fn all(value: T) -> Self {
        Self(vec![value])
    }

    pub fn from_values(values: Vec<T>) -> Self {
        Self(values)
    }

    pub fn get(&self, player: i32) -> T {
        if self.0.is_empty() {
            return T::default();
        }
        let index = if player >= 1 {
            ((player - 1) as usize).min(self.0.len() - 1)
        } else {
            0
        };
        self.0[index]
    }

    pub fn set(&mut self, player: i32, value: T) {
        if player < 1 || player > MAX_PLAYERS as i32 {
            return;
        }
        let index = (player - 1) as usize;
        while self.0.len() <= index {
            let fill = self.0.last().copied().unwrap_or_default();
            self.0.push(fill);
        }
        self.0[index] = value;
    }
}

fn per_player_race() -> PerPlayer<i32> {
    PerPlayer::from_values((1..=MAX_PLAYERS as i32).collect())
}

fn default_torps_per_tube() -> PerPlayer<i32> {
    PerPlayer::all(3)
}

fn default_true() -> bool {
    true
}

/// Host configuration options consulted by the simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfiguration {
    pub allow_engine_shield_bonus: bool,
    pub engine_shield_bonus_rate: PerPlayer<i32>,
    pub allow_fed_combat_bonus: bool,
    pub allow_cloaked_ships_attack: bool,
    pub allow_planet_attacks: bool,
    pub allow_alternative_combat: bool,
    pub allow_es_bonus_against_planets: bool,
    pub planets_attack_rebels: bool,
    pub planets_attack_klingons: bool,
    pub gravity_well_range: i32,
    pub round_gravity_wells: bool,
    pub num_experience_levels: i32,
    pub extra_fighter_bays: PerPlayer<i32>,
    /// Experience modifiers, indexed by level (level 1 first).
    pub emod_extra_fighter_bays: Vec<i32>,
    pub emod_engine_shield_bonus_rate: Vec<i32>,
    pub emod_planetary_torps_per_tube: Vec<i32>,
    pub planetary_torps_per_tube: PerPlayer<i32>,
    pub use_base_torps_in_combat: PerPlayer<bool>,
    pub planets_have_tubes: bool,
    pub maximum_defense_on_base: PerPlayer<i32>,
    pub maximum_fighters_on_base: PerPlayer<i32>,
    pub allow_wraparound_map: bool,
    pub wraparound_rectangle: [i32; 4],
    /// Player-to-race mapping; defaults to the identity.
    pub player_race: PerPlayer<i32>,
}

impl Default for HostConfiguration {
    fn default() -> Self {
        Self {
            allow_engine_shield_bonus: false,
            engine_shield_bonus_rate: PerPlayer::all(0),
            allow_fed_combat_bonus: true,
            allow_cloaked_ships_attack: false,
            allow_planet_attacks: true,
            allow_alternative_combat: false,
            allow_es_bonus_against_planets: false,
            planets_attack_rebels: false,
            planets_attack_klingons: false,
            gravity_well_range: 3,
            round_gravity_wells: default_true(),
            num_experience_levels: 0,
            extra_fighter_bays: PerPlayer::all(0),
            emod_extra_fighter_bays: Vec::new(),
            emod_engine_shield_bonus_rate: Vec::new(),
            emod_planetary_torps_per_tube: Vec::new(),
            planetary_torps_per_tube: default_torps_per_tube(),
            use_base_torps_in_combat: PerPlayer::all(true),
            planets_have_tubes: false,
            maximum_defense_on_base: PerPlayer::all(200),
            maximum_fighters_on_base: PerPlayer::all(60),
            allow_wraparound_map: false,
            wraparound_rectangle: [1000, 1000, 3000, 3000],
            player_race: per_player_race(),
        }
    }
}

impl HostConfiguration {
    pub fn player_race_number(&self, player: i32) -> i32 {
        if (1..=MAX_PLAYERS as i32).contains(&player) {
            self.player_race.get(player)
        } else {
            0
        }
    }

    /// Experience modifier lookup: `table[level]`, level 0 yields no bonus,
    /// levels past the end repeat the last entry.
    pub fn experience_bonus(table: &[i32], level: i32) -> i32 {
        if level <= 0 || table.is_empty() {
            0
        } else {
            let index = ((level - 1) as usize).min(table.len() - 1);
            table[index]
        }
    }
}

/// Build a version number from major/minor/patch, comparable as an integer.
pub const fn mk_version(major: u32, minor: u32, patch: u32) -> u32 {
    (major << 16) | (minor << 8) | patch
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostFamily {
    Host,
    PHost,
    NuHost,
    Flak,
}

/// A host family plus version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostVersion {
    pub family: HostFamily,
    pub version: u32,
}

impl HostVersion {
    pub fn new(family: HostFamily, version: u32) -> Self {
        Self { family, version }
    }

    pub fn is_phost(&self) -> bool {
        self.family == HostFamily::PHost
    }

    /// Whether a squared distance counts as a valid hyperjump under this
    /// host. PHost checks the squared value exactly; classic hosts compare
    /// the rounded distance.
    pub fn is_exact_hyperjump_distance2(&self, dist_squared: i64) -> bool {
        const MIN: i64 = 340;
        const MAX: i64 = 360;
        if self.is_phost() {
            (MIN * MIN..=MAX * MAX).contains(&dist_squared)
        } else {
            let dist = (dist_squared as f64).sqrt().round() as i64;
            (MIN..=MAX).contains(&dist)
        }
    }
}
