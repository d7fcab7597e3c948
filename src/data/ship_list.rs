//! Ship list: hulls, beams, torpedo launchers, engines, friendly codes.
//!
//! Consumed read-only by the simulator. Records are plain serde structs so a
//! list can be loaded from JSON (see [crate::data::loader]).

use serde::{Deserialize, Serialize};

use crate::sim::Ability;

/// Set of players, 1-based up to [MAX_PLAYERS](crate::MAX_PLAYERS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerSet(u16);

impl PlayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: i32) {
        if (1..=crate::MAX_PLAYERS as i32).contains(&player) {
            self.0 |= 1 << player;
        }
    }

    pub fn contains(self, player: i32) -> bool {
        (1..=crate::MAX_PLAYERS as i32).contains(&player) && self.0 & (1 << player) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = i32> {
        (1..=crate::MAX_PLAYERS as i32).filter(move |p| self.contains(*p))
    }
}

impl FromIterator<i32> for PlayerSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut set = PlayerSet::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

/// Assignment of an ability to a hull, restricted to a player set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HullFunction {
    pub ability: Ability,
    pub players: PlayerSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hull {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    pub mass: i32,
    pub max_beams: i32,
    pub max_launchers: i32,
    pub num_bays: i32,
    pub max_cargo: i32,
    #[serde(default)]
    pub max_crew: i32,
    #[serde(default)]
    pub num_engines: i32,
    #[serde(default = "default_picture")]
    pub picture: i32,
    #[serde(default)]
    pub functions: Vec<HullFunction>,
}

fn default_picture() -> i32 {
    200
}

impl Hull {
    pub fn has_function(&self, ability: Ability, player: i32) -> bool {
        self.functions
            .iter()
            .any(|f| f.ability == ability && f.players.contains(player))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    /// Money cost of one beam.
    #[serde(default)]
    pub cost: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorpedoLauncher {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    /// Money cost of one torpedo of this type.
    pub torpedo_cost: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    /// Money cost; enters the engine-shield bonus formula.
    pub cost: i32,
}

/// Friendly codes with special host meaning (exempt from match rules under
/// PHost-family hosts).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendlyCodeList {
    #[serde(default)]
    special: Vec<String>,
}

impl FriendlyCodeList {
    pub fn add_special(&mut self, code: &str) {
        self.special.push(code.to_string());
    }

    pub fn is_special(&self, code: &str) -> bool {
        self.special.iter().any(|c| c == code)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipList {
    #[serde(default)]
    pub hulls: Vec<Hull>,
    #[serde(default)]
    pub beams: Vec<Beam>,
    #[serde(default)]
    pub launchers: Vec<TorpedoLauncher>,
    #[serde(default)]
    pub engines: Vec<Engine>,
    #[serde(default)]
    pub friendly_codes: FriendlyCodeList,
}

impl ShipList {
    pub fn hull(&self, id: i32) -> Option<&Hull> {
        self.hulls.iter().find(|h| h.id == id)
    }

    pub fn beam(&self, id: i32) -> Option<&Beam> {
        self.beams.iter().find(|b| b.id == id)
    }

    pub fn launcher(&self, id: i32) -> Option<&TorpedoLauncher> {
        self.launchers.iter().find(|t| t.id == id)
    }

    pub fn engine(&self, id: i32) -> Option<&Engine> {
        self.engines.iter().find(|e| e.id == id)
    }

    /// Highest beam type id.
    pub fn num_beam_types(&self) -> i32 {
        self.beams.iter().map(|b| b.id).max().unwrap_or(0)
    }

    /// Highest torpedo type id.
    pub fn num_torpedo_types(&self) -> i32 {
        self.launchers.iter().map(|t| t.id).max().unwrap_or(0)
    }

    /// List with the standard component tables (10 beam types, 10 torpedo
    /// types, 9 engines with linear costs) and no hulls. Enough to simulate
    /// setups built from custom ships.
    pub fn with_default_components() -> Self {
        let mut list = ShipList::default();
        for i in 1..=10 {
            list.beams.push(Beam {
                id: i,
                name: format!("Beam {i}"),
                cost: 10 * i,
            });
            list.launchers.push(TorpedoLauncher {
                id: i,
                name: format!("Launcher {i}"),
                torpedo_cost: 5 * i,
            });
        }
        for i in 1..=9 {
            list.engines.push(Engine {
                id: i,
                name: format!("Engine {i}"),
                cost: 100 * i,
            });
        }
        list
    }
}
