//! Battle records and the per-run battle database.
//!
//! A run appends one record per fight; afterwards the database is frozen
//! behind an [Arc] so result records and statistic specimens can share it
//! for later inspection without copying.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::vcr::object::Object;

/// Battle algorithm family a record was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleKind {
    Host,
    NuHost,
    PHost2,
    PHost3,
    PHost4,
}

/// Outcome of one played battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    LeftDestroyed,
    RightDestroyed,
    LeftCaptured,
    RightCaptured,
    Timeout,
    Mutual,
}

/// One recorded battle: the packed sides as the playback engine saw them,
/// plus the seed. Replaying the record reproduces the fight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battle {
    pub left: Object,
    pub right: Object,
    pub seed: u16,
    pub kind: BattleKind,
}

/// Append-only list of battle records for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    battles: Vec<Battle>,
}

/// Shared read-only handle onto a run's battle database.
pub type DatabaseHandle = Arc<Database>;

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, battle: Battle) {
        self.battles.push(battle);
    }

    pub fn num_battles(&self) -> usize {
        self.battles.len()
    }

    pub fn battle(&self, index: usize) -> Option<&Battle> {
        self.battles.get(index)
    }

    pub fn battles(&self) -> &[Battle] {
        &self.battles
    }

    /// Freeze into a shared handle.
    pub fn into_handle(self) -> DatabaseHandle {
        Arc::new(self)
    }
}
