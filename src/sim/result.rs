//! Per-run result record: battle database plus weight/series bookkeeping.

use crate::sim::config::{Configuration, HostMode};
use crate::vcr::database::DatabaseHandle;

/// Result of a single simulation run.
///
/// Besides the battles, the simulator reports a weight. This is used
/// exclusively under seed control: when a probabilistic branch is taken (for
/// example the 59% chance of the 360 kt bonus), the branch taken in this run
/// contributes its probability to `this_battle_weight`, the denominator goes
/// into `total_battle_weight`, and the series grows accordingly.
#[derive(Debug, Clone)]
pub struct Result {
    /// Weight of this run for statistics purposes. Filled in by the simulator.
    pub this_battle_weight: i64,
    /// Total weight of a series. Must be constant for one set of options;
    /// it is kept around to detect (and compensate) when it is not.
    pub total_battle_weight: i64,
    /// Number of possibly-different battles the current options produce.
    pub series_length: i64,
    /// Index of this run, 0-based. Filled in by the driver.
    pub this_battle_index: i64,
    /// The battles of this run. Filled in by the simulator.
    pub battles: Option<DatabaseHandle>,
}

impl Result {
    pub fn new() -> Self {
        Self {
            this_battle_weight: 1,
            total_battle_weight: 1,
            series_length: 1,
            this_battle_index: 0,
            battles: None,
        }
    }

    /// Initialize for a run. The natural series length depends on the seed
    /// space of the emulated host.
    pub fn init(&mut self, opts: &Configuration, this_battle_index: i64) {
        self.this_battle_index = this_battle_index;
        self.this_battle_weight = 1;
        self.total_battle_weight = 1;
        self.series_length = match opts.mode() {
            HostMode::NuHost => 118,
            HostMode::Flak => 1,
            _ => 110,
        };
        self.battles = None;
    }

    /// Announce a probabilistic branch with `length` cases and return which
    /// case this run is in. For example, `add_series(2)` doubles the series
    /// and returns 0 during the first half of the index space, 1 during the
    /// second.
    pub fn add_series(&mut self, length: i64) -> i64 {
        let result = self.this_battle_index / self.series_length;
        self.series_length *= length;
        result % length
    }

    /// Rescale this run's weight to a new total, keeping the proportion.
    pub fn change_weight_to(&mut self, new_weight: i64) {
        self.this_battle_weight = self.this_battle_weight * new_weight / self.total_battle_weight;
        self.total_battle_weight = new_weight;
    }
}
