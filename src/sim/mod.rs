//! The battle simulation core: units, setups, configuration, the simulator
//! main loop and the aggregation layer.

pub mod ability;
pub mod battle_order;
pub mod config;
pub mod export;
pub mod result;
pub mod result_list;
pub mod rng;
pub mod run;
pub mod runner;
pub mod setup;
pub mod tables;
pub mod unit;
pub mod unit_result;

pub use ability::{Ability, AbilitySet, UnitFlags};
pub use config::{BalancingMode, Configuration, HostMode, PlayerBitMatrix};
pub use export::export_unit_results_csv;
pub use result::Result;
pub use result_list::{ClassResult, ResultList};
pub use rng::Rng;
pub use run::{initialize_stats, run_simulation};
pub use runner::{
    default_series_length, run_one, run_series, run_series_parallel, RunOutcome, WorkerPool,
};
pub use setup::{Setup, SortOrder};
pub use unit::{Aggressiveness, Id, PlanetData, ShipData, Unit, UnitKind};
pub use unit_result::{Item, UnitResult};
