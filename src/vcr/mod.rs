//! Playback interface: neutral combat objects, battle records, statistics
//! and the bundled reference player.

pub mod classic;
pub mod database;
pub mod object;
pub mod statistic;

pub use classic::{create_player, Algorithm, Side, CAP_BEAMS, CAP_DEATH_RAY, CAP_EXPERIENCE};
pub use database::{Battle, BattleKind, BattleOutcome, Database, DatabaseHandle};
pub use object::Object;
pub use statistic::Statistic;
