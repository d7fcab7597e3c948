//! Run harness: series drivers over the simulator core.
//!
//! A series executes runs with battle indexes 0..n-1, each on its own clone
//! of the setup with an RNG derived from the master seed, and folds the
//! outcomes into a [ResultList]. The parallel variant distributes the index
//! space over a Rayon pool; aggregation stays sequential, one writer per
//! accumulator.

use log::debug;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::data::host_config::HostConfiguration;
use crate::data::ship_list::ShipList;
use crate::sim::config::{Configuration, HostMode};
use crate::sim::result::Result;
use crate::sim::result_list::ResultList;
use crate::sim::rng::Rng;
use crate::sim::run::run_simulation;
use crate::sim::setup::Setup;
use crate::vcr::statistic::Statistic;

/// Configures how many worker threads are used for parallel series.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the Rayon default (all cores).
    pub workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

impl WorkerPool {
    pub fn default_workers() -> Self {
        Self::default()
    }

    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a pool with this worker count. With
    /// [workers](WorkerPool::workers) at 0, the global Rayon pool is used.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            f()
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .expect("Rayon thread pool");
            pool.install(f)
        }
    }
}

/// Natural series length of the emulated host: the size of its seed space.
pub fn default_series_length(opts: &Configuration) -> i64 {
    match opts.mode() {
        HostMode::NuHost => 118,
        HostMode::Flak => 1,
        _ => 110,
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The mutated setup: post-battle unit states.
    pub setup: Setup,
    /// Out-of-band statistics, one slot per ship plus the planet.
    pub stats: Vec<Statistic>,
    /// Weight/series record and battle database.
    pub result: Result,
}

/// Execute one run of a series on a fresh clone of `base`.
pub fn run_one(
    base: &Setup,
    index: i64,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
    master_seed: u64,
) -> RunOutcome {
    let mut setup = base.clone();
    let mut rng = Rng::new(master_seed.wrapping_add(index as u64));
    let mut stats = Vec::new();
    let mut result = Result::new();
    result.init(opts, index);
    run_simulation(&mut setup, &mut stats, &mut result, opts, list, config, &mut rng);
    RunOutcome {
        setup,
        stats,
        result,
    }
}

/// Execute a series of `count` runs sequentially.
pub fn run_series(
    base: &Setup,
    count: i64,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
    master_seed: u64,
) -> ResultList {
    let mut results = ResultList::new(base);
    for index in 0..count {
        let outcome = run_one(base, index, opts, list, config, master_seed);
        results.add_run(base, &outcome);
    }
    debug!(
        "series of {count} runs complete, cumulative weight {}",
        results.cumulative_weight()
    );
    results
}

/// Execute a series of `count` runs on a worker pool. Outcomes are folded
/// in index order, so the result is identical to [run_series].
pub fn run_series_parallel(
    base: &Setup,
    count: i64,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
    master_seed: u64,
    pool: &WorkerPool,
) -> ResultList {
    let outcomes: Vec<RunOutcome> = pool.install(|| {
        (0..count.max(0) as usize)
            .into_par_iter()
            .map(|index| run_one(base, index as i64, opts, list, config, master_seed))
            .collect()
    });
    let mut results = ResultList::new(base);
    for outcome in &outcomes {
        results.add_run(base, outcome);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::unit::{Aggressiveness, Unit};

    fn armed_ship(id: i32, owner: i32) -> Unit {
        let mut ship = Unit::new_ship();
        ship.set_id(id);
        ship.set_owner(owner);
        ship.set_default_name();
        ship.set_num_beams(5);
        ship.set_beam_type(6);
        ship.set_num_launchers(4);
        ship.set_torpedo_type(7);
        ship.set_ammo(30);
        ship.set_crew(300);
        ship.set_mass(180);
        ship.set_aggressiveness(Aggressiveness::Kill);
        ship
    }

    fn two_ship_setup() -> Setup {
        let mut setup = Setup::new();
        setup.add_ship(armed_ship(1, 2));
        setup.add_ship(armed_ship(2, 3));
        setup
    }

    #[test]
    fn series_is_deterministic() {
        let setup = two_ship_setup();
        let opts = Configuration::default();
        let list = ShipList::with_default_components();
        let config = HostConfiguration::default();

        let a = run_series(&setup, 8, &opts, &list, &config, 42);
        let b = run_series(&setup, 8, &opts, &list, &config, 42);
        assert_eq!(a.num_runs(), b.num_runs());
        assert_eq!(a.cumulative_weight(), b.cumulative_weight());
        for slot in 0..2 {
            let ra = a.unit_result(slot).unwrap();
            let rb = b.unit_result(slot).unwrap();
            assert_eq!(ra.num_fights(), rb.num_fights());
            assert_eq!(ra.damage().min, rb.damage().min);
            assert_eq!(ra.damage().max, rb.damage().max);
            assert_eq!(ra.damage().total_scaled, rb.damage().total_scaled);
        }
    }

    #[test]
    fn parallel_series_matches_sequential() {
        let setup = two_ship_setup();
        let opts = Configuration::default();
        let list = ShipList::with_default_components();
        let config = HostConfiguration::default();

        let sequential = run_series(&setup, 6, &opts, &list, &config, 7);
        let parallel = run_series_parallel(
            &setup,
            6,
            &opts,
            &list,
            &config,
            7,
            &WorkerPool::with_workers(2),
        );
        assert_eq!(sequential.num_runs(), parallel.num_runs());
        assert_eq!(
            sequential.cumulative_weight(),
            parallel.cumulative_weight()
        );
        for slot in 0..2 {
            let rs = sequential.unit_result(slot).unwrap();
            let rp = parallel.unit_result(slot).unwrap();
            assert_eq!(rs.damage().total_scaled, rp.damage().total_scaled);
            assert_eq!(rs.num_fights_won(), rp.num_fights_won());
        }
    }

    #[test]
    fn default_series_lengths() {
        let config = HostConfiguration::default();
        let mut opts = Configuration::default();
        assert_eq!(default_series_length(&opts), 110);
        opts.set_mode(HostMode::NuHost, 0, &config);
        assert_eq!(default_series_length(&opts), 118);
    }
}
