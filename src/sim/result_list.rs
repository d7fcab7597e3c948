//! Aggregation of many runs: per-unit statistics, outcome classes and
//! weight bookkeeping.
//!
//! Runs of one series may report different total weights (a probabilistic
//! branch taken in one run but not another multiplies the denominator).
//! The list keeps everything relative to the largest total seen so far,
//! rescaling older entries when a heavier run arrives and lighter runs as
//! they are added.

use std::collections::BTreeMap;

use crate::sim::runner::RunOutcome;
use crate::sim::setup::Setup;
use crate::sim::unit_result::UnitResult;
use crate::vcr::database::DatabaseHandle;

/// One outcome class: the same surviving-owner distribution, aggregated
/// over all runs that produced it.
#[derive(Debug, Clone)]
pub struct ClassResult {
    /// Owner id to number of units that player ends the battle with.
    class: BTreeMap<i32, i32>,
    num_runs: i64,
    weight: i64,
    sample: Option<DatabaseHandle>,
}

impl ClassResult {
    pub fn class(&self) -> &BTreeMap<i32, i32> {
        &self.class
    }

    pub fn num_runs(&self) -> i64 {
        self.num_runs
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// A battle database of one run in this class.
    pub fn sample(&self) -> Option<&DatabaseHandle> {
        self.sample.as_ref()
    }

    /// Display label, e.g. `1× (100.0%)`.
    pub fn label(&self, cumulative_weight: i64) -> String {
        let percent = if cumulative_weight > 0 {
            100.0 * self.weight as f64 / cumulative_weight as f64
        } else {
            0.0
        };
        format!("{}\u{d7} ({:.1}%)", self.num_runs, percent)
    }
}

#[derive(Debug, Clone)]
pub struct ResultList {
    /// Reference total weight all entries are stored against.
    total_weight: i64,
    /// Sum of adjusted per-run weights.
    cumulative_weight: i64,
    num_runs: i64,
    unit_results: Vec<UnitResult>,
    class_results: Vec<ClassResult>,
}

impl ResultList {
    /// Create an empty list with one slot per unit of the setup.
    pub fn new(setup: &Setup) -> Self {
        Self {
            total_weight: 1,
            cumulative_weight: 0,
            num_runs: 0,
            unit_results: vec![UnitResult::new(); setup.num_units()],
            class_results: Vec::new(),
        }
    }

    pub fn num_runs(&self) -> i64 {
        self.num_runs
    }

    pub fn total_weight(&self) -> i64 {
        self.total_weight
    }

    pub fn cumulative_weight(&self) -> i64 {
        self.cumulative_weight
    }

    pub fn unit_result(&self, slot: usize) -> Option<&UnitResult> {
        self.unit_results.get(slot)
    }

    pub fn unit_results(&self) -> &[UnitResult] {
        &self.unit_results
    }

    pub fn class_results(&self) -> &[ClassResult] {
        &self.class_results
    }

    /// Fold one run into the list. `old_setup` is the pre-battle state the
    /// run was cloned from; the outcome carries the post-battle state.
    pub fn add_run(&mut self, old_setup: &Setup, outcome: &RunOutcome) {
        let mut result = outcome.result.clone();

        if self.num_runs == 0 {
            self.total_weight = result.total_battle_weight;
        }
        if result.total_battle_weight > self.total_weight {
            // a heavier run arrived; re-base everything accumulated so far
            for unit_result in &mut self.unit_results {
                unit_result.change_weight(self.total_weight, result.total_battle_weight);
            }
            for class_result in &mut self.class_results {
                class_result.weight =
                    class_result.weight * result.total_battle_weight / self.total_weight;
            }
            self.cumulative_weight =
                self.cumulative_weight * result.total_battle_weight / self.total_weight;
            self.total_weight = result.total_battle_weight;
        }
        if result.total_battle_weight < self.total_weight {
            result.change_weight_to(self.total_weight);
        }

        self.cumulative_weight += result.this_battle_weight;
        self.num_runs += 1;

        for slot in 0..self.unit_results.len() {
            if let (Some(old), Some(new)) = (old_setup.unit(slot), outcome.setup.unit(slot)) {
                self.unit_results[slot].add_result(old, new, &outcome.stats[slot], &result);
            }
        }

        let class = surviving_owners(&outcome.setup);
        match self.class_results.iter_mut().find(|c| c.class == class) {
            Some(existing) => {
                existing.num_runs += 1;
                existing.weight += result.this_battle_weight;
            }
            None => self.class_results.push(ClassResult {
                class,
                num_runs: 1,
                weight: result.this_battle_weight,
                sample: result.battles.clone(),
            }),
        }
        self.class_results.sort_by(|a, b| b.weight.cmp(&a.weight));
    }

    /// Re-base all entries to a different total weight, e.g. to compare two
    /// lists built from different option sets.
    pub fn rescale(&mut self, new_weight: i64) {
        if new_weight <= 0 || new_weight == self.total_weight {
            return;
        }
        for unit_result in &mut self.unit_results {
            unit_result.change_weight(self.total_weight, new_weight);
        }
        for class_result in &mut self.class_results {
            class_result.weight = class_result.weight * new_weight / self.total_weight;
        }
        self.cumulative_weight = self.cumulative_weight * new_weight / self.total_weight;
        self.total_weight = new_weight;
    }
}

/// Number of surviving units per owner, the class key.
fn surviving_owners(setup: &Setup) -> BTreeMap<i32, i32> {
    let mut class = BTreeMap::new();
    for slot in 0..setup.num_units() {
        if let Some(unit) = setup.unit(slot) {
            if unit.owner() != 0 {
                *class.entry(unit.owner()).or_insert(0) += 1;
            }
        }
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::result::Result;
    use crate::sim::unit::Unit;
    use crate::vcr::statistic::Statistic;
    use crate::vcr::object::Object;

    fn outcome_with_weight(
        base: &Setup,
        index: i64,
        this_weight: i64,
        total_weight: i64,
    ) -> RunOutcome {
        let mut result = Result::new();
        result.this_battle_index = index;
        result.this_battle_weight = this_weight;
        result.total_battle_weight = total_weight;
        RunOutcome {
            setup: base.clone(),
            stats: vec![Statistic::init(&Object::default(), 0); base.num_units()],
            result,
        }
    }

    fn one_ship_setup(owner: i32) -> Setup {
        let mut setup = Setup::new();
        let mut ship = Unit::new_ship();
        ship.set_owner(owner);
        setup.add_ship(ship);
        setup
    }

    #[test]
    fn single_run_class_label() {
        let setup = one_ship_setup(2);
        let mut list = ResultList::new(&setup);
        list.add_run(&setup, &outcome_with_weight(&setup, 0, 1, 1));

        assert_eq!(list.num_runs(), 1);
        assert_eq!(list.class_results().len(), 1);
        let label = list.class_results()[0].label(list.cumulative_weight());
        assert_eq!(label, "1\u{d7} (100.0%)");
    }

    #[test]
    fn weights_rebase_when_heavier_run_arrives() {
        let setup = one_ship_setup(2);
        let mut list = ResultList::new(&setup);

        // first run: weight 1/1
        list.add_run(&setup, &outcome_with_weight(&setup, 0, 1, 1));
        assert_eq!(list.total_weight(), 1);
        assert_eq!(list.cumulative_weight(), 1);

        // second run took a 59/100 branch
        list.add_run(&setup, &outcome_with_weight(&setup, 1, 59, 100));
        assert_eq!(list.total_weight(), 100);
        assert_eq!(list.cumulative_weight(), 100 + 59);

        // third run, weight 41/100
        list.add_run(&setup, &outcome_with_weight(&setup, 2, 41, 100));
        assert_eq!(list.cumulative_weight(), 200);
    }

    #[test]
    fn distinct_outcomes_build_distinct_classes() {
        let setup = one_ship_setup(2);
        let mut list = ResultList::new(&setup);
        list.add_run(&setup, &outcome_with_weight(&setup, 0, 1, 1));

        let mut destroyed = setup.clone();
        destroyed.ship_mut(0).unwrap().set_owner(0);
        let mut outcome = outcome_with_weight(&setup, 1, 1, 1);
        outcome.setup = destroyed;
        list.add_run(&setup, &outcome);

        assert_eq!(list.class_results().len(), 2);
        let survivor_class = list
            .class_results()
            .iter()
            .find(|c| !c.class().is_empty())
            .unwrap();
        assert_eq!(survivor_class.class().get(&2), Some(&1));
        assert_eq!(survivor_class.label(list.cumulative_weight()), "1\u{d7} (50.0%)");
    }

    #[test]
    fn rescale_keeps_proportions() {
        let setup = one_ship_setup(2);
        let mut list = ResultList::new(&setup);
        list.add_run(&setup, &outcome_with_weight(&setup, 0, 1, 1));
        let damage_before = list.unit_result(0).unwrap().damage().total_scaled;

        list.rescale(10);
        assert_eq!(list.total_weight(), 10);
        assert_eq!(list.cumulative_weight(), 10);
        assert_eq!(
            list.unit_result(0).unwrap().damage().total_scaled,
            damage_before * 10
        );
    }
}
