//! Per-slot statistics accumulated across many runs.

use crate::sim::result::Result;
use crate::sim::unit::Unit;
use crate::vcr::database::DatabaseHandle;
use crate::vcr::statistic::Statistic;

/// Statistics counter: minimum, maximum and weighted total, plus shared
/// handles onto the runs that produced the extremes.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub min: i64,
    pub max: i64,
    pub total_scaled: i64,
    pub min_specimen: Option<DatabaseHandle>,
    pub max_specimen: Option<DatabaseHandle>,
}

impl Item {
    /// The result that would have been obtained if every added value `x`
    /// had been `subtract_from - x`. `scale` is the cumulative weight the
    /// original was built with. Used to display e.g. "fighters left" from
    /// "fighters lost".
    pub fn inverted(orig: &Item, subtract_from: i64, scale: i64) -> Item {
        Item {
            min: subtract_from - orig.max,
            max: subtract_from - orig.min,
            total_scaled: subtract_from * scale - orig.total_scaled,
            min_specimen: orig.max_specimen.clone(),
            max_specimen: orig.min_specimen.clone(),
        }
    }

    fn add(&mut self, value: i64, result: &Result) {
        if result.this_battle_index == 0 {
            self.min = value;
            self.max = value;
            self.total_scaled = value * result.this_battle_weight;
            self.min_specimen = result.battles.clone();
            self.max_specimen = result.battles.clone();
        } else {
            if value < self.min {
                self.min = value;
                self.min_specimen = result.battles.clone();
            }
            if value > self.max {
                self.max = value;
                self.max_specimen = result.battles.clone();
            }
            self.total_scaled += value * result.this_battle_weight;
        }
    }

    fn change_weight(&mut self, old_weight: i64, new_weight: i64) {
        self.total_scaled = self.total_scaled * new_weight / old_weight;
    }
}

/// Overall simulation result for one unit slot. Totals are stored relative
/// to the series' total battle weight, which lives in the surrounding
/// result list.
#[derive(Debug, Clone, Default)]
pub struct UnitResult {
    num_fights_won: i32,
    num_fights: i32,
    num_captures: i32,
    num_torpedoes_fired: Item,
    num_fighters_lost: Item,
    damage: Item,
    shield: Item,
    crew_left_or_defense_lost: Item,
    num_torpedo_hits: Item,
    min_fighters_aboard: Item,
}

impl UnitResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_fights_won(&self) -> i32 {
        self.num_fights_won
    }

    pub fn num_fights(&self) -> i32 {
        self.num_fights
    }

    pub fn num_captures(&self) -> i32 {
        self.num_captures
    }

    pub fn num_torpedoes_fired(&self) -> &Item {
        &self.num_torpedoes_fired
    }

    pub fn num_fighters_lost(&self) -> &Item {
        &self.num_fighters_lost
    }

    pub fn damage(&self) -> &Item {
        &self.damage
    }

    pub fn shield(&self) -> &Item {
        &self.shield
    }

    pub fn crew_left_or_defense_lost(&self) -> &Item {
        &self.crew_left_or_defense_lost
    }

    pub fn num_torpedo_hits(&self) -> &Item {
        &self.num_torpedo_hits
    }

    pub fn min_fighters_aboard(&self) -> &Item {
        &self.min_fighters_aboard
    }

    /// Fold one run into this accumulator. The first call of a series must
    /// have `result.this_battle_index == 0`; it seeds the minima and maxima.
    /// Dispatches on the unit kind.
    pub fn add_result(&mut self, old: &Unit, new: &Unit, stat: &Statistic, result: &Result) {
        self.count_outcome(old, new);
        if old.is_planet() {
            self.num_fighters_lost.add(
                i64::from(old.num_base_fighters() - new.num_base_fighters()),
                result,
            );
            self.crew_left_or_defense_lost
                .add(i64::from(old.defense() - new.defense()), result);
        } else {
            if old.num_launchers() != 0 {
                self.num_torpedoes_fired
                    .add(i64::from(old.ammo() - new.ammo()), result);
            }
            if old.num_bays() != 0 {
                self.num_fighters_lost
                    .add(i64::from(old.ammo() - new.ammo()), result);
            }
            self.crew_left_or_defense_lost
                .add(i64::from(new.crew()), result);
        }
        self.damage.add(i64::from(new.damage()), result);
        self.shield.add(i64::from(new.shield()), result);
        self.num_torpedo_hits
            .add(i64::from(stat.num_torpedo_hits()), result);
        self.min_fighters_aboard
            .add(i64::from(stat.min_fighters_aboard()), result);
    }

    fn count_outcome(&mut self, old: &Unit, new: &Unit) {
        self.num_fights += 1;
        if new.owner() == old.owner() {
            self.num_fights_won += 1;
        } else if new.owner() != 0 {
            self.num_captures += 1;
        }
    }

    /// Adjust all counters from `old_weight` to `new_weight` so they remain
    /// comparable to the rest of the series.
    pub fn change_weight(&mut self, old_weight: i64, new_weight: i64) {
        for item in [
            &mut self.num_torpedoes_fired,
            &mut self.num_fighters_lost,
            &mut self.damage,
            &mut self.shield,
            &mut self.crew_left_or_defense_lost,
            &mut self.num_torpedo_hits,
            &mut self.min_fighters_aboard,
        ] {
            item.change_weight(old_weight, new_weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::Configuration;
    use crate::vcr::object::Object;

    fn seeded_result(index: i64) -> Result {
        let mut result = Result::new();
        result.init(&Configuration::default(), index);
        result
    }

    #[test]
    fn torpedo_ship_quantities() {
        let mut old_ship = Unit::new_ship();
        old_ship.set_owner(1);
        old_ship.set_num_launchers(2);
        old_ship.set_ammo(20);
        old_ship.set_damage(3);
        old_ship.set_shield(50);
        old_ship.set_crew(200);

        let mut new_ship = old_ship.clone();
        new_ship.set_ammo(12);
        new_ship.set_damage(5);
        new_ship.set_shield(10);
        new_ship.set_crew(195);

        let mut stat = Statistic::init(&Object::default(), 1);
        for _ in 0..7 {
            stat.handle_torpedo_hit();
        }

        let mut testee = UnitResult::new();
        testee.add_result(&old_ship, &new_ship, &stat, &seeded_result(0));

        assert_eq!(testee.num_fights_won(), 1);
        assert_eq!(testee.num_fights(), 1);
        assert_eq!(testee.num_captures(), 0);
        assert_eq!(testee.num_torpedoes_fired().min, 8);
        assert_eq!(testee.num_torpedoes_fired().max, 8);
        assert_eq!(testee.num_torpedoes_fired().total_scaled, 8);
        assert_eq!(testee.damage().min, 5);
        assert_eq!(testee.shield().min, 10);
        assert_eq!(testee.crew_left_or_defense_lost().min, 195);
        assert_eq!(testee.num_torpedo_hits().min, 7);
    }

    #[test]
    fn captured_carrier_quantities() {
        let mut old_ship = Unit::new_ship();
        old_ship.set_owner(1);
        old_ship.set_num_bays(3);
        old_ship.set_ammo(50);

        let mut new_ship = old_ship.clone();
        new_ship.set_owner(3);
        new_ship.set_ammo(20);
        new_ship.set_damage(5);
        new_ship.set_shield(0);
        new_ship.set_crew(0);

        let mut obj = Object::default();
        obj.num_fighters = 50;
        let mut stat = Statistic::init(&obj, 1);
        stat.handle_fighters_aboard(23);

        let mut testee = UnitResult::new();
        testee.add_result(&old_ship, &new_ship, &stat, &seeded_result(0));

        assert_eq!(testee.num_fights_won(), 0);
        assert_eq!(testee.num_fights(), 1);
        assert_eq!(testee.num_captures(), 1);
        assert_eq!(testee.num_fighters_lost().min, 30);
        assert_eq!(testee.min_fighters_aboard().min, 23);

        // Inversion: "fighters left out of 100".
        assert_eq!(Item::inverted(testee.num_fighters_lost(), 100, 1).max, 70);
    }

    #[test]
    fn planet_quantities() {
        let mut old_planet = Unit::new_planet();
        old_planet.set_owner(1);
        old_planet.set_num_base_fighters(20);
        old_planet.set_damage(3);
        old_planet.set_shield(70);
        old_planet.set_defense(61);

        let mut new_planet = old_planet.clone();
        new_planet.set_num_base_fighters(12);
        new_planet.set_damage(12);
        new_planet.set_shield(20);
        new_planet.set_defense(57);

        let mut obj = Object::default();
        obj.num_fighters = 25;
        let mut stat = Statistic::init(&obj, 1);
        for _ in 0..5 {
            stat.handle_torpedo_hit();
        }

        let mut testee = UnitResult::new();
        testee.add_result(&old_planet, &new_planet, &stat, &seeded_result(0));

        assert_eq!(testee.num_fights_won(), 1);
        assert_eq!(testee.num_captures(), 0);
        assert_eq!(testee.damage().min, 12);
        assert_eq!(testee.damage().max, 12);
        assert_eq!(testee.damage().total_scaled, 12);
        assert_eq!(testee.shield().min, 20);
        assert_eq!(testee.num_fighters_lost().min, 8);
        assert_eq!(testee.crew_left_or_defense_lost().min, 4);
        assert_eq!(testee.num_torpedo_hits().min, 5);
        assert_eq!(testee.min_fighters_aboard().min, 25);
    }

    #[test]
    fn multiple_runs_accumulate() {
        let mut old_ship = Unit::new_ship();
        old_ship.set_damage(3);

        let stat = Statistic::init(&Object::default(), 1);
        let mut testee = UnitResult::new();

        for (index, damage) in [(0, 30), (1, 20), (2, 40)] {
            let mut new_ship = old_ship.clone();
            new_ship.set_damage(damage);
            testee.add_result(&old_ship, &new_ship, &stat, &seeded_result(index));
        }

        assert_eq!(testee.damage().min, 20);
        assert_eq!(testee.damage().max, 40);
        assert_eq!(testee.damage().total_scaled, 90);

        let inverted = Item::inverted(testee.damage(), 100, 1);
        assert_eq!(inverted.max, 80);
        assert_eq!(inverted.min, 60);

        // Weight change scales totals but not extremes.
        testee.change_weight(1, 4);
        assert_eq!(testee.damage().min, 20);
        assert_eq!(testee.damage().max, 40);
        assert_eq!(testee.damage().total_scaled, 360);
    }

    #[test]
    fn inversion_round_trips() {
        let mut old_ship = Unit::new_ship();
        old_ship.set_damage(0);
        let stat = Statistic::init(&Object::default(), 1);
        let mut testee = UnitResult::new();
        for (index, damage) in [(0, 10), (1, 25)] {
            let mut new_ship = old_ship.clone();
            new_ship.set_damage(damage);
            testee.add_result(&old_ship, &new_ship, &stat, &seeded_result(index));
        }
        let once = Item::inverted(testee.damage(), 99, 2);
        let twice = Item::inverted(&once, 99, 2);
        assert_eq!(twice.min, testee.damage().min);
        assert_eq!(twice.max, testee.damage().max);
        assert_eq!(twice.total_scaled, testee.damage().total_scaled);
    }

    #[test]
    fn loss_counts_neither_win_nor_capture() {
        let mut old_ship = Unit::new_ship();
        old_ship.set_owner(4);
        let mut destroyed = old_ship.clone();
        destroyed.set_owner(0);
        let stat = Statistic::init(&Object::default(), 1);
        let mut testee = UnitResult::new();
        testee.add_result(&old_ship, &destroyed, &stat, &seeded_result(0));
        assert_eq!(testee.num_fights(), 1);
        assert_eq!(testee.num_fights_won(), 0);
        assert_eq!(testee.num_captures(), 0);
    }
}
