//! A simulation setup: the ordered list of ships plus at most one planet.

use serde::{Deserialize, Serialize};

use crate::data::ship_list::PlayerSet;
use crate::sim::battle_order;
use crate::sim::config::HostMode;
use crate::sim::rng::Rng;
use crate::sim::unit::{Id, Unit};

/// Sort orders selectable by the surrounding editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Id,
    Owner,
    Hull,
    BattleOrder(HostMode),
    Name,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    ships: Vec<Unit>,
    planet: Option<Unit>,
}

impl Setup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_ships(&self) -> usize {
        self.ships.len()
    }

    /// Number of unit slots: ships plus the planet if present.
    pub fn num_units(&self) -> usize {
        self.ships.len() + usize::from(self.planet.is_some())
    }

    pub fn ship(&self, slot: usize) -> Option<&Unit> {
        self.ships.get(slot)
    }

    pub fn ship_mut(&mut self, slot: usize) -> Option<&mut Unit> {
        self.ships.get_mut(slot)
    }

    pub fn ships(&self) -> &[Unit] {
        &self.ships
    }

    /// Append a ship. Non-ship units are ignored.
    pub fn add_ship(&mut self, unit: Unit) {
        if unit.is_ship() {
            self.ships.push(unit);
        }
    }

    /// Append a copy of the ship in `slot` under a new Id.
    pub fn duplicate_ship(&mut self, slot: usize, new_id: Id) {
        if let Some(ship) = self.ships.get(slot) {
            let mut copy = ship.clone();
            copy.set_id(new_id);
            self.ships.insert(slot + 1, copy);
        }
    }

    /// Remove the ship in `slot`; out-of-range slots are ignored.
    pub fn remove_ship(&mut self, slot: usize) {
        if slot < self.ships.len() {
            self.ships.remove(slot);
        }
    }

    /// Swap two ship slots; out-of-range slots are ignored.
    pub fn swap_ships(&mut self, a: usize, b: usize) {
        if a < self.ships.len() && b < self.ships.len() {
            self.ships.swap(a, b);
        }
    }

    pub fn has_planet(&self) -> bool {
        self.planet.is_some()
    }

    pub fn planet(&self) -> Option<&Unit> {
        self.planet.as_ref()
    }

    pub fn planet_mut(&mut self) -> Option<&mut Unit> {
        self.planet.as_mut()
    }

    /// Install the planet. Non-planet units are ignored.
    pub fn set_planet(&mut self, unit: Unit) {
        if unit.is_planet() {
            self.planet = Some(unit);
        }
    }

    pub fn remove_planet(&mut self) {
        self.planet = None;
    }

    /// Unit by slot, with the planet occupying the slot past the ships.
    pub fn unit(&self, slot: usize) -> Option<&Unit> {
        if slot < self.ships.len() {
            self.ships.get(slot)
        } else if slot == self.ships.len() {
            self.planet.as_ref()
        } else {
            None
        }
    }

    pub fn find_ship_by_id(&self, id: Id) -> Option<&Unit> {
        self.ships.iter().find(|s| s.id() == id)
    }

    pub fn find_ship_slot_by_id(&self, id: Id) -> Option<usize> {
        self.ships.iter().position(|s| s.id() == id)
    }

    /// Set of non-zero owners over all units.
    pub fn involved_players(&self) -> PlayerSet {
        let mut set: PlayerSet = self.ships.iter().map(|s| s.owner()).collect();
        if let Some(planet) = &self.planet {
            set.insert(planet.owner());
        }
        set
    }

    /// Set of non-zero teams over all units, given a player-to-team mapping.
    pub fn involved_teams(&self, player_team: impl Fn(i32) -> i32) -> PlayerSet {
        self.involved_players()
            .iter()
            .map(player_team)
            .filter(|t| *t != 0)
            .collect()
    }

    /// Stable sort of the ship list by the given key.
    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::Id => self.ships.sort_by_key(Unit::id),
            SortOrder::Owner => self.ships.sort_by_key(Unit::owner),
            SortOrder::Hull => self.ships.sort_by_key(Unit::hull_type),
            SortOrder::Name => self
                .ships
                .sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id()))),
            SortOrder::BattleOrder(mode) => {
                if mode.is_classic() {
                    self.ships.sort_by(battle_order::compare_classic);
                } else {
                    self.ships.sort_by(battle_order::compare_phost);
                }
            }
        }
    }

    /// Reassign random friendly codes on every unit that has them enabled.
    pub fn set_random_friendly_codes(&mut self, rng: &mut Rng) {
        for ship in &mut self.ships {
            ship.set_random_friendly_code(rng);
        }
        if let Some(planet) = &mut self.planet {
            planet.set_random_friendly_code(rng);
        }
    }

    /// Merge dirtiness over all units, clearing the per-unit marks.
    pub fn take_changes(&mut self) -> bool {
        let mut changed = false;
        for ship in &mut self.ships {
            changed |= ship.is_dirty();
            ship.mark_clean();
        }
        if let Some(planet) = &mut self.planet {
            changed |= planet.is_dirty();
            planet.mark_clean();
        }
        changed
    }
}
