//! Simulation units: ships and planets.
//!
//! A [Unit] carries the common editable header (id, name, friendly code,
//! damage, shield, owner, experience, flag word, rating overrides) plus a
//! tagged per-kind payload. Ship-only or planet-only operations dispatch on
//! the payload; calls on the wrong kind are ignored so UI edit races stay
//! harmless. Units never hold references to the environment; the ship list
//! and host configuration are parameters to every operation that needs them.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::data::host_config::HostConfiguration;
use crate::data::ship_list::ShipList;
use crate::sim::ability::{Ability, AbilitySet, UnitFlags};
use crate::sim::config::{Configuration, HostMode};
use crate::sim::rng::Rng;
use crate::NUM_TORPEDO_TYPES;

pub type Id = i32;

/// Maximum weapon count on a custom (hull 0) ship.
const CUSTOM_WEAPON_LIMIT: i32 = 20;

/// Ship aggressiveness: a small tagged value combining the three special
/// states with "primary enemy is player N".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggressiveness {
    Passive,
    Kill,
    NoFuel,
    PrimaryEnemy(i32),
}

impl Aggressiveness {
    pub fn is_primary_enemy(self) -> bool {
        matches!(self, Aggressiveness::PrimaryEnemy(p) if p >= 1)
    }

    /// Primary-enemy player id, 0 otherwise.
    pub fn primary_enemy(self) -> i32 {
        match self {
            Aggressiveness::PrimaryEnemy(p) => p,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipData {
    pub crew: i32,
    pub hull_type: i32,
    pub mass: i32,
    pub beam_type: i32,
    pub num_beams: i32,
    pub torpedo_type: i32,
    pub num_launchers: i32,
    pub num_bays: i32,
    pub ammo: i32,
    pub engine_type: i32,
    pub aggressiveness: Aggressiveness,
    pub intercept_id: Id,
}

impl Default for ShipData {
    fn default() -> Self {
        Self {
            crew: 10,
            hull_type: 0,
            mass: 100,
            beam_type: 0,
            num_beams: 0,
            torpedo_type: 0,
            num_launchers: 0,
            num_bays: 0,
            ammo: 0,
            engine_type: 1,
            aggressiveness: Aggressiveness::Passive,
            intercept_id: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetData {
    pub defense: i32,
    pub base_defense: i32,
    pub base_damage: i32,
    /// Starbase beam tech; 0 means no starbase.
    pub base_beam_tech: i32,
    pub base_torpedo_tech: i32,
    pub base_fighters: i32,
    pub base_torpedoes: [i32; NUM_TORPEDO_TYPES],
}

impl Default for PlanetData {
    fn default() -> Self {
        Self {
            defense: 10,
            base_defense: 10,
            base_damage: 0,
            base_beam_tech: 0,
            base_torpedo_tech: 1,
            base_fighters: 0,
            base_torpedoes: [0; NUM_TORPEDO_TYPES],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    Ship(ShipData),
    Planet(PlanetData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    id: Id,
    name: String,
    friendly_code: String,
    damage: i32,
    shield: i32,
    owner: i32,
    experience_level: i32,
    flags: UnitFlags,
    flak_rating_override: i32,
    flak_compensation_override: i32,
    #[serde(skip)]
    changed: bool,
    kind: UnitKind,
}

impl Unit {
    fn new(kind: UnitKind) -> Self {
        Self {
            id: 1,
            name: "?".to_string(),
            friendly_code: "???".to_string(),
            damage: 0,
            shield: 100,
            owner: 12,
            experience_level: 0,
            flags: UnitFlags::empty(),
            flak_rating_override: 0,
            flak_compensation_override: 0,
            changed: false,
            kind,
        }
    }

    pub fn new_ship() -> Self {
        Self::new(UnitKind::Ship(ShipData::default()))
    }

    pub fn new_planet() -> Self {
        Self::new(UnitKind::Planet(PlanetData::default()))
    }

    pub fn kind(&self) -> &UnitKind {
        &self.kind
    }

    pub fn is_ship(&self) -> bool {
        matches!(self.kind, UnitKind::Ship(_))
    }

    pub fn is_planet(&self) -> bool {
        matches!(self.kind, UnitKind::Planet(_))
    }

    fn ship(&self) -> Option<&ShipData> {
        match &self.kind {
            UnitKind::Ship(data) => Some(data),
            UnitKind::Planet(_) => None,
        }
    }

    fn planet(&self) -> Option<&PlanetData> {
        match &self.kind {
            UnitKind::Planet(data) => Some(data),
            UnitKind::Ship(_) => None,
        }
    }

    // Common attributes.

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn set_id(&mut self, id: Id) {
        self.id = id;
        self.mark_dirty();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.mark_dirty();
    }

    /// Default ship name derived from the Id.
    pub fn set_default_name(&mut self) {
        self.set_name(format!("Ship {}", self.id));
    }

    pub fn has_default_name(&self) -> bool {
        self.name == format!("Ship {}", self.id)
    }

    pub fn friendly_code(&self) -> &str {
        &self.friendly_code
    }

    pub fn set_friendly_code(&mut self, code: impl Into<String>) {
        self.friendly_code = code.into();
        self.mark_dirty();
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn set_damage(&mut self, damage: i32) {
        self.damage = damage;
        self.mark_dirty();
    }

    pub fn shield(&self) -> i32 {
        self.shield
    }

    pub fn set_shield(&mut self, shield: i32) {
        self.shield = shield;
        self.mark_dirty();
    }

    pub fn owner(&self) -> i32 {
        self.owner
    }

    pub fn set_owner(&mut self, owner: i32) {
        self.owner = owner;
        self.mark_dirty();
    }

    pub fn experience_level(&self) -> i32 {
        self.experience_level
    }

    pub fn set_experience_level(&mut self, level: i32) {
        self.experience_level = level;
        self.mark_dirty();
    }

    pub fn flags(&self) -> UnitFlags {
        self.flags
    }

    /// Replace the flag word. Cloaking a ship cancels Kill aggressiveness
    /// and any intercept order.
    pub fn set_flags(&mut self, flags: UnitFlags) {
        let newly_cloaked = flags.contains(UnitFlags::CLOAKED)
            && !self.flags.contains(UnitFlags::CLOAKED);
        self.flags = flags;
        if newly_cloaked {
            if let UnitKind::Ship(ship) = &mut self.kind {
                if ship.aggressiveness == Aggressiveness::Kill {
                    ship.aggressiveness = Aggressiveness::Passive;
                }
                ship.intercept_id = 0;
            }
        }
        self.mark_dirty();
    }

    pub fn has_flag(&self, flag: UnitFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn flak_rating_override(&self) -> i32 {
        self.flak_rating_override
    }

    pub fn set_flak_rating_override(&mut self, rating: i32) {
        self.flak_rating_override = rating;
        self.mark_dirty();
    }

    pub fn flak_compensation_override(&self) -> i32 {
        self.flak_compensation_override
    }

    pub fn set_flak_compensation_override(&mut self, compensation: i32) {
        self.flak_compensation_override = compensation;
        self.mark_dirty();
    }

    // Random friendly code.

    /// Assign a random friendly code if enabled. Considers the digit
    /// selector flags; with none set, all three places are randomized.
    /// Positions beyond the current code length are padded with spaces.
    pub fn set_random_friendly_code(&mut self, rng: &mut Rng) {
        if !self.flags.contains(UnitFlags::RANDOM_FC) {
            return;
        }
        let mut which = self.flags & UnitFlags::RANDOM_DIGITS;
        if which.is_empty() {
            which = UnitFlags::RANDOM_DIGITS;
        }
        let mut chars: Vec<char> = self.friendly_code.chars().collect();
        for place in 0..3 {
            if chars.len() <= place {
                chars.push(' ');
            }
            let bit = UnitFlags::from_bits_retain(UnitFlags::RANDOM_FC1.bits() << place);
            if which.contains(bit) {
                chars[place] = char::from(b'0' + rng.next(10) as u8);
            }
        }
        self.friendly_code = chars.into_iter().collect();
        self.mark_dirty();
    }

    /// Derive the randomisation flags from the current friendly code: each
    /// `#` place selects its digit flag. Returns whether randomisation is
    /// now enabled.
    pub fn set_random_friendly_code_flags(&mut self) -> bool {
        let mut new_flags = self.flags - (UnitFlags::RANDOM_FC | UnitFlags::RANDOM_DIGITS);
        for (place, ch) in self.friendly_code.chars().take(3).enumerate() {
            if ch == '#' {
                new_flags |= UnitFlags::from_bits_retain(UnitFlags::RANDOM_FC1.bits() << place);
            }
        }
        if new_flags.intersects(UnitFlags::RANDOM_DIGITS) {
            new_flags |= UnitFlags::RANDOM_FC;
        }
        self.set_flags(new_flags);
        new_flags.contains(UnitFlags::RANDOM_FC)
    }

    // Abilities.

    /// Effective state of an ability: the explicit value when the set bit is
    /// present, the race/host-rule implication otherwise.
    pub fn has_ability(
        &self,
        ability: Ability,
        opts: &Configuration,
        list: &ShipList,
        config: &HostConfiguration,
    ) -> bool {
        if self.flags.contains(ability.set_bit()) {
            self.flags.contains(ability.value_bit())
        } else {
            self.has_implied_ability(ability, opts, list, config)
        }
    }

    fn has_implied_ability(
        &self,
        ability: Ability,
        opts: &Configuration,
        list: &ShipList,
        config: &HostConfiguration,
    ) -> bool {
        let race = config.player_race_number(self.owner);
        match &self.kind {
            UnitKind::Planet(_) => match ability {
                Ability::TripleBeamKill => race == 5,
                Ability::DoubleBeamCharge => opts.mode() == HostMode::NuHost && race == 4,
                _ => false,
            },
            UnitKind::Ship(ship) => {
                let from_race = match ability {
                    Ability::FullWeaponry => race == 1,
                    Ability::PlanetImmunity => {
                        (race == 4 && !config.planets_attack_klingons)
                            || (race == 10 && !config.planets_attack_rebels)
                    }
                    Ability::TripleBeamKill => race == 5,
                    Ability::DoubleBeamCharge => opts.mode() == HostMode::NuHost && race == 4,
                    _ => false,
                };
                from_race
                    || list
                        .hull(ship.hull_type)
                        .is_some_and(|h| h.has_function(ability, self.owner))
            }
        }
    }

    /// Set of all effective abilities.
    pub fn abilities(
        &self,
        opts: &Configuration,
        list: &ShipList,
        config: &HostConfiguration,
    ) -> AbilitySet {
        Ability::ALL
            .into_iter()
            .filter(|a| self.has_ability(*a, opts, list, config))
            .collect()
    }

    /// Whether any ability carries an explicit value.
    pub fn has_any_nonstandard_ability(&self) -> bool {
        self.flags.intersects(UnitFlags::FUNCTION_SET_BITS)
    }

    // Dirtiness.

    pub fn mark_dirty(&mut self) {
        self.changed = true;
    }

    pub fn mark_clean(&mut self) {
        self.changed = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.changed
    }

    // Ship attributes. Getters yield the neutral value on a planet; setters
    // on the wrong kind are ignored.

    pub fn crew(&self) -> i32 {
        self.ship().map_or(0, |s| s.crew)
    }

    pub fn set_crew(&mut self, crew: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.crew != crew {
                ship.crew = crew;
                self.changed = true;
            }
        }
    }

    pub fn hull_type(&self) -> i32 {
        self.ship().map_or(0, |s| s.hull_type)
    }

    /// Set the hull type and load the hull's caps: weapon counts, best
    /// weapon types, cargo as ammunition, crew and mass.
    pub fn set_hull_type(&mut self, hull_type: i32, list: &ShipList) {
        let hull = list.hull(hull_type).cloned();
        let best_beam = list.num_beam_types();
        let best_torpedo = list.num_torpedo_types();
        if let UnitKind::Ship(ship) = &mut self.kind {
            ship.hull_type = hull_type;
            if let Some(hull) = hull {
                ship.mass = hull.mass;
                ship.crew = hull.max_crew;
                ship.num_beams = hull.max_beams;
                ship.beam_type = if hull.max_beams > 0 { best_beam } else { 0 };
                if hull.num_bays > 0 {
                    ship.num_bays = hull.num_bays;
                    ship.num_launchers = 0;
                    ship.torpedo_type = 0;
                    ship.ammo = hull.max_cargo;
                } else if hull.max_launchers > 0 {
                    ship.num_bays = 0;
                    ship.num_launchers = hull.max_launchers;
                    ship.torpedo_type = best_torpedo;
                    ship.ammo = hull.max_cargo;
                } else {
                    ship.num_bays = 0;
                    ship.num_launchers = 0;
                    ship.torpedo_type = 0;
                    ship.ammo = 0;
                }
            }
            self.changed = true;
        }
    }

    /// Set the hull type field without touching the loadout.
    pub fn set_hull_type_only(&mut self, hull_type: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.hull_type != hull_type {
                ship.hull_type = hull_type;
                self.changed = true;
            }
        }
    }

    pub fn is_custom_ship(&self) -> bool {
        self.ship().is_some_and(|s| s.hull_type == 0)
    }

    pub fn mass(&self) -> i32 {
        self.ship().map_or(0, |s| s.mass)
    }

    pub fn set_mass(&mut self, mass: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.mass != mass {
                ship.mass = mass;
                self.changed = true;
            }
        }
    }

    pub fn beam_type(&self) -> i32 {
        self.ship().map_or(0, |s| s.beam_type)
    }

    pub fn set_beam_type(&mut self, beam_type: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.beam_type != beam_type {
                ship.beam_type = beam_type;
                self.changed = true;
            }
        }
    }

    pub fn num_beams(&self) -> i32 {
        self.ship().map_or(0, |s| s.num_beams)
    }

    pub fn set_num_beams(&mut self, num_beams: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.num_beams != num_beams {
                ship.num_beams = num_beams;
                self.changed = true;
            }
        }
    }

    pub fn torpedo_type(&self) -> i32 {
        self.ship().map_or(0, |s| s.torpedo_type)
    }

    pub fn set_torpedo_type(&mut self, torpedo_type: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.torpedo_type != torpedo_type {
                ship.torpedo_type = torpedo_type;
                self.changed = true;
            }
        }
    }

    pub fn num_launchers(&self) -> i32 {
        self.ship().map_or(0, |s| s.num_launchers)
    }

    pub fn set_num_launchers(&mut self, num_launchers: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.num_launchers != num_launchers {
                ship.num_launchers = num_launchers;
                self.changed = true;
            }
        }
    }

    pub fn num_bays(&self) -> i32 {
        self.ship().map_or(0, |s| s.num_bays)
    }

    pub fn set_num_bays(&mut self, num_bays: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.num_bays != num_bays {
                ship.num_bays = num_bays;
                self.changed = true;
            }
        }
    }

    pub fn ammo(&self) -> i32 {
        self.ship().map_or(0, |s| s.ammo)
    }

    pub fn set_ammo(&mut self, ammo: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.ammo != ammo {
                ship.ammo = ammo;
                self.changed = true;
            }
        }
    }

    pub fn engine_type(&self) -> i32 {
        self.ship().map_or(0, |s| s.engine_type)
    }

    pub fn set_engine_type(&mut self, engine_type: i32) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            if ship.engine_type != engine_type {
                ship.engine_type = engine_type;
                self.changed = true;
            }
        }
    }

    pub fn aggressiveness(&self) -> Aggressiveness {
        self.ship()
            .map_or(Aggressiveness::Passive, |s| s.aggressiveness)
    }

    pub fn set_aggressiveness(&mut self, aggressiveness: Aggressiveness) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            ship.aggressiveness = aggressiveness;
            self.changed = true;
        }
    }

    pub fn intercept_id(&self) -> Id {
        self.ship().map_or(0, |s| s.intercept_id)
    }

    /// Order an intercept attack. A non-zero target uncloaks the ship.
    pub fn set_intercept_id(&mut self, target: Id) {
        if let UnitKind::Ship(ship) = &mut self.kind {
            ship.intercept_id = target;
            if target != 0 {
                self.flags -= UnitFlags::CLOAKED;
            }
            self.changed = true;
        }
    }

    /// Whether the ship carries any weapon.
    pub fn is_armed(&self) -> bool {
        self.num_beams() != 0 || self.num_launchers() != 0 || self.num_bays() != 0
    }

    /// Permitted beam count range for this ship under the given list.
    pub fn num_beams_range(&self, list: &ShipList) -> RangeInclusive<i32> {
        match self.ship() {
            Some(ship) if ship.hull_type == 0 => 0..=CUSTOM_WEAPON_LIMIT,
            Some(ship) => match list.hull(ship.hull_type) {
                Some(hull) => 0..=hull.max_beams,
                None => 0..=0,
            },
            None => 0..=0,
        }
    }

    /// Permitted launcher count range for this ship under the given list.
    pub fn num_launchers_range(&self, list: &ShipList) -> RangeInclusive<i32> {
        match self.ship() {
            Some(ship) if ship.hull_type == 0 => 0..=CUSTOM_WEAPON_LIMIT,
            Some(ship) => match list.hull(ship.hull_type) {
                Some(hull) => 0..=hull.max_launchers,
                None => 0..=0,
            },
            None => 0..=0,
        }
    }

    /// Permitted bay count range. A listed hull fixes the bay count exactly.
    pub fn num_bays_range(&self, list: &ShipList) -> RangeInclusive<i32> {
        match self.ship() {
            Some(ship) if ship.hull_type == 0 => 0..=CUSTOM_WEAPON_LIMIT,
            Some(ship) => match list.hull(ship.hull_type) {
                Some(hull) => hull.num_bays..=hull.num_bays,
                None => 0..=0,
            },
            None => 0..=0,
        }
    }

    /// Whether this ship's loadout is consistent with the ship list: the
    /// hull exists and beam count, launcher count, bay count and ammunition
    /// stay within the hull's caps. Custom ships always match.
    pub fn is_matching_ship_list(&self, list: &ShipList) -> bool {
        let Some(ship) = self.ship() else {
            return false;
        };
        if ship.hull_type == 0 {
            return true;
        }
        let Some(hull) = list.hull(ship.hull_type) else {
            return false;
        };
        ship.num_beams <= hull.max_beams
            && ship.num_launchers <= hull.max_launchers
            && ship.num_bays == hull.num_bays
            && ship.ammo <= hull.max_cargo
    }

    /// Mass the playback engine will see before per-fight modifiers:
    /// hull/explicit mass plus engine-shield bonus and the Fed bonus.
    pub fn effective_mass(
        &self,
        opts: &Configuration,
        list: &ShipList,
        config: &HostConfiguration,
    ) -> i32 {
        let Some(ship) = self.ship() else {
            return 0;
        };
        let mut mass = ship.mass;
        let esb = opts.engine_shield_bonus();
        if esb != 0 {
            if let Some(engine) = list.engine(ship.engine_type) {
                mass += (i64::from(esb) * i64::from(engine.cost) / 100) as i32;
            }
        }
        if config.player_race_number(self.owner) == 1 && opts.has_scotty_bonus() {
            mass += 50;
        }
        mass
    }

    // Planet attributes.

    pub fn defense(&self) -> i32 {
        self.planet().map_or(0, |p| p.defense)
    }

    pub fn set_defense(&mut self, defense: i32) {
        if let UnitKind::Planet(planet) = &mut self.kind {
            if planet.defense != defense {
                planet.defense = defense;
                self.changed = true;
            }
        }
    }

    pub fn base_defense(&self) -> i32 {
        self.planet().map_or(0, |p| p.base_defense)
    }

    pub fn set_base_defense(&mut self, base_defense: i32) {
        if let UnitKind::Planet(planet) = &mut self.kind {
            if planet.base_defense != base_defense {
                planet.base_defense = base_defense;
                self.changed = true;
            }
        }
    }

    pub fn base_damage(&self) -> i32 {
        self.planet().map_or(0, |p| p.base_damage)
    }

    pub fn set_base_damage(&mut self, base_damage: i32) {
        if let UnitKind::Planet(planet) = &mut self.kind {
            if planet.base_damage != base_damage {
                planet.base_damage = base_damage;
                self.changed = true;
            }
        }
    }

    pub fn base_beam_tech(&self) -> i32 {
        self.planet().map_or(0, |p| p.base_beam_tech)
    }

    pub fn set_base_beam_tech(&mut self, tech: i32) {
        if let UnitKind::Planet(planet) = &mut self.kind {
            if planet.base_beam_tech != tech {
                planet.base_beam_tech = tech;
                self.changed = true;
            }
        }
    }

    pub fn base_torpedo_tech(&self) -> i32 {
        self.planet().map_or(0, |p| p.base_torpedo_tech)
    }

    pub fn set_base_torpedo_tech(&mut self, tech: i32) {
        if let UnitKind::Planet(planet) = &mut self.kind {
            if planet.base_torpedo_tech != tech {
                planet.base_torpedo_tech = tech;
                self.changed = true;
            }
        }
    }

    pub fn num_base_fighters(&self) -> i32 {
        self.planet().map_or(0, |p| p.base_fighters)
    }

    pub fn set_num_base_fighters(&mut self, fighters: i32) {
        if let UnitKind::Planet(planet) = &mut self.kind {
            if planet.base_fighters != fighters {
                planet.base_fighters = fighters;
                self.changed = true;
            }
        }
    }

    /// Whether a starbase is present (base beam tech above zero).
    pub fn has_base(&self) -> bool {
        self.base_beam_tech() > 0
    }

    /// Stored starbase torpedoes of one type; 0 for out-of-range types.
    pub fn num_base_torpedoes(&self, torpedo_type: i32) -> i32 {
        match self.planet() {
            Some(planet) if (1..=NUM_TORPEDO_TYPES as i32).contains(&torpedo_type) => {
                planet.base_torpedoes[(torpedo_type - 1) as usize]
            }
            _ => 0,
        }
    }

    /// Set stored starbase torpedoes of one type; out-of-range types are
    /// ignored.
    pub fn set_num_base_torpedoes(&mut self, torpedo_type: i32, amount: i32) {
        if !(1..=NUM_TORPEDO_TYPES as i32).contains(&torpedo_type) {
            return;
        }
        if let UnitKind::Planet(planet) = &mut self.kind {
            let slot = (torpedo_type - 1) as usize;
            if planet.base_torpedoes[slot] != amount {
                planet.base_torpedoes[slot] = amount;
                self.changed = true;
            }
        }
    }

    /// Total starbase torpedo stock converted into one type by money cost.
    pub fn num_base_torpedoes_as_type(&self, torpedo_type: i32, list: &ShipList) -> i32 {
        let mut total_cost: i64 = 0;
        for i in 1..=NUM_TORPEDO_TYPES as i32 {
            if let Some(launcher) = list.launcher(i) {
                total_cost += i64::from(self.num_base_torpedoes(i)) * i64::from(launcher.torpedo_cost);
            }
        }
        if let Some(launcher) = list.launcher(torpedo_type) {
            if launcher.torpedo_cost != 0 {
                total_cost /= i64::from(launcher.torpedo_cost);
            }
        }
        total_cost as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ship_list::{Hull, HullFunction};

    fn test_list() -> ShipList {
        let mut list = ShipList::with_default_components();
        list.hulls.push(Hull {
            id: 1,
            name: "Carrier".into(),
            mass: 2000,
            max_beams: 15,
            max_launchers: 0,
            num_bays: 5,
            max_cargo: 80,
            max_crew: 50,
            num_engines: 2,
            picture: 10,
            functions: vec![HullFunction {
                ability: Ability::Commander,
                players: [9].into_iter().collect(),
            }],
        });
        list.hulls.push(Hull {
            id: 2,
            name: "Cruiser".into(),
            mass: 3000,
            max_beams: 5,
            max_launchers: 10,
            num_bays: 0,
            max_cargo: 120,
            max_crew: 75,
            num_engines: 3,
            picture: 11,
            functions: Vec::new(),
        });
        list
    }

    #[test]
    fn ship_defaults() {
        let ship = Unit::new_ship();
        assert_eq!(ship.id(), 1);
        assert_eq!(ship.name(), "?");
        assert_eq!(ship.friendly_code(), "???");
        assert_eq!(ship.damage(), 0);
        assert_eq!(ship.shield(), 100);
        assert_eq!(ship.owner(), 12);
        assert_eq!(ship.crew(), 10);
        assert_eq!(ship.hull_type(), 0);
        assert_eq!(ship.mass(), 100);
        assert_eq!(ship.engine_type(), 1);
        assert_eq!(ship.aggressiveness(), Aggressiveness::Passive);
        assert_eq!(ship.intercept_id(), 0);
        assert!(ship.is_custom_ship());
        assert!(!ship.is_dirty());
    }

    #[test]
    fn setters_mark_dirty() {
        let mut ship = Unit::new_ship();
        ship.mark_clean();
        ship.set_crew(42);
        assert_eq!(ship.crew(), 42);
        assert!(ship.is_dirty());

        ship.mark_clean();
        ship.set_num_beams(9);
        assert!(ship.is_dirty());

        // Repeated store of the same value is not a change.
        ship.mark_clean();
        ship.set_num_beams(9);
        assert!(!ship.is_dirty());
    }

    #[test]
    fn planet_ops_on_ship_are_ignored() {
        let mut ship = Unit::new_ship();
        ship.mark_clean();
        ship.set_defense(100);
        ship.set_num_base_torpedoes(3, 50);
        assert_eq!(ship.defense(), 0);
        assert_eq!(ship.num_base_torpedoes(3), 0);
        assert!(!ship.is_dirty());
    }

    #[test]
    fn default_name_tracks_id() {
        let mut ship = Unit::new_ship();
        ship.set_id(77);
        ship.set_default_name();
        assert!(ship.has_default_name());
        ship.set_id(42);
        assert!(!ship.has_default_name());
        ship.set_default_name();
        assert!(ship.has_default_name());
    }

    #[test]
    fn hull_type_loads_caps() {
        let list = test_list();
        let mut ship = Unit::new_ship();
        ship.set_hull_type(2, &list);
        assert_eq!(ship.hull_type(), 2);
        assert_eq!(ship.ammo(), 120);
        assert_eq!(ship.num_bays(), 0);
        assert_eq!(ship.num_launchers(), 10);
        assert_eq!(ship.num_beams(), 5);
        assert_eq!(ship.torpedo_type(), 10);
        assert_eq!(ship.beam_type(), 10);
        assert_eq!(ship.mass(), 3000);
        assert_eq!(ship.engine_type(), 1);
        assert!(ship.is_matching_ship_list(&list));
        assert_eq!(ship.num_beams_range(&list), 0..=5);
        assert_eq!(ship.num_launchers_range(&list), 0..=10);
        assert_eq!(ship.num_bays_range(&list), 0..=0);

        ship.set_hull_type(1, &list);
        assert_eq!(ship.ammo(), 80);
        assert_eq!(ship.num_bays(), 5);
        assert_eq!(ship.num_launchers(), 0);
        assert_eq!(ship.num_beams(), 15);
        assert_eq!(ship.torpedo_type(), 0);
        assert_eq!(ship.mass(), 2000);
        assert_eq!(ship.num_bays_range(&list), 5..=5);
        assert!(ship.is_matching_ship_list(&list));
    }

    #[test]
    fn ship_list_matching() {
        let list = test_list();
        let mut ship = Unit::new_ship();
        ship.set_hull_type(2, &list);

        ship.set_num_beams(6);
        assert!(!ship.is_matching_ship_list(&list));
        ship.set_num_beams(5);
        assert!(ship.is_matching_ship_list(&list));

        ship.set_num_launchers(11);
        assert!(!ship.is_matching_ship_list(&list));
        ship.set_num_launchers(10);

        ship.set_ammo(121);
        assert!(!ship.is_matching_ship_list(&list));
        ship.set_ammo(120);
        assert!(ship.is_matching_ship_list(&list));

        // Carrier hull fixes the bay count exactly.
        ship.set_hull_type(1, &list);
        ship.set_num_bays(0);
        assert!(!ship.is_matching_ship_list(&list));
        ship.set_num_bays(5);
        assert!(ship.is_matching_ship_list(&list));

        // Unknown hull never matches; custom always does.
        ship.set_hull_type(3, &list);
        assert!(!ship.is_matching_ship_list(&list));
        assert_eq!(ship.num_beams_range(&list), 0..=0);
        ship.set_hull_type(0, &list);
        assert!(ship.is_matching_ship_list(&list));
        assert_eq!(ship.num_beams_range(&list), 0..=20);
    }

    #[test]
    fn effective_mass_applies_bonuses() {
        let list = test_list();
        let config = HostConfiguration::default();
        let mut opts = Configuration::default();
        opts.set_engine_shield_bonus(20);

        let mut ship = Unit::new_ship();
        ship.set_hull_type(2, &list);
        assert_eq!(ship.effective_mass(&opts, &list, &config), 3020);

        opts.set_engine_shield_bonus(0);
        assert_eq!(ship.effective_mass(&opts, &list, &config), 3000);

        ship.set_owner(1);
        assert_eq!(ship.effective_mass(&opts, &list, &config), 3050);
    }

    #[test]
    fn implied_abilities_follow_race_and_hull_functions() {
        let list = test_list();
        let config = HostConfiguration::default();
        let opts = Configuration::default();
        let mut nu_opts = Configuration::default();
        nu_opts.set_mode(HostMode::NuHost, 0, &config);

        let mut ship = Unit::new_ship();
        ship.set_hull_type(1, &list);

        ship.set_owner(1);
        assert!(!ship.has_any_nonstandard_ability());
        assert!(ship.has_ability(Ability::FullWeaponry, &opts, &list, &config));
        assert!(!ship.has_ability(Ability::PlanetImmunity, &opts, &list, &config));
        assert!(!ship.has_ability(Ability::Commander, &opts, &list, &config));

        ship.set_owner(4);
        assert!(ship.has_ability(Ability::PlanetImmunity, &opts, &list, &config));
        assert!(!ship.has_ability(Ability::DoubleBeamCharge, &opts, &list, &config));
        assert!(ship.has_ability(Ability::DoubleBeamCharge, &nu_opts, &list, &config));

        ship.set_owner(5);
        assert!(ship.has_ability(Ability::TripleBeamKill, &opts, &list, &config));

        ship.set_owner(9);
        assert!(ship.has_ability(Ability::Commander, &opts, &list, &config));
        let set = ship.abilities(&opts, &list, &config);
        assert!(set.contains(Ability::Commander));
        assert!(!set.contains(Ability::FullWeaponry));
    }

    #[test]
    fn explicit_ability_bits_override_implication() {
        let list = test_list();
        let config = HostConfiguration::default();
        let opts = Configuration::default();

        let mut ship = Unit::new_ship();
        ship.set_owner(5);
        // Race 5 implies triple beam kill; the explicit off value wins.
        ship.set_flags(UnitFlags::TRIPLE_BEAM_KILL_SET);
        assert!(!ship.has_ability(Ability::TripleBeamKill, &opts, &list, &config));
        assert!(ship.has_any_nonstandard_ability());

        ship.set_flags(UnitFlags::SQUADRON_SET | UnitFlags::SQUADRON);
        assert!(ship.has_ability(Ability::Squadron, &opts, &list, &config));
    }

    #[test]
    fn random_fcode_flags_derive_from_hashes() {
        let mut ship = Unit::new_ship();
        ship.set_friendly_code("a#c");
        assert!(ship.set_random_friendly_code_flags());
        assert!(ship.has_flag(UnitFlags::RANDOM_FC));
        assert!(ship.has_flag(UnitFlags::RANDOM_FC2));
        assert!(!ship.has_flag(UnitFlags::RANDOM_FC1));
        assert!(!ship.has_flag(UnitFlags::RANDOM_FC3));

        // Idempotent for the same code.
        assert!(ship.set_random_friendly_code_flags());
        assert!(ship.has_flag(UnitFlags::RANDOM_FC2));
        assert!(!ship.has_flag(UnitFlags::RANDOM_FC1));

        ship.set_friendly_code("abc");
        assert!(!ship.set_random_friendly_code_flags());
        assert!(!ship.has_flag(UnitFlags::RANDOM_FC));
    }

    #[test]
    fn random_fcode_rewrites_selected_places() {
        let mut ship = Unit::new_ship();
        let mut rng = Rng::new(12);

        // Disabled: nothing happens.
        ship.set_friendly_code("abc");
        ship.set_random_friendly_code(&mut rng);
        assert_eq!(ship.friendly_code(), "abc");

        ship.set_friendly_code("x#z");
        ship.set_random_friendly_code_flags();
        ship.set_random_friendly_code(&mut rng);
        let code: Vec<char> = ship.friendly_code().chars().collect();
        assert_eq!(code.len(), 3);
        assert_eq!(code[0], 'x');
        assert!(code[1].is_ascii_digit());
        assert_eq!(code[2], 'z');

        // No digit selector set: all three places are randomized.
        let mut all = Unit::new_ship();
        all.set_friendly_code("ab");
        all.set_flags(UnitFlags::RANDOM_FC);
        all.set_random_friendly_code(&mut rng);
        assert_eq!(all.friendly_code().len(), 3);
        assert!(all.friendly_code().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn cloak_and_intercept_interact() {
        let mut ship = Unit::new_ship();
        ship.set_aggressiveness(Aggressiveness::Kill);
        ship.set_intercept_id(815);
        assert_eq!(ship.intercept_id(), 815);

        ship.set_flags(UnitFlags::CLOAKED);
        assert_eq!(ship.aggressiveness(), Aggressiveness::Passive);
        assert_eq!(ship.intercept_id(), 0);

        ship.set_intercept_id(99);
        assert!(!ship.has_flag(UnitFlags::CLOAKED));
    }

    #[test]
    fn planet_base_torpedoes() {
        let list = ShipList::with_default_components();
        let mut planet = Unit::new_planet();
        assert_eq!(planet.defense(), 10);
        assert_eq!(planet.base_torpedo_tech(), 1);
        assert!(!planet.has_base());

        planet.set_num_base_torpedoes(1, 10); // cost 5 each
        planet.set_num_base_torpedoes(2, 5); // cost 10 each
        assert_eq!(planet.num_base_torpedoes(1), 10);
        assert_eq!(planet.num_base_torpedoes(0), 0);
        assert_eq!(planet.num_base_torpedoes(11), 0);
        planet.set_num_base_torpedoes(11, 3);
        assert_eq!(planet.num_base_torpedoes(11), 0);

        // 10*5 + 5*10 = 100 money; as type 2 (cost 10) that is 10 torpedoes.
        assert_eq!(planet.num_base_torpedoes_as_type(2, &list), 10);
        assert_eq!(planet.num_base_torpedoes_as_type(1, &list), 20);
    }

    #[test]
    fn primary_enemy_classification() {
        assert!(!Aggressiveness::Passive.is_primary_enemy());
        assert!(!Aggressiveness::Kill.is_primary_enemy());
        assert!(!Aggressiveness::NoFuel.is_primary_enemy());
        assert!(Aggressiveness::PrimaryEnemy(1).is_primary_enemy());
        assert!(Aggressiveness::PrimaryEnemy(12).is_primary_enemy());
        assert_eq!(Aggressiveness::PrimaryEnemy(7).primary_enemy(), 7);
        assert_eq!(Aggressiveness::Kill.primary_enemy(), 0);
    }

    #[test]
    fn unit_round_trips_through_json() {
        let mut ship = Unit::new_ship();
        ship.set_id(33);
        ship.set_owner(4);
        ship.set_friendly_code("NT3");
        ship.set_num_launchers(5);
        ship.set_torpedo_type(7);
        ship.set_ammo(40);
        ship.set_flags(UnitFlags::ELUSIVE_SET | UnitFlags::ELUSIVE | UnitFlags::RANDOM_FC);
        ship.set_aggressiveness(Aggressiveness::PrimaryEnemy(9));

        let json = serde_json::to_string(&ship).unwrap();
        let back: Unit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ship);
        assert_eq!(back.flags(), ship.flags());
        assert_eq!(back.aggressiveness(), Aggressiveness::PrimaryEnemy(9));
    }

    #[test]
    fn planet_implied_abilities() {
        let list = ShipList::with_default_components();
        let config = HostConfiguration::default();
        let opts = Configuration::default();
        let mut nu_opts = Configuration::default();
        nu_opts.set_mode(HostMode::NuHost, 0, &config);

        let mut planet = Unit::new_planet();
        planet.set_owner(5);
        assert!(planet.has_ability(Ability::TripleBeamKill, &opts, &list, &config));
        assert!(!planet.has_ability(Ability::Commander, &opts, &list, &config));

        planet.set_owner(4);
        assert!(!planet.has_ability(Ability::DoubleBeamCharge, &opts, &list, &config));
        assert!(planet.has_ability(Ability::DoubleBeamCharge, &nu_opts, &list, &config));
    }
}
