//! Simulator main entry point: host-rule predicates, packing units into the
//! playback format, per-fight modifiers, the fight drivers and the
//! host-family main loops.

use log::{debug, trace};

use crate::data::host_config::HostConfiguration;
use crate::data::ship_list::ShipList;
use crate::sim::ability::Ability;
use crate::sim::battle_order;
use crate::sim::config::{BalancingMode, Configuration, HostMode};
use crate::sim::result::Result;
use crate::sim::rng::Rng;
use crate::sim::setup::Setup;
use crate::sim::tables::{MASTER_BONUS_BAYS_X100, MASTER_BONUS_FIGHTERS_X10};
use crate::sim::unit::{Aggressiveness, Unit};
use crate::sim::UnitFlags;
use crate::vcr::classic::{create_player, Side, CAP_BEAMS, CAP_DEATH_RAY, CAP_EXPERIENCE};
use crate::vcr::database::{Battle, BattleKind, BattleOutcome, Database};
use crate::vcr::object::Object;
use crate::vcr::statistic::Statistic;
use crate::MAX_PLAYERS;

fn must_exist<T>(value: Option<T>, what: &str) -> T {
    value.unwrap_or_else(|| panic!("unexpected missing {what}"))
}

/// Fixed-size per-player table, indexed by player id.
#[derive(Debug, Clone, Copy)]
struct PlayerArray<T>([T; MAX_PLAYERS + 1]);

impl<T: Copy + Default> PlayerArray<T> {
    fn new() -> Self {
        Self([T::default(); MAX_PLAYERS + 1])
    }

    fn get(&self, player: i32) -> T {
        if (1..=MAX_PLAYERS as i32).contains(&player) {
            self.0[player as usize]
        } else {
            T::default()
        }
    }

    fn set(&mut self, player: i32, value: T) {
        if (1..=MAX_PLAYERS as i32).contains(&player) {
            self.0[player as usize] = value;
        }
    }

    fn set_all(&mut self, value: T) {
        self.0 = [value; MAX_PLAYERS + 1];
    }
}

/// Cloaked-bays donor: the first own-side cloaked carrier with the ability,
/// in battle order. Bays and fighters are added to the fighting ship; losses
/// are shared afterwards.
#[derive(Debug, Clone, Copy)]
struct CloakedBaysDonor {
    slot: usize,
    bays: i32,
    ammo: i32,
}

/// Per-fight global modifiers.
struct GlobalModifiers {
    /// Commander level base per player: a Commander of level X gives each
    /// own-side ship of lower level a +1 boost. Propagates to allies and
    /// remains for the turn even if the commander dies.
    level_base: PlayerArray<i32>,
    /// Number of active shield generators per player, capped at 2. Lost
    /// immediately when the generator ship dies.
    num_shield_generators: PlayerArray<i32>,
    /// Cloaked-bays donor per player, at most one per fight.
    cloaked_bays_donor: PlayerArray<Option<CloakedBaysDonor>>,
}

impl GlobalModifiers {
    fn new() -> Self {
        Self {
            level_base: PlayerArray::new(),
            num_shield_generators: PlayerArray::new(),
            cloaked_bays_donor: PlayerArray::new(),
        }
    }
}

/// Entry in a battle-order list: a ship slot or the planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderEntry {
    Ship(usize),
    Planet,
}

fn unit_of<'a>(setup: &'a Setup, entry: OrderEntry) -> &'a Unit {
    match entry {
        OrderEntry::Ship(slot) => must_exist(setup.ship(slot), "ship slot"),
        OrderEntry::Planet => must_exist(setup.planet(), "planet"),
    }
}

fn plimit(max: i32, scale: i32, damage: i32) -> i32 {
    max - (max * damage) / scale
}

fn round_sqrt(value: f64) -> i32 {
    (value.max(0.0).sqrt() + 0.5) as i32
}

/// Division rounding half to even, for non-negative operands.
fn divide_round_even(num: i32, den: i32) -> i32 {
    let quotient = num / den;
    let twice_rest = 2 * (num % den);
    if twice_rest > den || (twice_rest == den && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

/// Damage-restricted tech level, clamped to `[1, 10]`.
fn damage_tech(tech: i32, damage: i32) -> i32 {
    let max = (100 - damage) / 10;
    tech.min(max).max(1)
}

/// Seed for one fight. Under seed control the seed is a pure function of the
/// run index; otherwise it comes from the RNG, limited to the emulated
/// host's seed space.
fn get_seed(opts: &Configuration, result: &Result, rng: &mut Rng) -> u16 {
    if opts.has_seed_control() {
        match opts.mode() {
            HostMode::NuHost => (result.this_battle_index % 118 + 1) as u16,
            _ => (result.this_battle_index % 110 + 1) as u16,
        }
    } else {
        match opts.mode() {
            HostMode::Host => (rng.next(110) + 1) as u16,
            HostMode::NuHost => (rng.next(118) + 1) as u16,
            _ => rng.next_u64() as u16,
        }
    }
}

/// Ammunition limit stated by the friendly code, -1 for no limit. `NTP`
/// blocks all torpedoes and fighters, `NT0` allows 100, `NT1`..`NT9` allow
/// 10..90.
fn fcode_ammo_limit(code: &str) -> i32 {
    let bytes = code.as_bytes();
    if bytes.len() == 3 && bytes[0] == b'N' && bytes[1] == b'T' {
        match bytes[2] {
            b'P' => 0,
            b'0' => 100,
            d @ b'1'..=b'9' => 10 * i32::from(d - b'0'),
            _ => -1,
        }
    } else {
        -1
    }
}

fn unused_ammo(previous_ammo: i32, limit: i32) -> i32 {
    if limit >= 0 && limit < previous_ammo {
        previous_ammo - limit
    } else {
        0
    }
}

/// Whether a shared friendly code is exempt from the no-fight-on-match rule.
/// Classic hosts only exempt their hardcoded codes (checked by the caller);
/// PHost-family hosts exempt every special code of the ship list.
fn is_fcode_exempt_from_match(code: &str, opts: &Configuration, list: &ShipList) -> bool {
    match opts.mode() {
        HostMode::Host | HostMode::NuHost => false,
        _ => list.friendly_codes.is_special(code),
    }
}

/// Whether ship `at` attacks ship `op`. Checks only one direction.
fn is_attacking_ship(
    at: &Unit,
    op: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) -> bool {
    // deactivated units do not fight
    if (at.flags() | op.flags()).contains(UnitFlags::DEACTIVATED) {
        return false;
    }
    // same owner does not fight
    if at.owner() == op.owner() {
        return false;
    }
    // zombies do not fight
    if at.owner() == 0 || op.owner() == 0 {
        return false;
    }
    // friends do not fight
    if opts.has_honor_alliances() && opts.alliance_settings().get(at.owner(), op.owner()) {
        return false;
    }
    // passive or fuelless units do not attack
    match at.aggressiveness() {
        Aggressiveness::Passive | Aggressiveness::NoFuel => return false,
        Aggressiveness::Kill => {}
        Aggressiveness::PrimaryEnemy(pe) => {
            // we have a PE, so check whether the opponent matches
            if op.owner() != pe && !opts.enemy_settings().get(at.owner(), op.owner()) {
                return false;
            }
        }
    }
    // cloaked attackers need host permission
    if at.has_flag(UnitFlags::CLOAKED) && !config.allow_cloaked_ships_attack {
        return false;
    }
    // cloaked opponents cannot be attacked
    if op.has_flag(UnitFlags::CLOAKED) {
        return false;
    }
    // fuelless opponents do not fight
    if op.aggressiveness() == Aggressiveness::NoFuel {
        return false;
    }
    // matching friendly codes suppress the fight, with a few exceptions
    let code = at.friendly_code();
    if code == op.friendly_code()
        && code != "mkt"
        && code != "lfm"
        && code != "NTP"
        && code != "???"
        && !is_fcode_exempt_from_match(code, opts, list)
    {
        return false;
    }
    true
}

/// Whether a ship is immune from planet attacks.
fn is_immune(
    ship: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) -> bool {
    if config.player_race_number(ship.owner()) == 3
        && ship.aggressiveness() == Aggressiveness::NoFuel
        && ship.num_beams() != 0
    {
        return true;
    }
    if ship.has_ability(Ability::PlanetImmunity, opts, list, config) {
        return true;
    }
    ship.has_flag(UnitFlags::CLOAKED)
}

/// Whether a ship and a planet fight. Unlike the ship/ship predicate this
/// tests both directions of aggression.
fn is_attacking_planet(
    ship: &Unit,
    planet: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) -> bool {
    if (ship.flags() | planet.flags()).contains(UnitFlags::DEACTIVATED) {
        return false;
    }
    if ship.owner() == planet.owner() {
        return false;
    }
    if ship.owner() == 0 || planet.owner() == 0 {
        return false;
    }
    if ship.has_flag(UnitFlags::CLOAKED) {
        return false;
    }
    let code = ship.friendly_code();
    if code == planet.friendly_code()
        && code != "ATT"
        && code != "NUK"
        && code != "???"
        && !is_fcode_exempt_from_match(code, opts, list)
    {
        return false;
    }

    let ship_wants_attack = if opts.has_honor_alliances()
        && opts.alliance_settings().get(ship.owner(), planet.owner())
    {
        false
    } else {
        match ship.aggressiveness() {
            Aggressiveness::Kill => true,
            Aggressiveness::NoFuel | Aggressiveness::Passive => false,
            Aggressiveness::PrimaryEnemy(pe) => {
                pe == planet.owner() || opts.enemy_settings().get(ship.owner(), planet.owner())
            }
        }
    };

    let planet_wants_attack = if opts.has_honor_alliances()
        && opts.alliance_settings().get(planet.owner(), ship.owner())
    {
        false
    } else if planet.friendly_code() == "ATT" {
        ship.aggressiveness() != Aggressiveness::NoFuel
    } else {
        planet.friendly_code() == "NUK"
    };

    ship_wants_attack || (planet_wants_attack && !is_immune(ship, opts, list, config))
}

/// Pack a ship into the playback format. Charge and miss rates stay at
/// their defaults; the modifier pass sets them.
fn pack_ship(
    ship: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) -> Object {
    let mut obj = Object::default();
    obj.is_planet = false;
    if ship.num_bays() != 0 {
        obj.num_fighters = ship.ammo();
        obj.num_torpedoes = 0;
        obj.num_launchers = 0;
        obj.num_bays = ship.num_bays();
        obj.torpedo_type = 0;
    } else if ship.num_launchers() != 0 {
        obj.num_fighters = 0;
        obj.num_torpedoes = ship.ammo();
        obj.num_launchers = ship.num_launchers();
        obj.num_bays = 0;
        obj.torpedo_type = ship.torpedo_type();
    } else {
        obj.num_fighters = 0;
        obj.num_torpedoes = 0;
        obj.num_launchers = 0;
        obj.num_bays = 0;
        obj.torpedo_type = 0;
    }
    obj.name = ship.name().to_string();
    obj.damage = ship.damage();
    obj.crew = ship.crew();
    obj.id = ship.id();
    obj.owner = ship.owner();
    obj.race = config.player_race_number(ship.owner());
    obj.beam_kill_rate = if obj.race == 5 { 3 } else { 1 };
    obj.beam_type = ship.beam_type();
    obj.num_beams = ship.num_beams();
    obj.experience_level = if opts.is_experience_enabled(config) {
        ship.experience_level()
    } else {
        0
    };
    obj.shield = ship.shield();

    if ship.hull_type() != 0 {
        let hull = must_exist(list.hull(ship.hull_type()), "hull");
        obj.mass = hull.mass;
        obj.picture = hull.picture;
        obj.hull = ship.hull_type();
    } else {
        obj.mass = ship.mass();
        obj.picture = 200;
        obj.hull = 0;
    }
    obj
}

/// Apply the order-sensitive per-fight modifiers to a packed ship:
/// engine-shield bonus, scotty bonus, cloaked bays, shield cap, extra bays,
/// freighter override, NTP-style ammunition cap, damage-limited weapon caps,
/// commander level, ability rates.
fn apply_ship_modifiers(
    obj: &mut Object,
    against_planet: bool,
    ship: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
    mods: &GlobalModifiers,
    first: bool,
) {
    let num_sg = mods.num_shield_generators.get(obj.owner);
    let hosty = opts.mode().is_classic();

    // Engine-shield bonus; the host's rounding rule is integer truncation.
    let mut esb = 50 * num_sg;
    if !against_planet || (!hosty && config.allow_es_bonus_against_planets) {
        esb += opts.engine_shield_bonus();
    }
    if !hosty {
        esb += HostConfiguration::experience_bonus(
            &config.emod_engine_shield_bonus_rate,
            obj.experience_level,
        );
    }
    if esb != 0 {
        let engine = must_exist(list.engine(ship.engine_type()), "engine");
        obj.add_mass((i64::from(esb) * i64::from(engine.cost) / 100) as i32);
    }

    // Bonus bays and scotty bonus.
    let mut bay_bonus = 0;
    let mut bonus_fighters = 0;
    if config.player_race_number(ship.owner()) == 1 && opts.has_scotty_bonus() {
        // only classic hosts grant bonus bays; PHost bonus bays come below
        if hosty {
            bay_bonus += 3;
        }
        obj.add_mass(50);
        if opts.mode() == HostMode::Host || !first {
            // HOST grants the shield bonus before every fight. NuHost and
            // PHost grant it after every fight; granting it before the
            // second and later fights keeps the final statistics honest.
            obj.shield += 25;
        }
    }
    if let Some(donor) = mods.cloaked_bays_donor.get(obj.owner) {
        bay_bonus += donor.bays;
        bonus_fighters += donor.ammo;
    }

    // Shield limit incl. shield generators.
    let shield_limit = 100 + 50 * num_sg;
    obj.shield = (obj.shield + num_sg * 25).min(shield_limit - obj.damage).max(0);

    if !hosty {
        bay_bonus += config.extra_fighter_bays.get(ship.owner());
        bay_bonus += HostConfiguration::experience_bonus(
            &config.emod_extra_fighter_bays,
            obj.experience_level,
        );
    }
    if obj.num_bays != 0 {
        obj.add_bays(bay_bonus);
        obj.add_fighters(bonus_fighters);
        // bay_bonus is needed again for the damage limits
    }

    // Freighters have no shields.
    if !ship.is_armed() {
        obj.shield = 0;
    }

    // NTP & Co.
    let limit = fcode_ammo_limit(ship.friendly_code());
    if limit >= 0 {
        obj.num_fighters = obj.num_fighters.min(limit);
        obj.num_torpedoes = obj.num_torpedoes.min(limit);
    }

    // Damage limitations.
    if (config.player_race_number(ship.owner()) != 1 || !opts.has_scotty_bonus())
        && !ship.has_ability(Ability::FullWeaponry, opts, list, config)
    {
        if hosty {
            let mut limit = 10 - obj.damage / 10;
            if config.player_race_number(ship.owner()) == 2 {
                limit += 5;
            }
            if limit < 0 {
                limit = 0;
            }
            obj.num_launchers = obj.num_launchers.min(limit);
            // At this point bay_bonus holds only the cloaked bays: the fed
            // branch is excluded here and the extra-bay options are
            // PHost-only. Those bays survive the cap.
            obj.num_bays = obj.num_bays.min(limit + bay_bonus);
            obj.num_beams = obj.num_beams.min(limit);
        } else {
            let scale = if config.player_race_number(ship.owner()) == 2 {
                150
            } else {
                100
            };
            if ship.hull_type() == 0 {
                obj.num_launchers = obj
                    .num_launchers
                    .min(plimit(ship.num_launchers(), scale, ship.damage()));
                obj.num_bays = obj
                    .num_bays
                    .min(plimit(ship.num_bays() + bay_bonus, scale, ship.damage()));
                obj.num_beams = obj
                    .num_beams
                    .min(plimit(ship.num_beams(), scale, ship.damage()));
            } else {
                let hull = must_exist(list.hull(ship.hull_type()), "hull");
                obj.num_launchers = obj
                    .num_launchers
                    .min(plimit(hull.max_launchers, scale, ship.damage()));
                obj.num_bays = obj
                    .num_bays
                    .min(plimit(hull.num_bays + bay_bonus, scale, ship.damage()));
                obj.num_beams = obj
                    .num_beams
                    .min(plimit(hull.max_beams, scale, ship.damage()));
            }
        }
    }

    // Simplifications.
    if obj.num_launchers == 0 {
        obj.num_torpedoes = 0;
        obj.torpedo_type = 0;
    }
    if obj.num_bays == 0 {
        obj.num_fighters = 0;
    }
    if obj.num_beams == 0 {
        obj.beam_type = 0;
    }

    // Commander level propagation, at most one level per fight.
    if obj.experience_level < mods.level_base.get(ship.owner()) {
        obj.experience_level += 1;
    }

    // Ability-derived rates.
    obj.beam_kill_rate = if ship.has_ability(Ability::TripleBeamKill, opts, list, config) {
        3
    } else {
        1
    };
    obj.beam_charge_rate = if ship.has_ability(Ability::DoubleBeamCharge, opts, list, config) {
        2
    } else {
        1
    };
    obj.torp_charge_rate = if ship.has_ability(Ability::DoubleTorpedoCharge, opts, list, config) {
        2
    } else {
        1
    };
    obj.crew_defense_rate = if ship.has_ability(Ability::Squadron, opts, list, config) {
        100
    } else {
        0
    };
}

/// Modifiers caused by the opponent: an Elusive opponent drops torpedo
/// accuracy to 10%.
fn apply_opponent_modifiers(
    obj: &mut Object,
    opponent: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) {
    if opponent.has_ability(Ability::Elusive, opts, list, config) {
        obj.torp_miss_rate = 90;
    }
}

/// Pack a planet into the playback format.
fn pack_planet(
    planet: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) -> Object {
    let has_base = planet.base_beam_tech() > 0;
    let planet_defense = planet.defense();
    let base_defense = if has_base { planet.base_defense() } else { 0 };
    let base_fighters = if has_base { planet.num_base_fighters() } else { 0 };

    let mut obj = Object::default();
    obj.is_planet = true;
    obj.name = planet.name().to_string();
    obj.id = planet.id();
    obj.owner = planet.owner();
    obj.race = config.player_race_number(planet.owner());
    obj.beam_kill_rate = if obj.race == 5 { 3 } else { 1 };
    obj.picture = 1;
    obj.hull = 0;
    obj.experience_level = if opts.is_experience_enabled(config) {
        planet.experience_level()
    } else {
        0
    };

    if !opts.mode().is_classic() {
        let eff_p_defense = planet_defense * (100 - planet.damage()) / 100;
        let eff_bp_defense = (planet_defense + base_defense) * (100 - planet.damage()) / 100;
        let weapon_limit = if config.allow_alternative_combat { 20 } else { 10 };

        obj.num_fighters = round_sqrt(f64::from(eff_p_defense)) + base_fighters;
        obj.damage = planet.damage();
        obj.crew = 0;

        obj.beam_type = round_sqrt(f64::from(eff_p_defense) / 2.0);
        if has_base && damage_tech(planet.base_beam_tech(), planet.base_damage()) > obj.beam_type {
            obj.beam_type = damage_tech(planet.base_beam_tech(), planet.base_damage());
        }
        obj.beam_type = obj.beam_type.max(1).min(list.num_beam_types());
        obj.num_beams = round_sqrt(f64::from(eff_bp_defense) / 3.0).min(weapon_limit);

        obj.num_bays = obj.num_fighters - base_fighters;
        if has_base {
            obj.add_bays(5);
        }
        obj.mass = 100 + eff_p_defense + base_defense * (100 - planet.damage()) / 100;
        obj.shield = planet.shield();

        if config.planets_have_tubes {
            obj.torpedo_type = round_sqrt(f64::from(eff_p_defense) / 2.0);
            if has_base
                && damage_tech(planet.base_torpedo_tech(), planet.base_damage()) > obj.torpedo_type
            {
                obj.torpedo_type = damage_tech(planet.base_torpedo_tech(), planet.base_damage());
            }
            obj.torpedo_type = obj.torpedo_type.min(list.num_torpedo_types());
            obj.num_launchers = round_sqrt(f64::from(eff_bp_defense) / 4.0).min(20);

            let mut torps_per_tube = config.planetary_torps_per_tube.get(obj.owner);
            torps_per_tube += HostConfiguration::experience_bonus(
                &config.emod_planetary_torps_per_tube,
                obj.experience_level,
            );
            obj.num_torpedoes = torps_per_tube * obj.num_launchers;

            // Starbase storage converts into the selected type by cost.
            if config.use_base_torps_in_combat.get(planet.owner()) {
                let mut cost: i64 = 0;
                for i in 1..=list.num_torpedo_types() {
                    let launcher = must_exist(list.launcher(i), "torpedo launcher");
                    cost +=
                        i64::from(planet.num_base_torpedoes(i)) * i64::from(launcher.torpedo_cost);
                }
                if obj.torpedo_type > 0 {
                    let torp_cost = must_exist(list.launcher(obj.torpedo_type), "torpedo launcher")
                        .torpedo_cost;
                    if torp_cost > 0 {
                        obj.add_torpedoes((cost / i64::from(torp_cost)) as i32);
                    }
                }
            }
            obj.num_torpedoes = obj.num_torpedoes.min(255);
        }
    } else {
        obj.num_fighters = round_sqrt(f64::from(planet_defense)) + base_fighters;
        obj.damage = 0;
        // HOST writes the fighter count into the crew field of its playback
        // file format, so the packed object does the same.
        obj.crew = obj.num_fighters;

        obj.beam_type = round_sqrt(f64::from(planet_defense) / 2.0);
        if has_base && planet.base_beam_tech() > obj.beam_type {
            obj.beam_type = planet.base_beam_tech();
        }
        obj.beam_type = obj.beam_type.max(1).min(list.num_beam_types());
        obj.num_beams = round_sqrt(f64::from(planet_defense + base_defense) / 3.0).min(10);

        obj.num_bays = round_sqrt(f64::from(planet_defense));
        if base_fighters != 0 {
            obj.add_bays(5);
        }
        obj.mass = 100 + planet_defense + base_defense;
        obj.shield = planet.shield();
        if planet_defense == 0 && base_defense == 0 {
            obj.shield = 0;
        }
    }
    obj
}

/// Planet modifiers: commander level and ability rates.
fn apply_planet_modifiers(
    obj: &mut Object,
    planet: &Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
    mods: &GlobalModifiers,
) {
    if obj.experience_level < mods.level_base.get(obj.owner) {
        obj.experience_level += 1;
    }
    obj.beam_kill_rate = if planet.has_ability(Ability::TripleBeamKill, opts, list, config) {
        3
    } else {
        1
    };
    obj.beam_charge_rate = if planet.has_ability(Ability::DoubleBeamCharge, opts, list, config) {
        2
    } else {
        1
    };
    obj.torp_charge_rate =
        if planet.has_ability(Ability::DoubleTorpedoCharge, opts, list, config) {
            2
        } else {
            1
        };
}

/// Apply the Master-at-Arms bonus to the right side. Applies only to
/// fighter/fighter battles.
fn apply_master_bonus(
    left: &mut Object,
    right: &mut Object,
    result: &mut Result,
    opts: &Configuration,
    rng: &mut Rng,
) {
    if left.num_bays == 0 || right.num_bays == 0 {
        return;
    }

    // Effective fighters: those not destroyed immediately after launch. No
    // bonus when neither side has enough fighters for intercept to matter.
    let mut eff_left = left.num_fighters - 2 * right.num_beams;
    let mut eff_right = right.num_fighters - 2 * left.num_beams;
    if left.shield >= 100 {
        eff_right -= left.num_beams;
    }
    if right.shield >= 100 {
        eff_left -= right.num_beams;
    }
    let max_eff = eff_left.min(eff_right).max(0);
    // Maximum bonus is 14% of that, rounded, kept times 10.
    let max_bonus = (max_eff * 14 + 5) / 10;

    // Effective bay count; +1 offsets the table indexing.
    let bay_left = (left.num_bays - (right.num_beams + 2) / 5 + 1).clamp(0, 14) as usize;
    let bay_right = (right.num_bays - (left.num_beams + 2) / 5 + 1).clamp(0, 14) as usize;

    let plane = usize::from(right.is_planet);
    let bonus_bays_100 = i32::from(MASTER_BONUS_BAYS_X100[plane][bay_right][bay_left]);
    let mut bonus_fighters_10 = i32::from(MASTER_BONUS_FIGHTERS_X10[plane][bay_right][bay_left]);
    if bonus_fighters_10 > max_bonus {
        bonus_fighters_10 = max_bonus;
    }

    right.add_bays(bonus_bays_100 / 100);
    right.add_fighters(bonus_fighters_10 / 10);

    if opts.has_seed_control() {
        if result.add_series(2) != 0 {
            right.add_bays(1);
            result.this_battle_weight *= i64::from(bonus_bays_100 % 100);
        } else {
            result.this_battle_weight *= i64::from(100 - bonus_bays_100 % 100);
        }
        result.total_battle_weight *= 100;

        if result.add_series(2) != 0 {
            right.add_fighters(1);
            result.this_battle_weight *= i64::from(bonus_fighters_10 % 10);
        } else {
            result.this_battle_weight *= i64::from(10 - bonus_fighters_10 % 10);
        }
        result.total_battle_weight *= 10;
    } else {
        if rng.next(100) < bonus_bays_100 % 100 {
            right.add_bays(1);
        }
        if rng.next(10) < bonus_fighters_10 % 10 {
            right.add_fighters(1);
        }
    }
}

/// Unpack a ship after the battle. Must not run twice on one pair, or NTx
/// reserves would be credited twice. Accounts fighter losses against the
/// cloaked-bays donor, bay-proportionally with the donor's loss capped at
/// its ammunition.
fn unpack_ship(obj: &Object, setup: &mut Setup, slot: usize, mods: &GlobalModifiers) {
    let donor_slot = mods.cloaked_bays_donor.get(obj.owner).map(|d| d.slot);

    let ship = must_exist(setup.ship(slot), "ship slot");
    let limit = fcode_ammo_limit(ship.friendly_code());
    let num_bays = ship.num_bays();
    let num_launchers = ship.num_launchers();
    let ship_ammo = ship.ammo();

    let ship = must_exist(setup.ship_mut(slot), "ship slot");
    ship.set_shield(obj.shield);
    ship.set_damage(obj.damage);
    ship.set_crew(obj.crew);

    if num_bays != 0 {
        let peer = donor_slot.map(|peer_slot| {
            let peer = must_exist(setup.ship(peer_slot), "donor slot");
            (peer_slot, peer.ammo(), peer.num_bays())
        });
        let previous_ammo = ship_ammo + peer.map_or(0, |(_, ammo, _)| ammo);
        let unused = unused_ammo(previous_ammo, limit);

        // Loss so far covers (ship, before) to (ship + donor, after).
        let mut fighter_loss = ship_ammo - (obj.num_fighters + unused);
        if let Some((peer_slot, peer_ammo, peer_bays)) = peer {
            fighter_loss += peer_ammo;
            let peer_loss = peer_ammo.min(fighter_loss * peer_bays / (peer_bays + num_bays));
            must_exist(setup.ship_mut(peer_slot), "donor slot").set_ammo(peer_ammo - peer_loss);
            fighter_loss -= peer_loss;
        }
        let ship = must_exist(setup.ship_mut(slot), "ship slot");
        ship.set_ammo(ship_ammo - fighter_loss);
    } else if num_launchers != 0 {
        let unused = unused_ammo(ship_ammo, limit);
        must_exist(setup.ship_mut(slot), "ship slot").set_ammo(obj.num_torpedoes + unused);
    }
}

/// Unpack a planet after the battle.
fn unpack_planet(
    obj: &Object,
    planet: &mut Unit,
    orig_obj: &Object,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) {
    let fighters_lost = orig_obj.num_fighters - obj.num_fighters;
    let integrity_remaining = (100 - obj.damage).max(0);

    if !opts.mode().is_classic() {
        planet.set_shield(obj.shield);
        planet.set_damage(obj.damage);

        if planet.base_beam_tech() > 0 {
            // remove fighters; excess losses eat planetary defense
            let new_base_fighters = planet.num_base_fighters() - fighters_lost;
            if new_base_fighters < 0 {
                planet.set_defense(planet.defense() + new_base_fighters);
                planet.set_num_base_fighters(0);
            } else {
                planet.set_num_base_fighters(new_base_fighters);
            }

            // pay spent torpedoes from base storage, one of each stocked
            // type per round until the cost is covered
            if config.planets_have_tubes && config.use_base_torps_in_combat.get(planet.owner()) {
                let torps_lost = orig_obj.num_torpedoes - obj.num_torpedoes;
                let mut torp_cost = i64::from(torps_lost)
                    * i64::from(
                        must_exist(list.launcher(obj.torpedo_type), "torpedo launcher")
                            .torpedo_cost,
                    );
                while torp_cost > 0 {
                    let mut did = false;
                    for i in 1..=list.num_torpedo_types() {
                        if planet.num_base_torpedoes(i) > 0 {
                            planet.set_num_base_torpedoes(i, planet.num_base_torpedoes(i) - 1);
                            torp_cost -= i64::from(
                                must_exist(list.launcher(i), "torpedo launcher").torpedo_cost,
                            );
                            did = true;
                        }
                    }
                    if !did {
                        break;
                    }
                }
            }
        }
    } else {
        planet.set_shield(obj.shield);
        planet.set_defense(divide_round_even(integrity_remaining * planet.defense(), 100));

        if planet.base_beam_tech() > 0 {
            let new_base_fighters = planet.num_base_fighters() - fighters_lost;
            if new_base_fighters < 0 {
                planet.set_defense(planet.defense() + new_base_fighters);
                planet.set_num_base_fighters(0);
            } else {
                planet.set_num_base_fighters(new_base_fighters);
            }

            planet.set_base_defense(divide_round_even(
                integrity_remaining * planet.base_defense(),
                100,
            ));
            planet.set_base_beam_tech(
                divide_round_even(integrity_remaining * planet.base_beam_tech(), 100).max(1),
            );
            planet.set_base_torpedo_tech(
                divide_round_even(integrity_remaining * planet.base_torpedo_tech(), 100).max(1),
            );

            let new_damage = planet.damage() + obj.damage;
            if new_damage > 100 {
                // base destroyed
                planet.set_base_beam_tech(0);
            } else {
                planet.set_damage(new_damage);
            }
        } else {
            planet.set_defense(planet.defense() - fighters_lost);
        }

        if planet.defense() < 0 {
            planet.set_defense(0);
        }
    }
}

/// Respawn logic for the Squadron ability: instead of dying, lose one beam
/// and come back fresh, down to the last beam.
fn handle_ship_killed(
    ship: &mut Unit,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) -> bool {
    if ship.has_ability(Ability::Squadron, opts, list, config) && ship.num_beams() > 1 {
        ship.set_num_beams(ship.num_beams() - 1);
        ship.set_damage(0);
        ship.set_shield(100);
        true
    } else {
        ship.set_owner(0);
        false
    }
}

fn capabilities_for(kind: BattleKind) -> u16 {
    if kind == BattleKind::PHost4 {
        CAP_DEATH_RAY | CAP_EXPERIENCE | CAP_BEAMS
    } else {
        0
    }
}

/// Play one ship/ship fight. Handles left/right randomisation, balancing,
/// recording and write-back. Returns true if the driver must be invoked
/// again for the same pair (squadron respawn).
#[allow(clippy::too_many_arguments)]
fn make_ship_ship_vcr(
    db: &mut Database,
    setup: &mut Setup,
    left_slot: usize,
    right_slot: usize,
    stats: &mut [Statistic],
    opts: &Configuration,
    kind: BattleKind,
    list: &ShipList,
    config: &HostConfiguration,
    mods: &GlobalModifiers,
    result: &mut Result,
    rng: &mut Rng,
) -> bool {
    {
        let left = must_exist(setup.ship(left_slot), "ship slot");
        let right = must_exist(setup.ship(right_slot), "ship slot");
        if !is_attacking_ship(left, right, opts, list, config)
            && !is_attacking_ship(right, left, opts, list, config)
        {
            return false;
        }
        if !(left.is_armed() || right.is_armed()) {
            return false;
        }
    }

    let mut swap_them = false;
    if opts.has_random_left_right() {
        swap_them = if opts.has_seed_control() {
            result.add_series(2) == 0
        } else {
            rng.next(2) == 0
        };
    }
    let (one_slot, two_slot) = if swap_them {
        (right_slot, left_slot)
    } else {
        (left_slot, right_slot)
    };

    let first = db.num_battles() == 0;
    let seed = get_seed(opts, result, rng);

    let mut left = pack_ship(must_exist(setup.ship(one_slot), "ship slot"), opts, list, config);
    let mut right = pack_ship(must_exist(setup.ship(two_slot), "ship slot"), opts, list, config);
    apply_ship_modifiers(
        &mut left,
        false,
        must_exist(setup.ship(one_slot), "ship slot"),
        opts,
        list,
        config,
        mods,
        first,
    );
    apply_ship_modifiers(
        &mut right,
        false,
        must_exist(setup.ship(two_slot), "ship slot"),
        opts,
        list,
        config,
        mods,
        first,
    );
    apply_opponent_modifiers(
        &mut left,
        must_exist(setup.ship(two_slot), "ship slot"),
        opts,
        list,
        config,
    );
    apply_opponent_modifiers(
        &mut right,
        must_exist(setup.ship(one_slot), "ship slot"),
        opts,
        list,
        config,
    );

    match opts.balancing_mode() {
        BalancingMode::Balance360k => {
            // The 360 kt bonus is granted after ESB, as in classic Host.
            if right.mass > 140 && left.num_bays != 0 {
                if opts.has_seed_control() {
                    if result.add_series(2) != 0 {
                        right.add_mass(360);
                        result.this_battle_weight *= 59;
                    } else {
                        result.this_battle_weight *= 41;
                    }
                    result.total_battle_weight *= 100;
                } else if rng.next(100) > 40 {
                    right.add_mass(360);
                }
            } else if opts.has_seed_control() {
                // The total weight of a series must depend only on the
                // options. Random left/right can show the trigger in some
                // runs but not others, so the non-trigger branch records
                // the same denominator.
                result.add_series(2);
                result.this_battle_weight *= 50;
                result.total_battle_weight *= 100;
            }
        }
        BalancingMode::MasterAtArms => {
            apply_master_bonus(&mut left, &mut right, result, opts, rng);
        }
        BalancingMode::None => {}
    }

    db.add(Battle {
        left: left.clone(),
        right: right.clone(),
        seed,
        kind,
    });
    trace!(
        "battle {}: {} (#{}) vs {} (#{}), seed {}",
        db.num_battles(),
        left.name,
        left.id,
        right.name,
        right.id,
        seed
    );

    let cap = capabilities_for(kind);
    let mut player = must_exist(create_player(kind), "VCR player");
    assert!(player.set_capabilities(cap), "VCR player refuses capabilities");
    assert!(
        !player.check_battle(&left, &right, seed),
        "VCR player refuses battle"
    );
    player.play_battle(&mut left, &mut right, seed);
    player.done_battle(&mut left, &mut right);

    unpack_ship(&left, setup, one_slot, mods);
    unpack_ship(&right, setup, two_slot, mods);

    let mut again = false;
    match player.result() {
        BattleOutcome::LeftDestroyed => {
            again = handle_ship_killed(
                must_exist(setup.ship_mut(one_slot), "ship slot"),
                opts,
                list,
                config,
            );
        }
        BattleOutcome::RightDestroyed => {
            again = handle_ship_killed(
                must_exist(setup.ship_mut(two_slot), "ship slot"),
                opts,
                list,
                config,
            );
        }
        BattleOutcome::LeftCaptured => {
            let new_owner = must_exist(setup.ship(two_slot), "ship slot").owner();
            let one = must_exist(setup.ship_mut(one_slot), "ship slot");
            one.set_owner(new_owner);
            one.set_crew(10);
            one.set_aggressiveness(Aggressiveness::Passive);
        }
        BattleOutcome::RightCaptured => {
            let new_owner = must_exist(setup.ship(one_slot), "ship slot").owner();
            let two = must_exist(setup.ship_mut(two_slot), "ship slot");
            two.set_owner(new_owner);
            two.set_crew(10);
            two.set_aggressiveness(Aggressiveness::Passive);
        }
        BattleOutcome::Timeout => {
            // both ships still operable
        }
        BattleOutcome::Mutual => {
            must_exist(setup.ship_mut(one_slot), "ship slot").set_owner(0);
            must_exist(setup.ship_mut(two_slot), "ship slot").set_owner(0);
        }
    }

    stats[one_slot].merge(&player.statistic(Side::Left));
    stats[two_slot].merge(&player.statistic(Side::Right));
    again
}

/// Play one ship/planet fight. The ship is always the left side.
#[allow(clippy::too_many_arguments)]
fn make_ship_planet_vcr(
    db: &mut Database,
    setup: &mut Setup,
    ship_slot: usize,
    stats: &mut [Statistic],
    opts: &Configuration,
    kind: BattleKind,
    list: &ShipList,
    config: &HostConfiguration,
    mods: &GlobalModifiers,
    result: &mut Result,
    rng: &mut Rng,
) -> bool {
    {
        let ship = must_exist(setup.ship(ship_slot), "ship slot");
        let planet = must_exist(setup.planet(), "planet");
        if !is_attacking_planet(ship, planet, opts, list, config) {
            return false;
        }
    }

    let first = db.num_battles() == 0;
    let seed = get_seed(opts, result, rng);

    let mut left = pack_ship(must_exist(setup.ship(ship_slot), "ship slot"), opts, list, config);
    apply_ship_modifiers(
        &mut left,
        true,
        must_exist(setup.ship(ship_slot), "ship slot"),
        opts,
        list,
        config,
        mods,
        first,
    );

    let mut right = pack_planet(must_exist(setup.planet(), "planet"), opts, list, config);
    if opts.balancing_mode() == BalancingMode::MasterAtArms {
        apply_master_bonus(&mut left, &mut right, result, opts, rng);
    }
    apply_planet_modifiers(
        &mut right,
        must_exist(setup.planet(), "planet"),
        opts,
        list,
        config,
        mods,
    );

    let orig_planet = right.clone();
    db.add(Battle {
        left: left.clone(),
        right: right.clone(),
        seed,
        kind,
    });
    trace!(
        "battle {}: {} (#{}) vs planet {} (#{}), seed {}",
        db.num_battles(),
        left.name,
        left.id,
        right.name,
        right.id,
        seed
    );

    let cap = capabilities_for(kind);
    let mut player = must_exist(create_player(kind), "VCR player");
    assert!(player.set_capabilities(cap), "VCR player refuses capabilities");
    assert!(
        !player.check_battle(&left, &right, seed),
        "VCR player refuses battle"
    );
    player.play_battle(&mut left, &mut right, seed);
    player.done_battle(&mut left, &mut right);

    unpack_ship(&left, setup, ship_slot, mods);
    unpack_planet(
        &right,
        must_exist(setup.planet_mut(), "planet"),
        &orig_planet,
        opts,
        list,
        config,
    );

    let mut again = false;
    match player.result() {
        BattleOutcome::LeftDestroyed => {
            again = handle_ship_killed(
                must_exist(setup.ship_mut(ship_slot), "ship slot"),
                opts,
                list,
                config,
            );
        }
        BattleOutcome::RightDestroyed => {
            must_exist(setup.planet_mut(), "planet").set_owner(0);
        }
        BattleOutcome::LeftCaptured => {
            let new_owner = must_exist(setup.planet(), "planet").owner();
            let ship = must_exist(setup.ship_mut(ship_slot), "ship slot");
            ship.set_owner(new_owner);
            ship.set_crew(10);
            ship.set_aggressiveness(Aggressiveness::Passive);
        }
        BattleOutcome::RightCaptured => {
            let new_owner = must_exist(setup.ship(ship_slot), "ship slot").owner();
            let planet = must_exist(setup.planet_mut(), "planet");
            planet.set_owner(new_owner);
            planet.set_base_beam_tech(0);
            planet.set_friendly_code("???");
        }
        BattleOutcome::Timeout => {
            // both units still operable
        }
        BattleOutcome::Mutual => {
            must_exist(setup.ship_mut(ship_slot), "ship slot").set_owner(0);
            must_exist(setup.planet_mut(), "planet").set_owner(0);
        }
    }

    let planet_stat_slot = setup.num_ships();
    stats[ship_slot].merge(&player.statistic(Side::Left));
    stats[planet_stat_slot].merge(&player.statistic(Side::Right));
    again
}

/// Find the most experienced Commander ship of every player and propagate
/// the levels through alliances. Computed once per run.
fn compute_maximum_experience_levels(
    setup: &Setup,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) -> PlayerArray<i32> {
    let mut per_owner: PlayerArray<i32> = PlayerArray::new();
    let mut result: PlayerArray<i32> = PlayerArray::new();
    if opts.is_experience_enabled(config) {
        for ship in setup.ships() {
            if !ship.has_flag(UnitFlags::DEACTIVATED)
                && ship.has_ability(Ability::Commander, opts, list, config)
                && ship.experience_level() > per_owner.get(ship.owner())
            {
                per_owner.set(ship.owner(), ship.experience_level());
            }
        }
        for player in 1..=MAX_PLAYERS as i32 {
            let mut level = 0;
            for ally in 1..=MAX_PLAYERS as i32 {
                if ally == player
                    || (opts.has_honor_alliances() && opts.alliance_settings().get(ally, player))
                {
                    level = level.max(per_owner.get(ally));
                }
            }
            result.set(player, level);
        }
    }
    result
}

/// Per-fight helpers: shield generator counts and the cloaked-bays donor,
/// computed over all participants except the two paired units.
fn compute_helpers(
    mods: &mut GlobalModifiers,
    battle_order: &[OrderEntry],
    ignore1: OrderEntry,
    ignore2: OrderEntry,
    setup: &Setup,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
) {
    const MAX_SHIELD_GENERATORS: i32 = 2;

    mods.num_shield_generators.set_all(0);
    mods.cloaked_bays_donor.set_all(None);

    for entry in battle_order {
        if *entry == ignore1 || *entry == ignore2 {
            continue;
        }
        let OrderEntry::Ship(slot) = *entry else {
            continue;
        };
        let ship = must_exist(setup.ship(slot), "ship slot");
        let owner = ship.owner();
        if owner == 0 || ship.has_flag(UnitFlags::DEACTIVATED) {
            continue;
        }

        if ship.has_ability(Ability::ShieldGenerator, opts, list, config) {
            let count = mods.num_shield_generators.get(owner);
            if count < MAX_SHIELD_GENERATORS {
                mods.num_shield_generators.set(owner, count + 1);
            }
        }

        if ship.has_flag(UnitFlags::CLOAKED)
            && ship.num_bays() != 0
            && ship.has_ability(Ability::CloakedBays, opts, list, config)
            && mods.cloaked_bays_donor.get(owner).is_none()
        {
            mods.cloaked_bays_donor.set(
                owner,
                Some(CloakedBaysDonor {
                    slot,
                    bays: ship.num_bays(),
                    ammo: ship.ammo(),
                }),
            );
        }
    }
}

/// Intercept-attack pre-pass: ships with an intercept order engage their
/// target first. Returns true when the run is complete (only-one-simulation).
#[allow(clippy::too_many_arguments)]
fn do_intercept_attacks(
    db: &mut Database,
    setup: &mut Setup,
    stats: &mut [Statistic],
    opts: &Configuration,
    kind: BattleKind,
    list: &ShipList,
    config: &HostConfiguration,
    mods: &mut GlobalModifiers,
    battle_order: &[OrderEntry],
    result: &mut Result,
    rng: &mut Rng,
) -> bool {
    for entry in battle_order {
        let OrderEntry::Ship(interceptor) = *entry else {
            continue;
        };
        let intercept_id = must_exist(setup.ship(interceptor), "ship slot").intercept_id();
        if intercept_id == 0 {
            continue;
        }
        // a target outside the setup, or the ship itself, means no intercept
        let Some(target) = setup.find_ship_slot_by_id(intercept_id) else {
            continue;
        };
        if target == interceptor {
            continue;
        }
        loop {
            compute_helpers(
                mods,
                battle_order,
                OrderEntry::Ship(target),
                OrderEntry::Ship(interceptor),
                setup,
                opts,
                list,
                config,
            );
            let again = make_ship_ship_vcr(
                db, setup, target, interceptor, stats, opts, kind, list, config, mods, result, rng,
            );
            if db.num_battles() != 0 && opts.has_only_one_simulation() {
                return true;
            }
            if !again {
                break;
            }
        }
    }
    false
}

/// General combat pass: the outer loop picks the aggressor, the inner loop
/// the opponent. Returns true when the run is complete.
#[allow(clippy::too_many_arguments)]
fn do_combat_order(
    db: &mut Database,
    setup: &mut Setup,
    stats: &mut [Statistic],
    opts: &Configuration,
    kind: BattleKind,
    list: &ShipList,
    config: &HostConfiguration,
    mods: &mut GlobalModifiers,
    battle_order: &[OrderEntry],
    result: &mut Result,
    rng: &mut Rng,
) -> bool {
    for right in battle_order {
        for left in battle_order {
            if left == right {
                continue;
            }
            loop {
                compute_helpers(mods, battle_order, *left, *right, setup, opts, list, config);
                let again = match (*left, *right) {
                    (OrderEntry::Ship(lslot), OrderEntry::Ship(rslot)) => make_ship_ship_vcr(
                        db, setup, lslot, rslot, stats, opts, kind, list, config, mods, result,
                        rng,
                    ),
                    (OrderEntry::Ship(lslot), OrderEntry::Planet) => make_ship_planet_vcr(
                        db, setup, lslot, stats, opts, kind, list, config, mods, result, rng,
                    ),
                    (OrderEntry::Planet, OrderEntry::Ship(rslot)) => make_ship_planet_vcr(
                        db, setup, rslot, stats, opts, kind, list, config, mods, result, rng,
                    ),
                    (OrderEntry::Planet, OrderEntry::Planet) => false,
                };
                if db.num_battles() != 0 && opts.has_only_one_simulation() {
                    return true;
                }
                if !again {
                    break;
                }
            }
        }
    }
    false
}

fn active_ship_entries(setup: &Setup) -> Vec<OrderEntry> {
    (0..setup.num_ships())
        .filter(|slot| {
            !must_exist(setup.ship(*slot), "ship slot").has_flag(UnitFlags::DEACTIVATED)
        })
        .map(OrderEntry::Ship)
        .collect()
}

/// Classic Host / NuHost driver: intercept pass, ship/ship pass in classic
/// battle order, then a ship/planet pass.
#[allow(clippy::too_many_arguments)]
fn simulate_classic(
    setup: &mut Setup,
    opts: &Configuration,
    result: &mut Result,
    stats: &mut [Statistic],
    list: &ShipList,
    config: &HostConfiguration,
    rng: &mut Rng,
    kind: BattleKind,
) {
    let mut db = Database::new();
    let mut mods = GlobalModifiers::new();
    mods.level_base = compute_maximum_experience_levels(setup, opts, list, config);

    let mut battle_order = active_ship_entries(setup);

    // intercept attacks resolve in descending Id order
    battle_order.sort_by(|a, b| unit_of(setup, *b).id().cmp(&unit_of(setup, *a).id()));
    let mut stop = do_intercept_attacks(
        &mut db,
        setup,
        stats,
        opts,
        kind,
        list,
        config,
        &mut mods,
        &battle_order,
        result,
        rng,
    );

    if !stop {
        battle_order
            .sort_by(|a, b| battle_order::compare_classic(unit_of(setup, *a), unit_of(setup, *b)));
        stop = do_combat_order(
            &mut db,
            setup,
            stats,
            opts,
            kind,
            list,
            config,
            &mut mods,
            &battle_order,
            result,
            rng,
        );
    }

    if !stop && setup.has_planet() {
        'planet_pass: for entry in &battle_order {
            let OrderEntry::Ship(slot) = *entry else {
                continue;
            };
            loop {
                compute_helpers(
                    &mut mods,
                    &battle_order,
                    *entry,
                    OrderEntry::Planet,
                    setup,
                    opts,
                    list,
                    config,
                );
                let again = make_ship_planet_vcr(
                    &mut db, setup, slot, stats, opts, kind, list, config, &mods, result, rng,
                );
                if db.num_battles() != 0 && opts.has_only_one_simulation() {
                    break 'planet_pass;
                }
                if !again {
                    break;
                }
            }
        }
    }

    result.battles = Some(db.into_handle());
}

/// PHost-family driver: the planet joins the battle order, its shield and
/// damage reset before the fights and its defense attenuation is written
/// back afterwards.
#[allow(clippy::too_many_arguments)]
fn simulate_phost(
    setup: &mut Setup,
    opts: &Configuration,
    result: &mut Result,
    stats: &mut [Statistic],
    list: &ShipList,
    config: &HostConfiguration,
    rng: &mut Rng,
    kind: BattleKind,
) {
    let mut db = Database::new();
    let mut mods = GlobalModifiers::new();
    mods.level_base = compute_maximum_experience_levels(setup, opts, list, config);

    if let Some(planet) = setup.planet_mut() {
        planet.set_shield(100);
        planet.set_damage(0);
    }

    let mut battle_order = active_ship_entries(setup);
    if setup.has_planet() {
        battle_order.push(OrderEntry::Planet);
    }

    battle_order.sort_by(|a, b| unit_of(setup, *b).id().cmp(&unit_of(setup, *a).id()));
    let stop = do_intercept_attacks(
        &mut db,
        setup,
        stats,
        opts,
        kind,
        list,
        config,
        &mut mods,
        &battle_order,
        result,
        rng,
    );

    if !stop {
        battle_order
            .sort_by(|a, b| battle_order::compare_phost(unit_of(setup, *a), unit_of(setup, *b)));
        do_combat_order(
            &mut db,
            setup,
            stats,
            opts,
            kind,
            list,
            config,
            &mut mods,
            &battle_order,
            result,
            rng,
        );
    }

    // write back planet damage/defense/tech attenuation, also on early exit
    if let Some(planet) = setup.planet_mut() {
        planet.set_defense(planet.defense() * (100 - planet.damage()) / 100);
        if planet.base_beam_tech() > 0 {
            let base_damage = planet.base_damage() + planet.damage();
            if base_damage >= 100 {
                // base destroyed
                planet.set_base_beam_tech(0);
            } else {
                planet.set_base_damage(base_damage);
                planet.set_base_defense(planet.base_defense() * (100 - planet.damage()) / 100);
                planet.set_base_beam_tech(damage_tech(planet.base_beam_tech(), planet.damage()));
                planet
                    .set_base_torpedo_tech(damage_tech(planet.base_torpedo_tech(), planet.damage()));
            }
        }
    }

    result.battles = Some(db.into_handle());
}

/// Pre-battle statistics, one slot per ship plus one for the planet.
///
/// The fighter minimum of a ship starts at its ammunition; for the planet
/// the packed fighter count would have to be duplicated here, so the slot
/// starts at the maximum and display layers filter it out.
pub fn initialize_stats(stats: &mut Vec<Statistic>, setup: &Setup) {
    stats.clear();
    for ship in setup.ships() {
        let mut obj = Object::default();
        obj.num_fighters = ship.ammo();
        stats.push(Statistic::init(&obj, 0));
    }
    if setup.has_planet() {
        let mut obj = Object::default();
        obj.num_fighters = i32::MAX;
        stats.push(Statistic::init(&obj, 0));
    }
}

/// Run one simulation: randomize friendly codes if configured, initialise
/// statistics, and dispatch to the emulated host's driver. The statistics
/// vector gets one slot per ship plus one for the planet if present.
pub fn run_simulation(
    setup: &mut Setup,
    stats: &mut Vec<Statistic>,
    result: &mut Result,
    opts: &Configuration,
    list: &ShipList,
    config: &HostConfiguration,
    rng: &mut Rng,
) {
    if opts.has_randomize_fcodes_on_every_fight() {
        setup.set_random_friendly_codes(rng);
    }

    initialize_stats(stats, setup);

    match opts.mode() {
        HostMode::Host => {
            simulate_classic(setup, opts, result, stats, list, config, rng, BattleKind::Host)
        }
        HostMode::NuHost => {
            simulate_classic(setup, opts, result, stats, list, config, rng, BattleKind::NuHost)
        }
        HostMode::PHost2 => {
            simulate_phost(setup, opts, result, stats, list, config, rng, BattleKind::PHost2)
        }
        HostMode::PHost3 => {
            simulate_phost(setup, opts, result, stats, list, config, rng, BattleKind::PHost3)
        }
        HostMode::PHost4 => {
            simulate_phost(setup, opts, result, stats, list, config, rng, BattleKind::PHost4)
        }
        HostMode::Flak => {
            // No bundled FLAK playback; the run yields no battles.
            debug!("FLAK mode selected, no playback available");
        }
    }

    debug!(
        "run {}: {} battles, weight {}/{}",
        result.this_battle_index,
        result.battles.as_ref().map_or(0, |db| db.num_battles()),
        result.this_battle_weight,
        result.total_battle_weight
    );
}
