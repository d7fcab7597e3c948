//! Bundled playback engine.
//!
//! The simulator talks to playback through the [Algorithm] trait: pack two
//! objects, play, read back the mutated objects, the per-side statistics and
//! the outcome. This module ships a compact deterministic reference player
//! driven entirely by the packed objects and the 16-bit seed; a drop-in
//! implementation of the historical per-tick mathematics can replace it
//! behind the same trait.

use crate::sim::rng::Rng;
use crate::vcr::database::{BattleKind, BattleOutcome};
use crate::vcr::object::Object;
use crate::vcr::statistic::Statistic;

/// Playback capability bits.
pub const CAP_DEATH_RAY: u16 = 1;
pub const CAP_EXPERIENCE: u16 = 2;
pub const CAP_BEAMS: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The playback interface consumed by the fight drivers.
pub trait Algorithm {
    /// Accept the requested capability set. Returns false to refuse.
    fn set_capabilities(&mut self, capabilities: u16) -> bool;

    /// Pre-flight validation. Returns true if the battle is refused.
    fn check_battle(&self, left: &Object, right: &Object, seed: u16) -> bool;

    /// Play the battle, mutating both objects in place.
    fn play_battle(&mut self, left: &mut Object, right: &mut Object, seed: u16);

    /// Final fix-ups after playing.
    fn done_battle(&mut self, left: &mut Object, right: &mut Object);

    /// Per-side out-of-band statistic of the last battle.
    fn statistic(&self, side: Side) -> Statistic;

    /// Outcome of the last battle.
    fn result(&self) -> BattleOutcome;
}

/// Create a player for the given battle kind. Returns `None` only if the
/// kind has no player registered; currently every kind is served by the
/// bundled reference player.
pub fn create_player(kind: BattleKind) -> Option<Box<dyn Algorithm>> {
    Some(Box::new(ReferencePlayer::new(kind)))
}

fn max_rounds(kind: BattleKind) -> i32 {
    match kind {
        BattleKind::Host | BattleKind::NuHost => 80,
        BattleKind::PHost2 | BattleKind::PHost3 | BattleKind::PHost4 => 100,
    }
}

/// Deterministic round-based resolver.
struct ReferencePlayer {
    kind: BattleKind,
    capabilities: u16,
    outcome: BattleOutcome,
    left_stat: Statistic,
    right_stat: Statistic,
}

impl ReferencePlayer {
    fn new(kind: BattleKind) -> Self {
        Self {
            kind,
            capabilities: 0,
            outcome: BattleOutcome::Timeout,
            left_stat: Statistic::default(),
            right_stat: Statistic::default(),
        }
    }

    fn damage_limit(obj: &Object) -> i32 {
        if obj.race == 2 && !obj.is_planet {
            150
        } else {
            100
        }
    }

    fn is_dead(obj: &Object) -> bool {
        obj.damage >= Self::damage_limit(obj) || (!obj.is_planet && obj.crew <= 0)
    }
}

/// One side's firing pass. Returns raw damage points delivered to the enemy
/// hull plus crew kill points; consumes ammunition from `shooter`.
fn volley(
    shooter: &mut Object,
    target_beams: i32,
    round: i32,
    rng: &mut Rng,
    stat: &mut Statistic,
) -> (i32, i32) {
    let mut hull = 0;
    let mut crew = 0;

    // Beams. Charge rate 2 fires every round, rate 1 every other round.
    // Experienced gunners squeeze a little more out of each emitter.
    if shooter.num_beams > 0 && (shooter.beam_charge_rate >= 2 || round % 2 == 0) {
        hull += shooter.num_beams * (shooter.beam_type * 2 + shooter.experience_level);
        crew += shooter.num_beams * shooter.beam_kill_rate;
    }

    // Torpedoes. Charge rate 2 doubles the launch frequency.
    if shooter.num_launchers > 0 && shooter.num_torpedoes > 0 {
        let fires = shooter.torp_charge_rate >= 2 || round % 2 == 1;
        if fires {
            let salvo = shooter.num_launchers.min(shooter.num_torpedoes);
            shooter.num_torpedoes -= salvo;
            for _ in 0..salvo {
                if rng.next(100) >= shooter.torp_miss_rate {
                    stat.handle_torpedo_hit();
                    hull += shooter.torpedo_type * 8;
                    crew += shooter.torpedo_type;
                }
            }
        }
    }

    // Fighters. One wave per round, up to the bay count; enemy beams thin
    // out the wave.
    if shooter.num_bays > 0 && shooter.num_fighters > 0 {
        let wave = shooter.num_bays.min(shooter.num_fighters);
        let mut lost = 0;
        for _ in 0..wave {
            hull += 2;
            if target_beams > 0 && rng.next(100) < 30 {
                lost += 1;
            }
        }
        shooter.num_fighters -= lost;
        stat.handle_fighters_aboard(shooter.num_fighters);
    }

    (hull, crew)
}

/// Apply one volley's raw points to the defender.
fn apply_damage(target: &mut Object, hull_points: i32, crew_points: i32) {
    if hull_points > 0 {
        // Heavier units shrug off more raw damage per percent.
        let scaled = (hull_points as i64 * 100 / (target.mass as i64 + 100).max(1)) as i32;
        let absorbed = target.shield.min(scaled);
        target.shield -= absorbed;
        target.damage += scaled - absorbed;
    }
    if !target.is_planet && target.shield == 0 && target.crew_defense_rate < 100 {
        target.crew -= crew_points;
        if target.crew < 0 {
            target.crew = 0;
        }
    }
}

impl Algorithm for ReferencePlayer {
    fn set_capabilities(&mut self, capabilities: u16) -> bool {
        self.capabilities = capabilities;
        capabilities & !(CAP_DEATH_RAY | CAP_EXPERIENCE | CAP_BEAMS) == 0
    }

    fn check_battle(&self, left: &Object, right: &Object, _seed: u16) -> bool {
        !left.is_armed() && !right.is_armed()
    }

    fn play_battle(&mut self, left: &mut Object, right: &mut Object, seed: u16) {
        let mut rng = Rng::new(u64::from(seed) ^ 0x5649_4352);
        if self.capabilities & CAP_EXPERIENCE == 0 {
            left.experience_level = 0;
            right.experience_level = 0;
        }
        self.left_stat = Statistic::init(left, 1);
        self.right_stat = Statistic::init(right, 1);

        let limit = max_rounds(self.kind);
        let mut round = 0;
        while round < limit && !Self::is_dead(left) && !Self::is_dead(right) {
            let (lh, lc) = volley(left, right.num_beams, round, &mut rng, &mut self.left_stat);
            let (rh, rc) = volley(right, left.num_beams, round, &mut rng, &mut self.right_stat);
            apply_damage(right, lh, lc);
            apply_damage(left, rh, rc);
            round += 1;
        }

        let left_dead = Self::is_dead(left);
        let right_dead = Self::is_dead(right);
        self.outcome = match (left_dead, right_dead) {
            (true, true) => BattleOutcome::Mutual,
            (true, false) => {
                if !left.is_planet && left.crew <= 0 && left.damage < Self::damage_limit(left) {
                    BattleOutcome::LeftCaptured
                } else {
                    BattleOutcome::LeftDestroyed
                }
            }
            (false, true) => {
                if !right.is_planet && right.crew <= 0 && right.damage < Self::damage_limit(right) {
                    BattleOutcome::RightCaptured
                } else {
                    BattleOutcome::RightDestroyed
                }
            }
            (false, false) => BattleOutcome::Timeout,
        };
    }

    fn done_battle(&mut self, left: &mut Object, right: &mut Object) {
        for obj in [left, right] {
            if obj.damage > 150 {
                obj.damage = 150;
            }
            if obj.shield < 0 {
                obj.shield = 0;
            }
            if obj.num_fighters < 0 {
                obj.num_fighters = 0;
            }
            if obj.num_torpedoes < 0 {
                obj.num_torpedoes = 0;
            }
        }
    }

    fn statistic(&self, side: Side) -> Statistic {
        match side {
            Side::Left => self.left_stat,
            Side::Right => self.right_stat,
        }
    }

    fn result(&self) -> BattleOutcome {
        self.outcome
    }
}
