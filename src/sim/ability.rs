//! Unit abilities and the per-unit flag word.
//!
//! Every non-trivial ability occupies two bits in the flag word: a *set* bit
//! saying "an explicit value is present" and a *value* bit carrying that
//! value. When the set bit is clear, the effective state is derived from
//! race and host rules (see [crate::sim::Unit::has_ability]). Saved setups
//! carry this word verbatim, so the bit assignments must not change.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Per-unit flag word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[repr(transparent)]
    pub struct UnitFlags: u32 {
        /// Friendly-code randomisation enabled.
        const RANDOM_FC = 1;
        /// Randomize first place of the friendly code.
        const RANDOM_FC1 = 2;
        /// Randomize second place of the friendly code.
        const RANDOM_FC2 = 4;
        /// Randomize third place of the friendly code.
        const RANDOM_FC3 = 8;
        /// Use FLAK rating overrides.
        const RATING_OVERRIDE = 16;
        /// Unit is cloaked.
        const CLOAKED = 32;
        /// Ignore this unit during simulation.
        const DEACTIVATED = 64;

        const PLANET_IMMUNITY = 128;
        const PLANET_IMMUNITY_SET = 256;
        const FULL_WEAPONRY = 512;
        const FULL_WEAPONRY_SET = 1024;
        const COMMANDER = 2048;
        const COMMANDER_SET = 4096;

        const TRIPLE_BEAM_KILL = 1 << 16;
        const TRIPLE_BEAM_KILL_SET = 2 << 16;
        const DOUBLE_BEAM_CHARGE = 4 << 16;
        const DOUBLE_BEAM_CHARGE_SET = 8 << 16;
        const DOUBLE_TORPEDO_CHARGE = 16 << 16;
        const DOUBLE_TORPEDO_CHARGE_SET = 32 << 16;
        const ELUSIVE = 64 << 16;
        const ELUSIVE_SET = 128 << 16;
        const SQUADRON = 256 << 16;
        const SQUADRON_SET = 512 << 16;
        const SHIELD_GENERATOR = 1024 << 16;
        const SHIELD_GENERATOR_SET = 2048 << 16;
        const CLOAKED_BAYS = 4096 << 16;
        const CLOAKED_BAYS_SET = 8192 << 16;
    }
}

impl UnitFlags {
    /// The three friendly-code digit selectors.
    pub const RANDOM_DIGITS: UnitFlags = UnitFlags::RANDOM_FC1
        .union(UnitFlags::RANDOM_FC2)
        .union(UnitFlags::RANDOM_FC3);

    /// All ability set bits.
    pub const FUNCTION_SET_BITS: UnitFlags = UnitFlags::PLANET_IMMUNITY_SET
        .union(UnitFlags::FULL_WEAPONRY_SET)
        .union(UnitFlags::COMMANDER_SET)
        .union(UnitFlags::TRIPLE_BEAM_KILL_SET)
        .union(UnitFlags::DOUBLE_BEAM_CHARGE_SET)
        .union(UnitFlags::DOUBLE_TORPEDO_CHARGE_SET)
        .union(UnitFlags::ELUSIVE_SET)
        .union(UnitFlags::SQUADRON_SET)
        .union(UnitFlags::SHIELD_GENERATOR_SET)
        .union(UnitFlags::CLOAKED_BAYS_SET);
}

/// A non-trivial unit ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    PlanetImmunity,
    FullWeaponry,
    Commander,
    TripleBeamKill,
    DoubleBeamCharge,
    DoubleTorpedoCharge,
    Elusive,
    Squadron,
    ShieldGenerator,
    CloakedBays,
}

impl Ability {
    pub const ALL: [Ability; 10] = [
        Ability::PlanetImmunity,
        Ability::FullWeaponry,
        Ability::Commander,
        Ability::TripleBeamKill,
        Ability::DoubleBeamCharge,
        Ability::DoubleTorpedoCharge,
        Ability::Elusive,
        Ability::Squadron,
        Ability::ShieldGenerator,
        Ability::CloakedBays,
    ];

    /// Value bit of this ability in the unit flag word.
    pub fn value_bit(self) -> UnitFlags {
        match self {
            Ability::PlanetImmunity => UnitFlags::PLANET_IMMUNITY,
            Ability::FullWeaponry => UnitFlags::FULL_WEAPONRY,
            Ability::Commander => UnitFlags::COMMANDER,
            Ability::TripleBeamKill => UnitFlags::TRIPLE_BEAM_KILL,
            Ability::DoubleBeamCharge => UnitFlags::DOUBLE_BEAM_CHARGE,
            Ability::DoubleTorpedoCharge => UnitFlags::DOUBLE_TORPEDO_CHARGE,
            Ability::Elusive => UnitFlags::ELUSIVE,
            Ability::Squadron => UnitFlags::SQUADRON,
            Ability::ShieldGenerator => UnitFlags::SHIELD_GENERATOR,
            Ability::CloakedBays => UnitFlags::CLOAKED_BAYS,
        }
    }

    /// Set bit of this ability in the unit flag word.
    pub fn set_bit(self) -> UnitFlags {
        match self {
            Ability::PlanetImmunity => UnitFlags::PLANET_IMMUNITY_SET,
            Ability::FullWeaponry => UnitFlags::FULL_WEAPONRY_SET,
            Ability::Commander => UnitFlags::COMMANDER_SET,
            Ability::TripleBeamKill => UnitFlags::TRIPLE_BEAM_KILL_SET,
            Ability::DoubleBeamCharge => UnitFlags::DOUBLE_BEAM_CHARGE_SET,
            Ability::DoubleTorpedoCharge => UnitFlags::DOUBLE_TORPEDO_CHARGE_SET,
            Ability::Elusive => UnitFlags::ELUSIVE_SET,
            Ability::Squadron => UnitFlags::SQUADRON_SET,
            Ability::ShieldGenerator => UnitFlags::SHIELD_GENERATOR_SET,
            Ability::CloakedBays => UnitFlags::CLOAKED_BAYS_SET,
        }
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            Ability::PlanetImmunity => "Planet Immunity",
            Ability::FullWeaponry => "Full Weaponry",
            Ability::Commander => "Commander",
            Ability::TripleBeamKill => "3\u{d7} Beam Kill",
            Ability::DoubleBeamCharge => "2\u{d7} Beam Charge",
            Ability::DoubleTorpedoCharge => "2\u{d7} Torp Charge",
            Ability::Elusive => "Elusive",
            Ability::Squadron => "Squadron",
            Ability::ShieldGenerator => "Shield Generator",
            Ability::CloakedBays => "Cloaked Fighter Bays",
        }
    }

    fn index(self) -> u16 {
        self as u16
    }
}

/// Set of abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbilitySet(u16);

impl AbilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: Ability) {
        self.0 |= 1 << a.index();
    }

    pub fn contains(self, a: Ability) -> bool {
        self.0 & (1 << a.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Ability> {
        Ability::ALL.into_iter().filter(move |a| self.contains(*a))
    }

    /// Comma-separated display string, `"none"` when empty.
    pub fn describe(self) -> String {
        if self.is_empty() {
            "none".to_string()
        } else {
            self.iter()
                .map(Ability::label)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

impl FromIterator<Ability> for AbilitySet {
    fn from_iter<I: IntoIterator<Item = Ability>>(iter: I) -> Self {
        let mut set = AbilitySet::new();
        for a in iter {
            set.insert(a);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_word_layout_is_stable() {
        // On-disk values; changing any of these breaks saved setups.
        assert_eq!(UnitFlags::RANDOM_FC.bits(), 1);
        assert_eq!(UnitFlags::CLOAKED.bits(), 32);
        assert_eq!(UnitFlags::DEACTIVATED.bits(), 64);
        assert_eq!(UnitFlags::COMMANDER_SET.bits(), 4096);
        assert_eq!(UnitFlags::TRIPLE_BEAM_KILL.bits(), 65536);
        assert_eq!(UnitFlags::SQUADRON_SET.bits(), 512 * 65536);
        assert_eq!(UnitFlags::CLOAKED_BAYS_SET.bits(), 8192 * 65536);
    }

    #[test]
    fn set_and_value_bits_pair_up() {
        for a in Ability::ALL {
            assert_eq!(a.set_bit().bits(), a.value_bit().bits() << 1);
            assert!(UnitFlags::FUNCTION_SET_BITS.contains(a.set_bit()));
        }
    }

    #[test]
    fn ability_set_describe() {
        let mut set = AbilitySet::new();
        assert_eq!(set.describe(), "none");
        set.insert(Ability::Commander);
        set.insert(Ability::Elusive);
        assert_eq!(set.describe(), "Commander, Elusive");
        assert!(set.contains(Ability::Commander));
        assert!(!set.contains(Ability::Squadron));
    }
}
