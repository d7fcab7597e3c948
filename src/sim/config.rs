//! Simulation-wide configuration: emulated host, balancing, alliances.

use serde::{Deserialize, Serialize};

use crate::data::host_config::{HostConfiguration, HostFamily, HostVersion};
use crate::data::mk_version;
use crate::MAX_PLAYERS;

/// Boolean matrix over ordered player pairs, used for the alliance and
/// enemy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerBitMatrix {
    rows: [u16; MAX_PLAYERS + 1],
}

impl PlayerBitMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, from: i32, to: i32) -> bool {
        if Self::in_range(from) && Self::in_range(to) {
            self.rows[from as usize] & (1 << to) != 0
        } else {
            false
        }
    }

    pub fn set(&mut self, from: i32, to: i32, value: bool) {
        if Self::in_range(from) && Self::in_range(to) {
            if value {
                self.rows[from as usize] |= 1 << to;
            } else {
                self.rows[from as usize] &= !(1 << to);
            }
        }
    }

    pub fn clear(&mut self) {
        self.rows = [0; MAX_PLAYERS + 1];
    }

    fn in_range(player: i32) -> bool {
        (1..=MAX_PLAYERS as i32).contains(&player)
    }
}

/// Left/right balancing correction applied after packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalancingMode {
    /// No balancing.
    None,
    /// 360 kt bonus (classic Host).
    Balance360k,
    /// Master at Arms proposal.
    MasterAtArms,
}

/// Which host's combat rules are emulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostMode {
    Host,
    PHost2,
    PHost3,
    PHost4,
    Flak,
    NuHost,
}

impl HostMode {
    /// Classic Host-family rules (as opposed to PHost-family).
    pub fn is_classic(self) -> bool {
        matches!(self, HostMode::Host | HostMode::NuHost)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    alliance_settings: PlayerBitMatrix,
    enemy_settings: PlayerBitMatrix,
    engine_shield_bonus: i32,
    scotty_bonus: bool,
    random_left_right: bool,
    honor_alliances: bool,
    only_one_simulation: bool,
    seed_control: bool,
    randomize_fcodes_on_every_fight: bool,
    balancing_mode: BalancingMode,
    mode: HostMode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            alliance_settings: PlayerBitMatrix::new(),
            enemy_settings: PlayerBitMatrix::new(),
            engine_shield_bonus: 0,
            scotty_bonus: true,
            random_left_right: false,
            honor_alliances: true,
            only_one_simulation: false,
            seed_control: false,
            randomize_fcodes_on_every_fight: false,
            balancing_mode: BalancingMode::None,
            mode: HostMode::PHost4,
        }
    }
}

impl Configuration {
    /// Reset to defaults and derive the alliance matrix from a team
    /// mapping: players on the same non-zero team are mutual allies.
    pub fn load_defaults(&mut self, player_team: impl Fn(i32) -> i32) {
        self.alliance_settings.clear();
        self.enemy_settings.clear();
        self.honor_alliances = true;
        self.only_one_simulation = false;
        self.seed_control = false;
        self.randomize_fcodes_on_every_fight = false;
        for a in 1..=MAX_PLAYERS as i32 {
            for b in 1..=MAX_PLAYERS as i32 {
                if a != b && player_team(a) != 0 && player_team(a) == player_team(b) {
                    self.alliance_settings.set(a, b, true);
                }
            }
        }
    }

    /// Select the emulated host. Pulls the engine-shield bonus (for the
    /// viewpoint player) and the scotty bonus from the host configuration,
    /// and applies the per-family defaults for left/right randomisation and
    /// balancing.
    pub fn set_mode(&mut self, mode: HostMode, viewpoint_player: i32, config: &HostConfiguration) {
        self.engine_shield_bonus = if config.allow_engine_shield_bonus {
            config.engine_shield_bonus_rate.get(viewpoint_player)
        } else {
            0
        };
        self.scotty_bonus = config.allow_fed_combat_bonus;
        self.mode = mode;
        match mode {
            HostMode::PHost2 | HostMode::PHost3 | HostMode::PHost4 | HostMode::Flak => {
                self.random_left_right = true;
                self.balancing_mode = BalancingMode::None;
            }
            HostMode::Host | HostMode::NuHost => {
                self.random_left_right = false;
                self.balancing_mode = BalancingMode::Balance360k;
            }
        }
    }

    /// Select the emulated host from a host-version descriptor.
    pub fn set_mode_from_host_version(
        &mut self,
        version: HostVersion,
        viewpoint_player: i32,
        config: &HostConfiguration,
    ) {
        let mode = match version.family {
            HostFamily::Host => HostMode::Host,
            HostFamily::NuHost => HostMode::NuHost,
            HostFamily::Flak => HostMode::Flak,
            HostFamily::PHost => {
                if version.version < mk_version(3, 0, 0) {
                    HostMode::PHost2
                } else if version.version < mk_version(4, 0, 0) {
                    HostMode::PHost3
                } else {
                    HostMode::PHost4
                }
            }
        };
        self.set_mode(mode, viewpoint_player, config);
    }

    /// Experience is simulated only for hosts that support it, and only
    /// when the host configuration enables experience levels.
    pub fn is_experience_enabled(&self, config: &HostConfiguration) -> bool {
        match self.mode {
            HostMode::PHost4 | HostMode::Flak => config.num_experience_levels > 0,
            _ => false,
        }
    }

    /// Whether the emulated host uses alternative (PHost) combat.
    pub fn has_alternative_combat(&self) -> bool {
        !self.mode.is_classic()
    }

    pub fn mode(&self) -> HostMode {
        self.mode
    }

    pub fn alliance_settings(&self) -> &PlayerBitMatrix {
        &self.alliance_settings
    }

    pub fn alliance_settings_mut(&mut self) -> &mut PlayerBitMatrix {
        &mut self.alliance_settings
    }

    pub fn enemy_settings(&self) -> &PlayerBitMatrix {
        &self.enemy_settings
    }

    pub fn enemy_settings_mut(&mut self) -> &mut PlayerBitMatrix {
        &mut self.enemy_settings
    }

    pub fn engine_shield_bonus(&self) -> i32 {
        self.engine_shield_bonus
    }

    pub fn set_engine_shield_bonus(&mut self, rate: i32) {
        self.engine_shield_bonus = rate;
    }

    pub fn has_scotty_bonus(&self) -> bool {
        self.scotty_bonus
    }

    pub fn set_scotty_bonus(&mut self, enable: bool) {
        self.scotty_bonus = enable;
    }

    pub fn has_random_left_right(&self) -> bool {
        self.random_left_right
    }

    pub fn set_random_left_right(&mut self, enable: bool) {
        self.random_left_right = enable;
    }

    pub fn has_honor_alliances(&self) -> bool {
        self.honor_alliances
    }

    pub fn set_honor_alliances(&mut self, enable: bool) {
        self.honor_alliances = enable;
    }

    pub fn has_only_one_simulation(&self) -> bool {
        self.only_one_simulation
    }

    /// Disabling only-one-simulation also drops seed control, which
    /// requires it.
    pub fn set_only_one_simulation(&mut self, enable: bool) {
        self.only_one_simulation = enable;
        if !enable {
            self.seed_control = false;
        }
    }

    pub fn has_seed_control(&self) -> bool {
        self.seed_control
    }

    /// Seed control labels every run of a series with a deterministic seed;
    /// it implies only-one-simulation.
    pub fn set_seed_control(&mut self, enable: bool) {
        self.seed_control = enable;
        if enable {
            self.only_one_simulation = true;
        }
    }

    pub fn has_randomize_fcodes_on_every_fight(&self) -> bool {
        self.randomize_fcodes_on_every_fight
    }

    pub fn set_randomize_fcodes_on_every_fight(&mut self, enable: bool) {
        self.randomize_fcodes_on_every_fight = enable;
    }

    pub fn balancing_mode(&self) -> BalancingMode {
        self.balancing_mode
    }

    pub fn set_balancing_mode(&mut self, mode: BalancingMode) {
        self.balancing_mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let t = Configuration::default();
        assert_eq!(t.engine_shield_bonus(), 0);
        assert!(t.has_scotty_bonus());
        assert!(!t.has_random_left_right());
        assert!(t.has_honor_alliances());
        assert!(!t.has_only_one_simulation());
        assert!(!t.has_seed_control());
        assert!(!t.has_randomize_fcodes_on_every_fight());
        assert_eq!(t.balancing_mode(), BalancingMode::None);
        assert_eq!(t.mode(), HostMode::PHost4);
        assert!(t.has_alternative_combat());
    }

    #[test]
    fn mode_table() {
        let config = HostConfiguration::default();
        let mut t = Configuration::default();

        t.set_mode(HostMode::Host, 0, &config);
        assert!(!t.has_random_left_right());
        assert_eq!(t.balancing_mode(), BalancingMode::Balance360k);
        assert!(!t.has_alternative_combat());

        t.set_mode(HostMode::NuHost, 0, &config);
        assert!(!t.has_random_left_right());
        assert_eq!(t.balancing_mode(), BalancingMode::Balance360k);

        for mode in [HostMode::PHost2, HostMode::PHost3, HostMode::PHost4] {
            t.set_mode(mode, 0, &config);
            assert!(t.has_random_left_right());
            assert_eq!(t.balancing_mode(), BalancingMode::None);
        }
    }

    #[test]
    fn set_mode_reads_host_config() {
        let mut config = HostConfiguration::default();
        config.allow_engine_shield_bonus = true;
        config.engine_shield_bonus_rate = crate::data::PerPlayer::all(30);
        config.num_experience_levels = 3;

        let mut t = Configuration::default();
        t.set_mode(HostMode::PHost4, 0, &config);
        assert_eq!(t.engine_shield_bonus(), 30);
        assert!(t.has_scotty_bonus());
        assert!(t.is_experience_enabled(&config));

        t.set_mode(HostMode::Host, 0, &config);
        assert!(!t.is_experience_enabled(&config));

        config.allow_engine_shield_bonus = false;
        config.allow_fed_combat_bonus = false;
        config.num_experience_levels = 0;
        t.set_mode(HostMode::PHost4, 0, &config);
        assert_eq!(t.engine_shield_bonus(), 0);
        assert!(!t.has_scotty_bonus());
        assert!(!t.is_experience_enabled(&config));
    }

    #[test]
    fn mode_from_host_version() {
        let config = HostConfiguration::default();
        let mut t = Configuration::default();

        t.set_mode_from_host_version(
            HostVersion::new(HostFamily::Host, mk_version(3, 22, 48)),
            0,
            &config,
        );
        assert_eq!(t.mode(), HostMode::Host);

        t.set_mode_from_host_version(
            HostVersion::new(HostFamily::PHost, mk_version(2, 13, 0)),
            0,
            &config,
        );
        assert_eq!(t.mode(), HostMode::PHost2);

        t.set_mode_from_host_version(
            HostVersion::new(HostFamily::PHost, mk_version(3, 4, 11)),
            0,
            &config,
        );
        assert_eq!(t.mode(), HostMode::PHost3);

        t.set_mode_from_host_version(
            HostVersion::new(HostFamily::PHost, mk_version(4, 1, 0)),
            0,
            &config,
        );
        assert_eq!(t.mode(), HostMode::PHost4);

        t.set_mode_from_host_version(
            HostVersion::new(HostFamily::NuHost, mk_version(1, 0, 0)),
            0,
            &config,
        );
        assert_eq!(t.mode(), HostMode::NuHost);
    }

    #[test]
    fn seed_control_couples_with_only_one_simulation() {
        let mut t = Configuration::default();
        t.set_seed_control(true);
        assert!(t.has_seed_control());
        assert!(t.has_only_one_simulation());

        t.set_only_one_simulation(false);
        assert!(!t.has_only_one_simulation());
        assert!(!t.has_seed_control());
    }

    #[test]
    fn configuration_round_trips_through_json() {
        let config = HostConfiguration::default();
        let mut t = Configuration::default();
        t.set_mode(HostMode::Host, 0, &config);
        t.set_seed_control(true);
        t.alliance_settings_mut().set(2, 5, true);
        t.enemy_settings_mut().set(3, 4, true);

        let json = serde_json::to_string(&t).unwrap();
        let back: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(back.alliance_settings().get(2, 5));
        assert!(back.has_seed_control());
        assert_eq!(back.balancing_mode(), BalancingMode::Balance360k);
    }

    #[test]
    fn matrix_bounds() {
        let mut m = PlayerBitMatrix::new();
        m.set(2, 3, true);
        assert!(m.get(2, 3));
        assert!(!m.get(3, 2));
        m.set(0, 3, true);
        m.set(3, 13, true);
        assert!(!m.get(0, 3));
        assert!(!m.get(3, 13));
        m.set(2, 3, false);
        assert!(!m.get(2, 3));
    }

    #[test]
    fn load_defaults_builds_alliances_from_teams() {
        let mut t = Configuration::default();
        t.set_seed_control(true);
        // Players 1 and 2 on team 1, player 3 on team 2, rest unassigned.
        t.load_defaults(|p| match p {
            1 | 2 => 1,
            3 => 2,
            _ => 0,
        });
        assert!(!t.has_seed_control());
        assert!(t.alliance_settings().get(1, 2));
        assert!(t.alliance_settings().get(2, 1));
        assert!(!t.alliance_settings().get(1, 3));
        assert!(!t.alliance_settings().get(4, 5));
    }
}
