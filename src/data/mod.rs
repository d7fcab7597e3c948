//! Read-only environment data: ship list and host configuration.

pub mod host_config;
pub mod loader;
pub mod ship_list;

pub use host_config::{mk_version, HostConfiguration, HostFamily, HostVersion, PerPlayer};
pub use loader::{load_host_config, load_setup, load_ship_list};
pub use ship_list::{
    Beam, Engine, FriendlyCodeList, Hull, HullFunction, PlayerSet, ShipList, TorpedoLauncher,
};
