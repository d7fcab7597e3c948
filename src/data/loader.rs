//! Load ship lists, host configurations and saved setups from JSON files.
//! Graceful fallback: a missing or unreadable file yields `None` and the
//! caller decides on a default.

use std::fs;
use std::path::Path;

use crate::data::host_config::HostConfiguration;
use crate::data::ship_list::ShipList;
use crate::sim::setup::Setup;

pub const DEFAULT_SHIP_LIST_PATH: &str = "data/shiplist.json";
pub const DEFAULT_HOST_CONFIG_PATH: &str = "data/hostconfig.json";

/// Load a ship list from JSON. Returns `None` if the file is missing or invalid.
pub fn load_ship_list(path: impl AsRef<Path>) -> Option<ShipList> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

/// Load a host configuration from JSON. Returns `None` if missing or invalid.
pub fn load_host_config(path: impl AsRef<Path>) -> Option<HostConfiguration> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

/// Load a saved setup from JSON. Unlike the list loaders this reports the
/// failure text, since the setup is the user's primary input.
pub fn load_setup(path: impl AsRef<Path>) -> Result<Setup, String> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    serde_json::from_str(&data).map_err(|err| format!("cannot parse {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_fall_back() {
        assert!(load_ship_list("/nonexistent/shiplist.json").is_none());
        assert!(load_host_config("/nonexistent/hostconfig.json").is_none());
        assert!(load_setup("/nonexistent/setup.json").is_err());
    }
}
