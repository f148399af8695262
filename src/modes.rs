//! NTD mode code presets.
//!
//! Mode codes are kept as plain strings since the dataset's mode vocabulary is
//! open-ended; these are the families callers usually ask for.

/// Bus-family modes: motorbus, bus rapid transit, commuter bus, trolleybus.
pub const BUS_MODES: &[&str] = &["MB", "RB", "CB", "TB"];

/// Rail-family modes: light, heavy, commuter, hybrid rail, streetcar, monorail.
pub const TRAIN_MODES: &[&str] = &["LR", "HR", "CR", "YR", "SR", "MG"];

/// Owned copy of a preset, ready to pass as a mode filter.
pub fn owned_modes(modes: &[&str]) -> Vec<String> {
    modes.iter().map(|m| m.to_string()).collect()
}
