//! Filesystem locations

use std::path::PathBuf;

/// Data directory (~/.tooluse), relative `.tooluse` when no home is known
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".tooluse"))
        .unwrap_or_else(|| PathBuf::from(".tooluse"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
