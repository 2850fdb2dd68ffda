// src/infra/paths.rs — Config and data locations
//
// RAGNOSIS_HOME overrides everything: config lives directly under it and data
// under $RAGNOSIS_HOME/data. Otherwise config uses ~/.ragnosis/ and data uses
// the platform data directory.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

fn ragnosis_home() -> Option<PathBuf> {
    std::env::var_os("RAGNOSIS_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory on exotic systems.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $RAGNOSIS_HOME/ or ~/.ragnosis/
pub fn config_dir() -> PathBuf {
    if let Some(home) = ragnosis_home() {
        return home;
    }
    dirs_home().join(".ragnosis")
}

/// Data directory: $RAGNOSIS_HOME/data/ or the XDG data dir.
pub fn data_dir() -> PathBuf {
    if let Some(home) = ragnosis_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "ragnosis")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Analytics database path
pub fn db_path() -> PathBuf {
    data_dir().join("ragnosis_analytics.db")
}
