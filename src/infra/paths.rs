// src/infra/paths.rs — Config path resolution
//
// DEEP_RESEARCH_HOME overrides the config directory (useful for isolated runs
// and tests). Otherwise config lives in ~/.deep-research/.

use std::path::{Path, PathBuf};

const HOME_ENV: &str = "DEEP_RESEARCH_HOME";

fn home_override() -> Option<PathBuf> {
    std::env::var_os(HOME_ENV).map(PathBuf::from)
}

/// Home directory, or the current directory when it cannot be determined.
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $DEEP_RESEARCH_HOME/ or ~/.deep-research/
pub fn config_dir() -> PathBuf {
    config_dir_in(home_override(), &dirs_home())
}

fn config_dir_in(override_dir: Option<PathBuf>, home: &Path) -> PathBuf {
    override_dir.unwrap_or_else(|| home.join(".deep-research"))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
