use std::env;
use std::path::{Path, PathBuf};

use crate::types::{PathConfig, PathConfigType};

/// Project-local config file name, searched for from the current directory upward.
pub const LOCAL_CONFIG_FILE: &str = "seeder.config.yaml";

/// Get the global config directory (~/.config/demo-seeder or $XDG_CONFIG_HOME/demo-seeder)
pub fn get_global_config_dir() -> PathBuf {
    let base = if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config")
    } else {
        PathBuf::from(".config")
    };
    base.join("demo-seeder")
}

/// Walk up from start_dir looking for seeder.config.yaml
pub fn find_local_config(start_dir: Option<&Path>) -> Option<PathBuf> {
    let start = match start_dir {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().ok()?,
    };

    let mut dir = start.as_path();

    loop {
        let config_path = dir.join(LOCAL_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => break,
        }
    }

    None
}

/// Resolve which config file to use.
/// Priority: explicit path > local config (walk up tree) > global config
pub fn resolve_paths(explicit: Option<&Path>) -> PathConfig {
    resolve_paths_from(explicit, None)
}

fn resolve_paths_from(explicit: Option<&Path>, start_dir: Option<&Path>) -> PathConfig {
    if let Some(path) = explicit {
        return PathConfig {
            config_type: PathConfigType::Explicit,
            config_path: path.to_string_lossy().to_string(),
        };
    }

    if let Some(local_config) = find_local_config(start_dir) {
        return PathConfig {
            config_type: PathConfigType::Local,
            config_path: local_config.to_string_lossy().to_string(),
        };
    }

    PathConfig {
        config_type: PathConfigType::Global,
        config_path: get_global_config_dir()
            .join("config.yaml")
            .to_string_lossy()
            .to_string(),
    }
}
