// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Default config file name, looked up in the user's home directory.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "logtrigger.toml";

/// Used instead of [`DEFAULT_CONFIG_FILE_NAME`] when only this one exists.
pub const FALLBACK_CONFIG_FILE_NAME: &str = "logtrigger.json";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// Files ending in `.json` are parsed as JSON, everything else as TOML. This
/// only performs deserialization; use [`load_and_validate`] for the checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: RawConfigFile = if is_json {
        serde_json::from_str(&contents)?
    } else {
        toml::from_str(&contents)?
    };

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML or JSON.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - at least one watched file,
///   - sane `[tail]` values,
///   - empty or malformed patterns,
///   - `cmd` strings that cannot be tokenized.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `~/logtrigger.toml`, or `logtrigger.toml` in the working directory when no
/// home directory can be determined. See [`default_config_path_in`].
pub fn default_config_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_default();
    default_config_path_in(&dir)
}

/// `dir/logtrigger.toml`, unless only `dir/logtrigger.json` exists.
pub fn default_config_path_in(dir: &Path) -> PathBuf {
    let toml = dir.join(DEFAULT_CONFIG_FILE_NAME);
    let json = dir.join(FALLBACK_CONFIG_FILE_NAME);
    if !toml.exists() && json.exists() {
        json
    } else {
        toml
    }
}
