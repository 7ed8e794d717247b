// src/config/mod.rs

//! Configuration loading and validation for logtrigger.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate patterns, commands and `[tail]` settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, default_config_path_in, load_and_validate, load_from_path};
pub use model::{ActionConfig, ConfigFile, RawConfigFile, TailSection, TriggerConfig};
