// src/config/mod.rs

//! Configuration loading and validation for scalepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like non-zero timeouts (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ArchiveSection, ConfigFile, RawConfigFile, RunSection, Tool, ToolConfig, ToolsConfig,
};
