//! Configuration loading and environment overrides.
//!
//! Config files: `skillbox.toml`, `skillbox.yaml`, `skillbox.yml` or `skillbox.json`.
//! Searched in `./` then the user config directory (`~/.config/skillbox/` on Linux).
//!
//! Supports `${ENV_VAR}` substitution in the raw file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{AgentsConfig, CatalogConfig, InstallConfig, ServerConfig, SkillboxConfig},
};
