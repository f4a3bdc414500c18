//! Configuration loading and validation.
//!
//! Config files: `herald.toml`, `herald.yaml`, or `herald.json`
//! Searched in `./` then `~/.config/herald/`.
//!
//! Supports `${ENV_VAR}` substitution anywhere in the file, which is how the
//! bot token is usually supplied.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, data_dir, database_path, load_config, load_or_discover},
    schema::{
        BotConfig, ChannelTarget, CheckConfig, DatabaseConfig, ForwardConfig, HeraldConfig,
        normalize_handle,
    },
    validate::{Diagnostic, Severity, ValidationResult, is_valid_handle, validate},
};
