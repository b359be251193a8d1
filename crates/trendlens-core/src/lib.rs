//! Shared domain types and configuration for trendlens.
//!
//! Holds the pieces every other crate agrees on: canonical entity mapping,
//! the aliased signal source vocabulary with its composite weights, ISO-week
//! derivation, and the env-driven application config.

pub mod app_config;
pub mod config;
pub mod entity;
pub mod source;
pub mod week;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use entity::{color_terms, is_stop_term, item_terms, map_entity, EntityType, MappedEntity};
pub use source::Source;
pub use week::{day_from_iso, iso_week_str};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
