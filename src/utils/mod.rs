//! Configuration utilities.

/// TOML configuration (`routebook.toml`).
pub mod toml_config;
