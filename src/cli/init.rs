//! Init command implementation
//!
//! Writes a default `routebook.toml` into a project directory.

use super::output::Output;
use crate::utils::toml_config::{DEFAULT_CONFIG_FILE, ENV_HOST, ENV_LOG_LEVEL, ENV_PORT, RoutebookConfig};
use std::fs;
use std::path::PathBuf;

/// Result of the init operation
#[derive(Debug, PartialEq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// routebook.toml already exists
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite an existing file
    pub force: bool,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();

    let config_path = config.path.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !config.force {
        output.warning(&format!(
            "{} exists; pass --force to replace it",
            config_path.display()
        ));
        return InitResult::AlreadyExists;
    }

    if let Err(e) = fs::create_dir_all(&config.path) {
        output.error(&format!("cannot create {}: {}", config.path.display(), e));
        return InitResult::Error(e.to_string());
    }

    let content = match generate_config() {
        Ok(content) => content,
        Err(e) => {
            output.error(&format!("cannot render default configuration: {}", e));
            return InitResult::Error(e);
        }
    };
    if let Err(e) = fs::write(&config_path, content) {
        output.error(&format!("cannot write {}: {}", config_path.display(), e));
        return InitResult::Error(e.to_string());
    }
    output.wrote(&config_path.display().to_string());

    output.section("Serve the system group with");
    output.command("routebook-server");
    output.info(&format!(
        "{}, {} and {} override the file at startup",
        ENV_HOST, ENV_PORT, ENV_LOG_LEVEL
    ));

    InitResult::Success
}

/// The default configuration as commented TOML.
pub fn generate_config() -> Result<String, String> {
    let body = RoutebookConfig::default()
        .to_toml()
        .map_err(|e| e.to_string())?;
    Ok(format!(
        "# routebook server configuration\n\
         #\n\
         # logging.format is \"pretty\" or \"json\". RUST_LOG takes precedence over\n\
         # logging.level when set.\n\n{}",
        body
    ))
}
