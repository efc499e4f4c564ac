//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::SyncConfig;
use std::path::Path;

/// Conventional configuration file name.
pub const CONFIG_FILE_NAME: &str = "axsync.toml";

/// Upper bound on `slave.register_count` (512 KiB of register storage).
pub const MAX_REGISTER_COUNT: usize = 1 << 16;

/// Loads and validates a configuration file.
///
/// A directory is resolved to `<dir>/axsync.toml`.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SyncConfig, ConfigError> {
    let config: SyncConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks value ranges the types alone cannot express.
fn validate_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.slave.register_count == 0 {
        return Err(ConfigError::ValidationError(
            "slave.register_count must be non-zero".to_string(),
        ));
    }
    if config.slave.register_count > MAX_REGISTER_COUNT {
        return Err(ConfigError::ValidationError(format!(
            "slave.register_count {} exceeds the maximum of {MAX_REGISTER_COUNT}",
            config.slave.register_count
        )));
    }
    if config.slave.base_address % 8 != 0 {
        return Err(ConfigError::ValidationError(format!(
            "slave.base_address {:#x} is not 8-byte aligned",
            config.slave.base_address
        )));
    }
    let mapped_bytes = (config.slave.register_count as u64) * 8;
    if u64::from(config.slave.base_address) + mapped_bytes > 1 << 32 {
        return Err(ConfigError::ValidationError(
            "slave register bank extends past the 32-bit address space".to_string(),
        ));
    }
    if config.transactor.timeout_cycles == 0 {
        return Err(ConfigError::ValidationError(
            "transactor.timeout_cycles must be non-zero".to_string(),
        ));
    }
    if config.transactor.reset_cycles == 0 {
        return Err(ConfigError::ValidationError(
            "transactor.reset_cycles must be non-zero".to_string(),
        ));
    }
    if config.transactor.prot > 0b111 {
        return Err(ConfigError::ValidationError(format!(
            "transactor.prot {} does not fit in 3 bits",
            config.transactor.prot
        )));
    }
    Ok(())
}
