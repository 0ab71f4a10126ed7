use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - `remote_servers` exists (enforced by serde) and is not empty
/// - Every server has a non-empty name and url, and a non-zero timeout
/// - Server names are unique
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.remote_servers.is_empty() {
        return Err(ConfigError::ValidationError(
            "remote_servers cannot be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, server) in config.remote_servers.iter().enumerate() {
        if server.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "remote_servers[{}].name cannot be empty",
                idx
            )));
        }
        if server.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "remote_servers[{}].url cannot be empty",
                idx
            )));
        }
        if server.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "remote_servers[{}].timeout_secs must be greater than 0",
                idx
            )));
        }
        if !seen.insert(server.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate server name: {}",
                server.name
            )));
        }
    }

    Ok(())
}
