//! Coordinator configuration.
//!
//! Loaded from JSON. Every field is optional; omitted fields take the
//! defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::state::servers::ServerCredential;

/// Default region code.
pub const DEFAULT_REGION: &str = "eu";

/// Default matchmaking queue.
pub const DEFAULT_QUEUE: &str = "Default";

/// Default room capacity.
pub const DEFAULT_ROOM_LIMIT: u8 = 16;

/// Settings for a [`ConnectionCoordinator`](crate::ConnectionCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Candidate servers in priority order
    pub servers: Vec<ServerCredential>,

    /// Fixed region passed to the network layer
    pub region: String,

    /// Queue joined automatically after connecting
    pub default_queue: String,

    /// Capacity used when a join does not name one
    pub default_room_limit: u8,

    /// Connect as soon as the coordinator is started
    pub connect_on_start: bool,

    /// Join `default_queue` as soon as a connection is established
    pub join_room_on_connect: bool,

    /// Client version; only rooms tagged with the same version are matched
    pub app_version: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            region: DEFAULT_REGION.to_string(),
            default_queue: DEFAULT_QUEUE.to_string(),
            default_room_limit: DEFAULT_ROOM_LIMIT,
            connect_on_start: true,
            join_room_on_connect: true,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl CoordinatorConfig {
    pub fn new(servers: Vec<ServerCredential>) -> Self {
        Self {
            servers,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_json_str(&contents)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_room_limit == 0 {
            return Err(ConfigError::Invalid(
                "default_room_limit must be at least 1".to_string(),
            ));
        }
        if self.default_queue.is_empty() {
            return Err(ConfigError::Invalid(
                "default_queue must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of servers with an app id.
    pub fn enabled_server_count(&self) -> usize {
        self.servers.iter().filter(|s| s.is_enabled()).count()
    }
}
