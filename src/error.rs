//! Error types.

use crate::state::connection::ConnectionState;

/// Errors reported by the network layer when a request cannot be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The network layer refused the request outright.
    #[error("request rejected by network layer: {0}")]
    Rejected(String),

    /// The network layer is not in a state to accept the request.
    #[error("network layer not ready: {0}")]
    NotReady(String),
}

/// Errors produced by the connection coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// No servers are configured.
    #[error("server list is empty")]
    Configuration,

    /// Every configured server was disabled or full.
    #[error("all servers are full or invalid")]
    ExhaustedCandidates,

    /// A connect or join attempt is already outstanding.
    #[error("an attempt is already in progress (state: {0})")]
    AttemptInProgress(ConnectionState),

    /// Connect was requested while a session is already established.
    #[error("already connected (state: {0})")]
    AlreadyConnected(ConnectionState),

    /// Room operations need an established connection.
    #[error("not connected (state: {0})")]
    NotConnected(ConnectionState),

    /// Rooms hold between 1 and 255 players.
    #[error("invalid room capacity: {0}")]
    InvalidRoomCapacity(u8),

    /// Joining or creating a room failed and could not be recovered.
    #[error("failed to join room ({code}): {message}")]
    JoinFailed { code: i16, message: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Preferences(#[from] PreferenceError),
}

/// Errors raised by preference stores.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// Failed to read or write the backing file.
    #[error("preference store I/O failed: {0}")]
    Io(#[source] std::io::Error),

    /// Failed to encode or decode a stored value.
    #[error("preference value could not be (de)serialized: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors that can occur when loading coordinator configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to parse JSON content.
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}
