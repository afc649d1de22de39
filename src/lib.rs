//! RoomLink State Library
//!
//! Client-side connection and matchmaking state for VR multiplayer sessions.
//!
//! # Overview
//!
//! - **Server Failover** - Candidate servers are tried in order. Placeholders
//!   without an app id are skipped, and a full server hands over to the next.
//!
//! - **Matchmaking** - Once connected the client joins a random room on a
//!   queue, creating one under a random id when nothing matches, or joins a
//!   hidden room by name.
//!
//! - **Player Profile** - Nickname, colour and cosmetics are replicated
//!   through the network layer and persisted locally.
//!
//! # Design Principles
//!
//! 1. **No networking** - The host's SDK sits behind [`NetworkClient`] and
//!    feeds its callbacks to the coordinator's `on_*` handlers.
//!
//! 2. **One attempt at a time** - Connect and join requests are rejected
//!    while another is outstanding; stale events are ignored.
//!
//! 3. **No process exits** - Running out of servers is an error value and an
//!    event, never a shutdown.
//!
//! # Example
//!
//! ```rust
//! use roomlink_state::{
//!     AuthContext, ConnectionCoordinator, ConnectionState, CoordinatorConfig,
//!     MemoryPreferences, NetworkClient, NetworkError, PlayerProperties, RoomOptions,
//!     ServerCredential,
//! };
//!
//! #[derive(Default)]
//! struct NullClient;
//!
//! impl NetworkClient for NullClient {
//!     fn configure(&mut self, _: &str, _: &str, _: &str) {}
//!     fn connect(&mut self, _: Option<&AuthContext>) -> Result<(), NetworkError> { Ok(()) }
//!     fn disconnect(&mut self) {}
//!     fn join_random_room(&mut self, _: &PlayerProperties, _: u8) -> Result<(), NetworkError> { Ok(()) }
//!     fn create_or_join_room(&mut self, _: &str, _: &RoomOptions) -> Result<(), NetworkError> { Ok(()) }
//!     fn set_nickname(&mut self, _: &str) {}
//!     fn set_player_properties(&mut self, _: &PlayerProperties) {}
//! }
//!
//! let config = CoordinatorConfig::new(vec![
//!     ServerCredential::disabled("Spare"),
//!     ServerCredential::new("Main", "app-id", "voice-id"),
//! ]);
//! let mut coordinator = ConnectionCoordinator::new(config, NullClient, MemoryPreferences::new());
//!
//! coordinator.connect().unwrap();
//! assert_eq!(coordinator.state(), ConnectionState::Connecting);
//!
//! // The SDK reports success; the default queue is joined automatically.
//! coordinator.on_connected().unwrap();
//! assert_eq!(coordinator.state(), ConnectionState::JoiningRoom);
//!
//! // No open room: a fresh one is created instead.
//! coordinator.on_join_random_failed(32760, "No match found").unwrap();
//! coordinator.on_joined_room();
//! assert_eq!(coordinator.state(), ConnectionState::InRoom);
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod prefs;
pub mod state;

pub use config::CoordinatorConfig;
pub use error::{ConfigError, CoordinatorError, NetworkError, PreferenceError};
pub use network::{AuthContext, DisconnectReason, NetworkClient, PlayerProperties};
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore};

// Re-export everything from state module at crate root
pub use state::*;
