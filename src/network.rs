//! The network layer seam.
//!
//! The coordinator never talks to a transport directly. The host wraps its
//! networking SDK in a [`NetworkClient`] and forwards the SDK's callbacks to
//! the coordinator's `on_*` handlers, one at a time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::state::matchmaking::RoomOptions;

/// Replicated key/value properties of the local player.
pub type PlayerProperties = BTreeMap<String, serde_json::Value>;

/// Credentials attached to the connect handshake.
///
/// Forwarded verbatim; the coordinator never inspects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub username: String,
    pub token: String,
}

impl AuthContext {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// Why the network layer dropped the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server has no room for another connection.
    CapacityExceeded,
    /// The local client asked to disconnect.
    ClientRequested,
    /// The server stopped answering.
    ServerTimeout,
    /// The client stopped answering.
    ClientTimeout,
    /// Custom authentication was rejected.
    AuthenticationFailed,
    /// Anything else the SDK reports.
    Other(String),
}

impl DisconnectReason {
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::CapacityExceeded)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded => write!(f, "capacity exceeded"),
            Self::ClientRequested => write!(f, "client requested"),
            Self::ServerTimeout => write!(f, "server timeout"),
            Self::ClientTimeout => write!(f, "client timeout"),
            Self::AuthenticationFailed => write!(f, "authentication failed"),
            Self::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Capability supplied by the host's networking SDK.
///
/// Every request is fire-and-forget: an `Ok` only means the request was
/// dispatched. Outcomes come back later through the coordinator's handlers.
pub trait NetworkClient {
    /// Set connection parameters for the next `connect`.
    fn configure(&mut self, app_id: &str, voice_app_id: &str, region: &str);

    /// Begin a connection attempt.
    fn connect(&mut self, auth: Option<&AuthContext>) -> Result<(), NetworkError>;

    /// Tear down the current session.
    fn disconnect(&mut self);

    /// Ask to be matched into any open room whose lobby properties match `filter`.
    fn join_random_room(
        &mut self,
        filter: &PlayerProperties,
        max_players: u8,
    ) -> Result<(), NetworkError>;

    /// Join the named room, creating it with `options` if it does not exist.
    fn create_or_join_room(
        &mut self,
        room_id: &str,
        options: &RoomOptions,
    ) -> Result<(), NetworkError>;

    /// Set the replicated nickname of the local player.
    fn set_nickname(&mut self, nickname: &str);

    /// Merge `properties` into the replicated local-player property bag.
    fn set_player_properties(&mut self, properties: &PlayerProperties);
}

#[cfg(test)]
pub(crate) mod recording {
    //! A [`NetworkClient`] that records every call.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Configure {
            app_id: String,
            voice_app_id: String,
            region: String,
        },
        Connect(Option<AuthContext>),
        Disconnect,
        JoinRandom {
            filter: PlayerProperties,
            max_players: u8,
        },
        CreateOrJoin {
            room_id: String,
            options: RoomOptions,
        },
        SetNickname(String),
        SetProperties(PlayerProperties),
    }

    #[derive(Debug, Default)]
    pub struct RecordingClient {
        pub calls: Vec<Call>,
        /// When set, `connect` and room requests fail with this error.
        pub reject_with: Option<NetworkError>,
    }

    impl RecordingClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn connects(&self) -> Vec<&Option<AuthContext>> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Connect(auth) => Some(auth),
                    _ => None,
                })
                .collect()
        }

        pub fn configured_app_ids(&self) -> Vec<&str> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Configure { app_id, .. } => Some(app_id.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn creates(&self) -> Vec<(&str, &RoomOptions)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::CreateOrJoin { room_id, options } => Some((room_id.as_str(), options)),
                    _ => None,
                })
                .collect()
        }

        pub fn random_joins(&self) -> Vec<(&PlayerProperties, u8)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::JoinRandom {
                        filter,
                        max_players,
                    } => Some((filter, *max_players)),
                    _ => None,
                })
                .collect()
        }

        fn check(&self) -> Result<(), NetworkError> {
            match &self.reject_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    impl NetworkClient for RecordingClient {
        fn configure(&mut self, app_id: &str, voice_app_id: &str, region: &str) {
            self.calls.push(Call::Configure {
                app_id: app_id.to_string(),
                voice_app_id: voice_app_id.to_string(),
                region: region.to_string(),
            });
        }

        fn connect(&mut self, auth: Option<&AuthContext>) -> Result<(), NetworkError> {
            self.check()?;
            self.calls.push(Call::Connect(auth.cloned()));
            Ok(())
        }

        fn disconnect(&mut self) {
            self.calls.push(Call::Disconnect);
        }

        fn join_random_room(
            &mut self,
            filter: &PlayerProperties,
            max_players: u8,
        ) -> Result<(), NetworkError> {
            self.check()?;
            self.calls.push(Call::JoinRandom {
                filter: filter.clone(),
                max_players,
            });
            Ok(())
        }

        fn create_or_join_room(
            &mut self,
            room_id: &str,
            options: &RoomOptions,
        ) -> Result<(), NetworkError> {
            self.check()?;
            self.calls.push(Call::CreateOrJoin {
                room_id: room_id.to_string(),
                options: options.clone(),
            });
            Ok(())
        }

        fn set_nickname(&mut self, nickname: &str) {
            self.calls.push(Call::SetNickname(nickname.to_string()));
        }

        fn set_player_properties(&mut self, properties: &PlayerProperties) {
            self.calls.push(Call::SetProperties(properties.clone()));
        }
    }
}
