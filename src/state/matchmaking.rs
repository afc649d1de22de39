//! Room matchmaking requests.
//!
//! A random join is filtered on the room's `queue` and `version` lobby
//! properties. When no room matches, the coordinator creates one under a
//! random numeric identifier carrying the same properties.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;
use crate::network::PlayerProperties;

/// Lobby property holding the queue name.
pub const QUEUE_PROPERTY: &str = "queue";

/// Lobby property holding the client version.
pub const VERSION_PROPERTY: &str = "version";

/// Decimal digits in a generated room identifier.
pub const ROOM_ID_DIGITS: usize = 5;

/// Create attempts allowed after a random join falls through.
pub const MAX_CREATE_ATTEMPTS: u32 = 8;

/// Options for a room the client may end up creating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOptions {
    /// Player capacity (1..=255)
    pub max_players: u8,

    /// Whether random matching can find the room
    pub is_visible: bool,

    /// Whether the room accepts joins
    pub is_open: bool,

    /// Properties set on the room
    pub custom_properties: PlayerProperties,

    /// Names of `custom_properties` exposed to lobby filtering
    pub lobby_properties: Vec<String>,
}

impl RoomOptions {
    /// Options for a hidden room reachable only by name.
    pub fn private(max_players: u8) -> Self {
        Self {
            max_players,
            is_visible: false,
            is_open: true,
            custom_properties: PlayerProperties::new(),
            lobby_properties: Vec::new(),
        }
    }
}

/// A request to be matched into a room on a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchmakingRequest {
    pub queue: String,
    pub max_players: u8,
    pub version: String,
}

impl MatchmakingRequest {
    /// Build a request, rejecting a zero capacity.
    pub fn new(
        queue: impl Into<String>,
        max_players: u8,
        version: impl Into<String>,
    ) -> Result<Self, CoordinatorError> {
        validate_capacity(max_players)?;
        Ok(Self {
            queue: queue.into(),
            max_players,
            version: version.into(),
        })
    }

    /// Properties used both as the join filter and on a created room.
    pub fn filter(&self) -> PlayerProperties {
        let mut props = PlayerProperties::new();
        props.insert(QUEUE_PROPERTY.to_string(), self.queue.clone().into());
        props.insert(VERSION_PROPERTY.to_string(), self.version.clone().into());
        props
    }

    /// Options for the room created when no match is found.
    pub fn room_options(&self) -> RoomOptions {
        RoomOptions {
            max_players: self.max_players,
            is_visible: true,
            is_open: true,
            custom_properties: self.filter(),
            lobby_properties: vec![QUEUE_PROPERTY.to_string(), VERSION_PROPERTY.to_string()],
        }
    }
}

/// Rooms hold at least one player.
pub fn validate_capacity(max_players: u8) -> Result<(), CoordinatorError> {
    if max_players == 0 {
        return Err(CoordinatorError::InvalidRoomCapacity(max_players));
    }
    Ok(())
}

/// Generate a zero-padded random room identifier.
pub fn generate_room_id() -> String {
    let upper = 10u32.pow(ROOM_ID_DIGITS as u32);
    let n = rand::rng().random_range(0..upper);
    format!("{:0width$}", n, width = ROOM_ID_DIGITS)
}

/// The join the coordinator is currently waiting on.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingJoin {
    /// Waiting on a random match.
    Random { request: MatchmakingRequest },

    /// Random matching failed; waiting on a create under `room_id`.
    Create {
        request: MatchmakingRequest,
        room_id: String,
        attempt: u32,
    },

    /// Waiting on a join-or-create of a named hidden room.
    Private { room_id: String },
}

impl PendingJoin {
    pub fn is_random(&self) -> bool {
        matches!(self, Self::Random { .. })
    }

    /// The room identifier requested, if one was named.
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::Random { .. } => None,
            Self::Create { room_id, .. } | Self::Private { room_id, .. } => Some(room_id),
        }
    }

    /// The queue being matched on, if any.
    pub fn queue(&self) -> Option<&str> {
        match self {
            Self::Random { request } | Self::Create { request, .. } => Some(&request.queue),
            Self::Private { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_filter() {
        let request = MatchmakingRequest::new("lobbyA", 8, "1.2.0").unwrap();
        let filter = request.filter();

        assert_eq!(filter.len(), 2);
        assert_eq!(filter[QUEUE_PROPERTY], "lobbyA");
        assert_eq!(filter[VERSION_PROPERTY], "1.2.0");
    }

    #[test]
    fn test_request_room_options() {
        let request = MatchmakingRequest::new("lobbyA", 8, "1.2.0").unwrap();
        let options = request.room_options();

        assert_eq!(options.max_players, 8);
        assert!(options.is_visible);
        assert!(options.is_open);
        assert_eq!(options.custom_properties, request.filter());
        assert_eq!(
            options.lobby_properties,
            vec!["queue".to_string(), "version".to_string()]
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = MatchmakingRequest::new("lobbyA", 0, "1.0");
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidRoomCapacity(0))
        ));
    }

    #[test]
    fn test_private_options() {
        let options = RoomOptions::private(4);
        assert!(!options.is_visible);
        assert!(options.is_open);
        assert!(options.custom_properties.is_empty());
        assert!(options.lobby_properties.is_empty());
    }

    #[test]
    fn test_generate_room_id() {
        for _ in 0..100 {
            let id = generate_room_id();
            assert_eq!(id.len(), ROOM_ID_DIGITS);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_pending_join_accessors() {
        let request = MatchmakingRequest::new("q", 4, "1").unwrap();

        let random = PendingJoin::Random {
            request: request.clone(),
        };
        assert!(random.is_random());
        assert_eq!(random.room_id(), None);
        assert_eq!(random.queue(), Some("q"));

        let create = PendingJoin::Create {
            request,
            room_id: "01234".to_string(),
            attempt: 1,
        };
        assert!(!create.is_random());
        assert_eq!(create.room_id(), Some("01234"));

        let private = PendingJoin::Private {
            room_id: "secret".to_string(),
        };
        assert_eq!(private.queue(), None);
        assert_eq!(private.room_id(), Some("secret"));
    }
}
