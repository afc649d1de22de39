//! State management module.
//!
//! - `servers` - Candidate servers and the failover cursor
//! - `connection` - The connection coordinator state machine
//! - `matchmaking` - Random/private room requests
//! - `player` - Local player profile (nickname, colour, cosmetics)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                       ConnectionCoordinator                          │
//! │                                                                      │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐    │
//! │  │ ServerCredential │  │   PendingJoin    │  │  PlayerProfile   │    │
//! │  │      list        │  │                  │  │                  │    │
//! │  │                  │  │ Random ──▶ Create│  │ nickname         │    │
//! │  │ FailoverCursor ──┼─▶│ Private          │  │ colour           │    │
//! │  │                  │  │                  │  │ cosmetics        │    │
//! │  └──────────────────┘  └──────────────────┘  └────────┬─────────┘    │
//! │                                                       │              │
//! └───────────┬───────────────────────▲───────────────────┼──────────────┘
//!             │ requests              │ on_* events       │ persist
//!             ▼                       │                   ▼
//!      ┌──────────────────────────────┴──┐       ┌─────────────────┐
//!      │          NetworkClient          │       │ PreferenceStore │
//!      └─────────────────────────────────┘       └─────────────────┘
//! ```

pub mod connection;
pub mod matchmaking;
pub mod player;
pub mod servers;

// Re-export commonly used types
pub use connection::{
    ConnectionCoordinator, ConnectionState, CoordinatorEvent, ServerStatus, DISCONNECTED_NAME,
    NO_SERVERS_NAME,
};
pub use matchmaking::{
    generate_room_id, MatchmakingRequest, PendingJoin, RoomOptions, MAX_CREATE_ATTEMPTS,
    ROOM_ID_DIGITS,
};
pub use player::{Colour, CosmeticType, CosmeticsData, PlayerProfile, DEFAULT_NICKNAME};
pub use servers::{FailoverCursor, ServerCredential};
