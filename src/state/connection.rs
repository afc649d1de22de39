//! Connection coordinator.
//!
//! Picks a server from the configured candidates, fails over to the next one
//! when a server is full, and gets the local session into a room.
//!
//! # State Diagram
//!
//! ```text
//! ┌──────────────┐  connect   ┌────────────┐  capacity exceeded
//! │ Disconnected │───────────▶│ Connecting │◀──────────┐ (next server)
//! └──────────────┘            └─────┬──┬───┘───────────┘
//!        ▲    ▲  other reason /     │  │
//!        │    └─────────────────────┘  │ connected
//!        │       exhausted             ▼
//!        │                      ┌────────────┐
//!        │     disconnect       │ Connected  │◀─────────────┐
//!        ├──────────────────────└─────┬──────┘              │
//!        │                            │ join random/private │ join failed
//!        │                            ▼                     │
//!        │                      ┌─────────────┐─────────────┘
//!        ├──────────────────────│ JoiningRoom │◀──┐ random failed
//!        │                      └─────┬───────┘───┘ (create fallback)
//!        │                            │ joined
//!        │                            ▼
//!        │                      ┌────────────┐
//!        └──────────────────────│   InRoom   │
//!                               └────────────┘
//! ```
//!
//! Every inbound handler checks that the coordinator is still in the state
//! the event belongs to. Events left over from an attempt superseded by
//! [`ConnectionCoordinator::disconnect`] are dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::network::{AuthContext, DisconnectReason, NetworkClient};
use crate::prefs::{PreferenceStore, COLOUR_KEY, COSMETICS_KEY, USERNAME_KEY};
use crate::state::matchmaking::{
    generate_room_id, validate_capacity, MatchmakingRequest, PendingJoin, RoomOptions,
    MAX_CREATE_ATTEMPTS,
};
use crate::state::player::{Colour, CosmeticType, CosmeticsData, PlayerProfile};
use crate::state::servers::{FailoverCursor, ServerCredential};

/// Server name reported once every candidate has been tried.
pub const NO_SERVERS_NAME: &str = "NONE - ALL FULL";

/// Server name reported after a normal disconnect.
pub const DISCONNECTED_NAME: &str = "Disconnected";

/// Connection state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionState {
    /// No session and no attempt outstanding
    #[default]
    Disconnected,
    /// Waiting on a connect attempt
    Connecting,
    /// Connected, not in a room
    Connected,
    /// Waiting on a join or create
    JoiningRoom,
    /// In a room
    InRoom,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::JoiningRoom => "joining_room",
            Self::InRoom => "in_room",
        }
    }

    /// Check if a session with a server is established.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::JoiningRoom | Self::InRoom)
    }

    /// Check if a connect or join attempt is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Connecting | Self::JoiningRoom)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The server currently selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub app_id: String,
    pub voice_app_id: String,

    /// When the connection was established
    pub since: Option<DateTime<Utc>>,
}

impl ServerStatus {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            app_id: String::new(),
            voice_app_id: String::new(),
            since: None,
        }
    }

    fn selected(server: &ServerCredential) -> Self {
        Self {
            name: server.name.clone(),
            app_id: server.app_id.clone(),
            voice_app_id: server.voice_app_id.clone(),
            since: None,
        }
    }
}

impl Default for ServerStatus {
    fn default() -> Self {
        Self::named(DISCONNECTED_NAME)
    }
}

/// Notifications for the host application, drained with
/// [`ConnectionCoordinator::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// A connect attempt was dispatched. `index` is zero-based.
    AttemptingServer {
        name: String,
        index: usize,
        total: usize,
    },
    ServerFull { name: String },
    /// Every candidate was disabled or full.
    ServersExhausted,
    Connected { name: String },
    Disconnected { reason: DisconnectReason },
    JoiningRoom {
        queue: Option<String>,
        room_id: Option<String>,
    },
    /// No random match; creating a room instead.
    CreatingRoom { room_id: String, attempt: u32 },
    JoinedRoom { room_id: Option<String> },
    JoinFailed { code: i16, message: String },
    /// The host should load this scene.
    SceneChangeRequested { scene_index: u32 },
    /// The local profile changed while in a room.
    LocalProfileChanged,
}

/// Drives server failover and matchmaking for one local client.
///
/// Owned by the host. The host forwards the network layer's callbacks to the
/// `on_*` methods, one at a time.
#[derive(Debug)]
pub struct ConnectionCoordinator<C, P> {
    config: CoordinatorConfig,
    client: C,
    prefs: P,
    state: ConnectionState,
    cursor: FailoverCursor,
    auth: Option<AuthContext>,
    status: ServerStatus,
    profile: PlayerProfile,

    /// The join being waited on (only while JoiningRoom)
    pending_join: Option<PendingJoin>,

    /// State to fall back to if the pending join fails
    join_origin: ConnectionState,

    /// Room identifier, when the joined room was named by us
    room_id: Option<String>,
    joined_room_at: Option<DateTime<Utc>>,

    /// A `disconnect()` tore down a live session whose confirmation has not
    /// arrived yet
    awaiting_teardown: bool,

    events: Vec<CoordinatorEvent>,
}

impl<C: NetworkClient, P: PreferenceStore> ConnectionCoordinator<C, P> {
    /// Create a coordinator. The local profile is loaded from `prefs`.
    pub fn new(config: CoordinatorConfig, client: C, prefs: P) -> Self {
        let profile = PlayerProfile::load(&prefs);
        Self {
            config,
            client,
            prefs,
            state: ConnectionState::Disconnected,
            cursor: FailoverCursor::new(),
            auth: None,
            status: ServerStatus::default(),
            profile,
            pending_join: None,
            join_origin: ConnectionState::Connected,
            room_id: None,
            joined_room_at: None,
            awaiting_teardown: false,
            events: Vec::new(),
        }
    }

    /// Host bootstrap: reload the stored profile and connect if configured to.
    pub fn start(&mut self) -> Result<(), CoordinatorError> {
        self.profile = PlayerProfile::load(&self.prefs);
        if self.config.connect_on_start {
            self.connect()?;
        }
        Ok(())
    }

    // Outbound requests

    /// Start an anonymous connect sequence from the first server.
    pub fn connect(&mut self) -> Result<(), CoordinatorError> {
        self.begin_sequence(None)
    }

    /// Start a connect sequence whose handshakes carry `username`/`token`.
    pub fn connect_authenticated(
        &mut self,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.begin_sequence(Some(AuthContext::new(username, token)))
    }

    fn begin_sequence(&mut self, auth: Option<AuthContext>) -> Result<(), CoordinatorError> {
        if self.config.servers.is_empty() {
            error!("server list is empty");
            return Err(CoordinatorError::Configuration);
        }
        match self.state {
            ConnectionState::Disconnected => {}
            state if state.is_pending() => {
                return Err(CoordinatorError::AttemptInProgress(state));
            }
            state => return Err(CoordinatorError::AlreadyConnected(state)),
        }

        self.auth = auth;
        self.cursor.reset();
        self.attempt_connection()
    }

    /// Connect to the first enabled server at or after the cursor.
    fn attempt_connection(&mut self) -> Result<(), CoordinatorError> {
        let Some(server) = self.cursor.next_enabled(&self.config.servers).cloned() else {
            error!(
                servers = self.config.servers.len(),
                "all servers are full or invalid"
            );
            self.state = ConnectionState::Disconnected;
            self.status = ServerStatus::named(NO_SERVERS_NAME);
            self.auth = None;
            self.events.push(CoordinatorEvent::ServersExhausted);
            return Err(CoordinatorError::ExhaustedCandidates);
        };

        let index = self.cursor.index();
        let total = self.config.servers.len();

        self.client
            .configure(&server.app_id, &server.voice_app_id, &self.config.region);
        self.state = ConnectionState::Connecting;
        self.status = ServerStatus::selected(&server);

        if let Err(e) = self.client.connect(self.auth.as_ref()) {
            warn!(server = %server.name, error = %e, "connect request rejected");
            self.state = ConnectionState::Disconnected;
            self.status = ServerStatus::default();
            self.events.push(CoordinatorEvent::Disconnected {
                reason: DisconnectReason::Other(e.to_string()),
            });
            return Err(e.into());
        }

        info!(
            server = %server.name,
            "attempting connection ({}/{})",
            index + 1,
            total
        );
        self.events.push(CoordinatorEvent::AttemptingServer {
            name: server.name,
            index,
            total,
        });
        Ok(())
    }

    /// Tear down the session. Always accepted; anything in flight is dropped.
    pub fn disconnect(&mut self) {
        self.client.disconnect();
        if self.state != ConnectionState::Disconnected {
            info!(from = %self.state, "disconnecting");
            self.events.push(CoordinatorEvent::Disconnected {
                reason: DisconnectReason::ClientRequested,
            });
            self.awaiting_teardown = true;
        }
        self.enter_disconnected();
    }

    fn enter_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.status = ServerStatus::default();
        self.pending_join = None;
        self.room_id = None;
        self.joined_room_at = None;
    }

    /// Be matched into any open room on `queue`, creating one if none match.
    pub fn join_random_room(
        &mut self,
        queue: impl Into<String>,
        max_players: u8,
    ) -> Result<(), CoordinatorError> {
        self.check_can_join()?;
        let request =
            MatchmakingRequest::new(queue, max_players, self.config.app_version.clone())?;

        self.client
            .join_random_room(&request.filter(), request.max_players)?;

        info!(queue = %request.queue, max_players, "joining random room");
        self.events.push(CoordinatorEvent::JoiningRoom {
            queue: Some(request.queue.clone()),
            room_id: None,
        });
        self.enter_joining(PendingJoin::Random { request });
        Ok(())
    }

    /// [`join_random_room`](Self::join_random_room) with the configured room limit.
    pub fn join_random_room_default(
        &mut self,
        queue: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.join_random_room(queue, self.config.default_room_limit)
    }

    /// Join or create a hidden room by name.
    pub fn join_private_room(
        &mut self,
        room_id: impl Into<String>,
        max_players: u8,
    ) -> Result<(), CoordinatorError> {
        self.check_can_join()?;
        validate_capacity(max_players)?;
        let room_id = room_id.into();

        self.client
            .create_or_join_room(&room_id, &RoomOptions::private(max_players))?;

        info!(room = %room_id, max_players, "joining private room");
        self.events.push(CoordinatorEvent::JoiningRoom {
            queue: None,
            room_id: Some(room_id.clone()),
        });
        self.enter_joining(PendingJoin::Private { room_id });
        Ok(())
    }

    /// [`join_private_room`](Self::join_private_room) with the configured room limit.
    pub fn join_private_room_default(
        &mut self,
        room_id: impl Into<String>,
    ) -> Result<(), CoordinatorError> {
        self.join_private_room(room_id, self.config.default_room_limit)
    }

    /// Ask the host to load a scene and match on that scene's queue.
    ///
    /// The queue name is the scene index in decimal. Nothing is requested
    /// when the join would be rejected.
    pub fn switch_scene(
        &mut self,
        scene_index: u32,
        max_players: Option<u8>,
    ) -> Result<(), CoordinatorError> {
        let max_players = max_players.unwrap_or(self.config.default_room_limit);
        self.check_can_join()?;
        validate_capacity(max_players)?;

        self.events
            .push(CoordinatorEvent::SceneChangeRequested { scene_index });
        self.join_random_room(scene_index.to_string(), max_players)
    }

    fn check_can_join(&self) -> Result<(), CoordinatorError> {
        match self.state {
            ConnectionState::Connected | ConnectionState::InRoom => Ok(()),
            state if state.is_pending() => Err(CoordinatorError::AttemptInProgress(state)),
            state => Err(CoordinatorError::NotConnected(state)),
        }
    }

    fn enter_joining(&mut self, pending: PendingJoin) {
        self.join_origin = self.state;
        self.state = ConnectionState::JoiningRoom;
        self.pending_join = Some(pending);
    }

    /// Issue the create that follows a failed random match.
    fn create_fallback(
        &mut self,
        request: MatchmakingRequest,
        attempt: u32,
    ) -> Result<(), CoordinatorError> {
        let room_id = generate_room_id();
        if let Err(e) = self
            .client
            .create_or_join_room(&room_id, &request.room_options())
        {
            warn!(room = %room_id, error = %e, "create room request rejected");
            self.abandon_join();
            return Err(e.into());
        }

        info!(room = %room_id, queue = %request.queue, attempt, "creating room");
        self.events.push(CoordinatorEvent::CreatingRoom {
            room_id: room_id.clone(),
            attempt,
        });
        self.pending_join = Some(PendingJoin::Create {
            request,
            room_id,
            attempt,
        });
        Ok(())
    }

    fn abandon_join(&mut self) {
        self.state = self.join_origin;
        self.pending_join = None;
    }

    // Inbound events

    /// The network layer reached the master server.
    pub fn on_connected(&mut self) -> Result<(), CoordinatorError> {
        if self.awaiting_teardown || self.state != ConnectionState::Connecting {
            debug!(state = %self.state, "ignoring stale connected event");
            return Ok(());
        }

        self.state = ConnectionState::Connected;
        self.status.since = Some(Utc::now());
        info!(server = %self.status.name, "connected");
        self.events.push(CoordinatorEvent::Connected {
            name: self.status.name.clone(),
        });

        self.push_profile();

        if self.config.join_room_on_connect {
            let queue = self.config.default_queue.clone();
            self.join_random_room_default(queue)?;
        }
        Ok(())
    }

    /// The network layer dropped the session.
    ///
    /// A full server while connecting moves on to the next candidate; any
    /// other reason ends the session.
    pub fn on_disconnected(&mut self, reason: DisconnectReason) -> Result<(), CoordinatorError> {
        if self.awaiting_teardown {
            // Confirms the session torn down by `disconnect()`.
            debug!(%reason, state = %self.state, "ignoring teardown of previous session");
            self.awaiting_teardown = false;
            return Ok(());
        }
        if self.state == ConnectionState::Disconnected {
            debug!(%reason, "ignoring disconnect while already disconnected");
            return Ok(());
        }

        if reason.is_capacity_exceeded() && self.state == ConnectionState::Connecting {
            let name = self.status.name.clone();
            warn!(server = %name, "server is full, trying next");
            self.events.push(CoordinatorEvent::ServerFull { name });
            self.cursor.advance();
            return self.attempt_connection();
        }

        info!(%reason, from = %self.state, "disconnected from server");
        self.events.push(CoordinatorEvent::Disconnected { reason });
        self.enter_disconnected();
        Ok(())
    }

    /// The pending join or create succeeded.
    pub fn on_joined_room(&mut self) {
        if self.state != ConnectionState::JoiningRoom {
            debug!(state = %self.state, "ignoring stale joined event");
            return;
        }

        let room_id = self
            .pending_join
            .take()
            .and_then(|p| p.room_id().map(str::to_string));
        info!(room = ?room_id, "joined a room");

        self.state = ConnectionState::InRoom;
        self.room_id = room_id.clone();
        self.joined_room_at = Some(Utc::now());
        self.events.push(CoordinatorEvent::JoinedRoom { room_id });
    }

    /// No room matched the pending random join. Falls back to creating one.
    pub fn on_join_random_failed(
        &mut self,
        code: i16,
        message: &str,
    ) -> Result<(), CoordinatorError> {
        if self.state != ConnectionState::JoiningRoom {
            debug!(state = %self.state, "ignoring stale join-random failure");
            return Ok(());
        }
        let request = match self.pending_join.take() {
            Some(PendingJoin::Random { request }) => request,
            other => {
                debug!(pending = ?other, "join-random failure with no random join pending");
                self.pending_join = other;
                return Ok(());
            }
        };

        info!(code, reason = message, queue = %request.queue, "no random room available");
        self.create_fallback(request, 1)
    }

    /// A create or join-or-create failed.
    ///
    /// Creates issued after a random-join failure are retried under a fresh
    /// identifier, up to [`MAX_CREATE_ATTEMPTS`]. Anything else returns the
    /// coordinator to where the join started.
    pub fn on_create_room_failed(
        &mut self,
        code: i16,
        message: &str,
    ) -> Result<(), CoordinatorError> {
        if self.state != ConnectionState::JoiningRoom {
            debug!(state = %self.state, "ignoring stale create failure");
            return Ok(());
        }

        match self.pending_join.take() {
            Some(PendingJoin::Create {
                request,
                room_id,
                attempt,
            }) if attempt < MAX_CREATE_ATTEMPTS => {
                warn!(room = %room_id, code, reason = message, attempt, "room create failed, retrying");
                self.create_fallback(request, attempt + 1)
            }
            Some(PendingJoin::Random { request }) => {
                // Treat like a failed match.
                self.create_fallback(request, 1)
            }
            _ => {
                warn!(code, reason = message, "room join failed");
                self.abandon_join();
                self.events.push(CoordinatorEvent::JoinFailed {
                    code,
                    message: message.to_string(),
                });
                Err(CoordinatorError::JoinFailed {
                    code,
                    message: message.to_string(),
                })
            }
        }
    }

    // Local profile

    /// Set and persist the display name.
    pub fn set_username(&mut self, name: impl Into<String>) -> Result<(), CoordinatorError> {
        self.profile.nickname = name.into();
        self.client.set_nickname(&self.profile.nickname);
        self.prefs.set(USERNAME_KEY, &self.profile.nickname)?;
        self.profile_changed();
        Ok(())
    }

    /// Set, replicate and persist the display colour.
    pub fn set_colour(&mut self, colour: Colour) -> Result<(), CoordinatorError> {
        self.profile.colour = colour;
        self.client
            .set_player_properties(&self.profile.to_properties());
        self.prefs.set(COLOUR_KEY, &self.profile.colour_json())?;
        self.profile_changed();
        Ok(())
    }

    /// Replace, replicate and persist the whole cosmetic loadout.
    pub fn set_cosmetics(&mut self, cosmetics: CosmeticsData) -> Result<(), CoordinatorError> {
        self.profile.cosmetics = cosmetics;
        self.client
            .set_player_properties(&self.profile.to_properties());
        self.prefs.set(COSMETICS_KEY, &self.profile.cosmetics_json())?;
        self.profile_changed();
        Ok(())
    }

    /// Equip one cosmetic and replicate the loadout.
    pub fn set_cosmetic(
        &mut self,
        kind: CosmeticType,
        cosmetic_id: &str,
    ) -> Result<(), CoordinatorError> {
        let mut cosmetics = self.profile.cosmetics.clone();
        cosmetics.set(kind, cosmetic_id);
        self.set_cosmetics(cosmetics)
    }

    fn push_profile(&mut self) {
        self.client.set_nickname(&self.profile.nickname);
        self.client
            .set_player_properties(&self.profile.to_properties());
    }

    fn profile_changed(&mut self) {
        if self.state == ConnectionState::InRoom {
            self.events.push(CoordinatorEvent::LocalProfileChanged);
        }
    }

    // Accessors

    /// Current state. Pure read.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> &ServerStatus {
        &self.status
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Index of the candidate currently being tried or connected to.
    pub fn cursor_index(&self) -> usize {
        self.cursor.index()
    }

    pub fn pending_join(&self) -> Option<&PendingJoin> {
        self.pending_join.as_ref()
    }

    /// Identifier of the room we are in, when it was named by us.
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn joined_room_at(&self) -> Option<DateTime<Utc>> {
        self.joined_room_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Drain pending notifications, oldest first.
    pub fn take_events(&mut self) -> Vec<CoordinatorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Convert to JSON for status reporting.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "state": self.state.as_str(),
            "server": self.status,
            "server_index": self.cursor.index(),
            "server_count": self.config.servers.len(),
            "room_id": self.room_id,
            "joined_room_at": self.joined_room_at,
            "authenticated": self.auth.is_some(),
            "profile": self.profile.to_json()
        })
    }
}
