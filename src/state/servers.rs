//! Candidate servers and the failover cursor.
//!
//! Servers are tried strictly in list order. Entries without an app id are
//! placeholders and are skipped without a connection attempt.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One backend deployment the client may connect to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerCredential {
    /// Display name
    pub name: String,

    /// Realtime app id (empty = disabled)
    pub app_id: String,

    /// Voice app id
    pub voice_app_id: String,
}

impl ServerCredential {
    pub fn new(
        name: impl Into<String>,
        app_id: impl Into<String>,
        voice_app_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            app_id: app_id.into(),
            voice_app_id: voice_app_id.into(),
        }
    }

    /// A placeholder with no app id.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self::new(name, "", "")
    }

    pub fn is_enabled(&self) -> bool {
        !self.app_id.is_empty()
    }
}

/// Index of the next candidate to try in one connect sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailoverCursor {
    index: usize,
}

impl FailoverCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Move past the current candidate.
    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// Find the first enabled candidate at or after the cursor, leaving the
    /// cursor on it. Returns `None` once the list is exhausted.
    pub fn next_enabled<'a>(
        &mut self,
        servers: &'a [ServerCredential],
    ) -> Option<&'a ServerCredential> {
        while let Some(server) = servers.get(self.index) {
            if server.is_enabled() {
                return Some(server);
            }
            debug!(server = %server.name, index = self.index, "skipping disabled server");
            self.index += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn servers() -> Vec<ServerCredential> {
        vec![
            ServerCredential::disabled("Spare0"),
            ServerCredential::disabled("Spare1"),
            ServerCredential::new("Main", "app-main", "voice-main"),
            ServerCredential::disabled("Spare3"),
            ServerCredential::new("Backup", "app-backup", "voice-backup"),
        ]
    }

    #[test]
    fn test_credential_enabled() {
        assert!(ServerCredential::new("A", "id", "").is_enabled());
        assert!(!ServerCredential::disabled("B").is_enabled());
    }

    #[test]
    fn test_cursor_skips_disabled() {
        let list = servers();
        let mut cursor = FailoverCursor::new();

        let first = cursor.next_enabled(&list).unwrap();
        assert_eq!(first.name, "Main");
        assert_eq!(cursor.index(), 2);

        // Same position until advanced
        assert_eq!(cursor.next_enabled(&list).unwrap().name, "Main");

        cursor.advance();
        let second = cursor.next_enabled(&list).unwrap();
        assert_eq!(second.name, "Backup");
        assert_eq!(cursor.index(), 4);

        cursor.advance();
        assert!(cursor.next_enabled(&list).is_none());
        assert_eq!(cursor.index(), 5);
    }

    #[test]
    fn test_cursor_all_disabled() {
        let list = vec![ServerCredential::disabled("A"), ServerCredential::disabled("B")];
        let mut cursor = FailoverCursor::new();
        assert!(cursor.next_enabled(&list).is_none());
    }

    #[test]
    fn test_cursor_reset() {
        let list = servers();
        let mut cursor = FailoverCursor::new();
        cursor.next_enabled(&list);
        cursor.advance();
        cursor.reset();
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_credential_deserialize_defaults() {
        let cred: ServerCredential = serde_json::from_str(r#"{"name":"EU"}"#).unwrap();
        assert_eq!(cred.name, "EU");
        assert!(!cred.is_enabled());
    }
}
