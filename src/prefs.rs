//! Local preference storage.
//!
//! Simple string key/value settings that outlive a session: the last display
//! name, colour and cosmetic loadout.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PreferenceError;

/// Key under which the display name is stored.
pub const USERNAME_KEY: &str = "Username";

/// Key under which the display colour is stored (JSON).
pub const COLOUR_KEY: &str = "Colour";

/// Key under which the cosmetic loadout is stored (JSON).
pub const COSMETICS_KEY: &str = "Cosmetics";

/// A string key/value settings store.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFilePreferences {
    /// Open the store at `path`. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(PreferenceError::Serialize)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(PreferenceError::Io(e)),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(PreferenceError::Io)?;
            }
        }
        let contents =
            serde_json::to_string_pretty(&self.values).map_err(PreferenceError::Serialize)?;
        fs::write(&self.path, contents).map_err(PreferenceError::Io)
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "roomlink-prefs-{}-{}-{}.json",
            name,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[test]
    fn test_memory_store() {
        let mut prefs = MemoryPreferences::new();
        assert_eq!(prefs.get(USERNAME_KEY), None);

        prefs.set(USERNAME_KEY, "Alice").unwrap();
        assert_eq!(prefs.get(USERNAME_KEY).as_deref(), Some("Alice"));

        prefs.set(USERNAME_KEY, "Bob").unwrap();
        assert_eq!(prefs.get(USERNAME_KEY).as_deref(), Some("Bob"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let path = temp_path("missing");
        let prefs = JsonFilePreferences::open(&path).unwrap();
        assert_eq!(prefs.get(USERNAME_KEY), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_persists() {
        let path = temp_path("persist");

        let mut prefs = JsonFilePreferences::open(&path).unwrap();
        prefs.set(USERNAME_KEY, "Alice").unwrap();
        prefs.set(COLOUR_KEY, r#"{"r":1.0,"g":0.0,"b":0.0,"a":1.0}"#).unwrap();

        // Reopen
        let reopened = JsonFilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get(USERNAME_KEY).as_deref(), Some("Alice"));
        assert!(reopened.get(COLOUR_KEY).unwrap().contains("\"r\":1.0"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();

        let result = JsonFilePreferences::open(&path);
        assert!(matches!(result, Err(PreferenceError::Serialize(_))));

        let _ = fs::remove_file(&path);
    }
}
