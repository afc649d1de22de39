//! Local player profile.
//!
//! The nickname, colour and cosmetic loadout other participants see. The
//! coordinator replicates the profile through the network layer's property
//! bag and persists it to the preference store on every change.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::network::PlayerProperties;
use crate::prefs::{PreferenceStore, COLOUR_KEY, COSMETICS_KEY, USERNAME_KEY};

/// Nickname used when none has been stored.
pub const DEFAULT_NICKNAME: &str = "Player";

/// Player property holding the colour (JSON string).
pub const COLOUR_PROPERTY: &str = "Colour";

/// Player property holding the cosmetics (JSON string).
pub const COSMETICS_PROPERTY: &str = "Cosmetics";

/// RGBA display colour, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Cosmetic slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CosmeticType {
    Head,
    Face,
    Body,
    /// Sets both hand slots at once
    BothHands,
    LeftHand,
    RightHand,
}

impl fmt::Display for CosmeticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => write!(f, "Head"),
            Self::Face => write!(f, "Face"),
            Self::Body => write!(f, "Body"),
            Self::BothHands => write!(f, "BothHands"),
            Self::LeftHand => write!(f, "LeftHand"),
            Self::RightHand => write!(f, "RightHand"),
        }
    }
}

/// Cosmetic identifiers per slot. Empty means nothing equipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CosmeticsData {
    pub head: String,
    pub face: String,
    pub body: String,
    pub left_hand: String,
    pub right_hand: String,
}

impl CosmeticsData {
    /// Equip `cosmetic_id` in the given slot.
    pub fn set(&mut self, kind: CosmeticType, cosmetic_id: &str) {
        match kind {
            CosmeticType::Head => self.head = cosmetic_id.to_string(),
            CosmeticType::Face => self.face = cosmetic_id.to_string(),
            CosmeticType::Body => self.body = cosmetic_id.to_string(),
            CosmeticType::BothHands => {
                self.left_hand = cosmetic_id.to_string();
                self.right_hand = cosmetic_id.to_string();
            }
            CosmeticType::LeftHand => self.left_hand = cosmetic_id.to_string(),
            CosmeticType::RightHand => self.right_hand = cosmetic_id.to_string(),
        }
    }
}

/// The local player's replicated appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub nickname: String,
    pub colour: Colour,
    pub cosmetics: CosmeticsData,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            nickname: DEFAULT_NICKNAME.to_string(),
            colour: Colour::default(),
            cosmetics: CosmeticsData::default(),
        }
    }
}

impl PlayerProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a profile from `prefs`, keeping defaults for missing or
    /// unreadable entries.
    pub fn load(prefs: &impl PreferenceStore) -> Self {
        let mut profile = Self::default();

        if let Some(name) = prefs.get(USERNAME_KEY).filter(|n| !n.is_empty()) {
            profile.nickname = name;
        }
        if let Some(raw) = prefs.get(COLOUR_KEY).filter(|s| !s.is_empty()) {
            match serde_json::from_str(&raw) {
                Ok(colour) => profile.colour = colour,
                Err(e) => warn!(error = %e, "ignoring stored colour"),
            }
        }
        if let Some(raw) = prefs.get(COSMETICS_KEY).filter(|s| !s.is_empty()) {
            match serde_json::from_str(&raw) {
                Ok(cosmetics) => profile.cosmetics = cosmetics,
                Err(e) => warn!(error = %e, "ignoring stored cosmetics"),
            }
        }

        profile
    }

    pub fn colour_json(&self) -> String {
        serde_json::to_string(&self.colour).unwrap_or_default()
    }

    pub fn cosmetics_json(&self) -> String {
        serde_json::to_string(&self.cosmetics).unwrap_or_default()
    }

    /// Properties replicated to other participants.
    pub fn to_properties(&self) -> PlayerProperties {
        let mut props = PlayerProperties::new();
        props.insert(COLOUR_PROPERTY.to_string(), self.colour_json().into());
        props.insert(COSMETICS_PROPERTY.to_string(), self.cosmetics_json().into());
        props
    }

    /// Convert to JSON for status reporting.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "nickname": self.nickname,
            "colour": self.colour,
            "cosmetics": self.cosmetics
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferences;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_profile() {
        let profile = PlayerProfile::new();
        assert_eq!(profile.nickname, "Player");
        assert_eq!(profile.colour, Colour::WHITE);
        assert_eq!(profile.cosmetics, CosmeticsData::default());
    }

    #[test]
    fn test_set_cosmetic_slots() {
        let mut cosmetics = CosmeticsData::default();

        cosmetics.set(CosmeticType::Head, "crown");
        cosmetics.set(CosmeticType::Face, "shades");
        cosmetics.set(CosmeticType::Body, "cape");
        assert_eq!(cosmetics.head, "crown");
        assert_eq!(cosmetics.face, "shades");
        assert_eq!(cosmetics.body, "cape");

        cosmetics.set(CosmeticType::BothHands, "gloves");
        assert_eq!(cosmetics.left_hand, "gloves");
        assert_eq!(cosmetics.right_hand, "gloves");

        cosmetics.set(CosmeticType::RightHand, "ring");
        assert_eq!(cosmetics.left_hand, "gloves");
        assert_eq!(cosmetics.right_hand, "ring");
    }

    #[test]
    fn test_cosmetics_json_keys() {
        let mut cosmetics = CosmeticsData::default();
        cosmetics.set(CosmeticType::LeftHand, "watch");

        let json = serde_json::to_value(&cosmetics).unwrap();
        assert_eq!(json["LeftHand"], "watch");
        assert_eq!(json["Head"], "");

        // Missing fields fall back to empty
        let parsed: CosmeticsData = serde_json::from_str(r#"{"Face":"mask"}"#).unwrap();
        assert_eq!(parsed.face, "mask");
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn test_load_from_prefs() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(USERNAME_KEY, "Alice").unwrap();
        prefs
            .set(COLOUR_KEY, r#"{"r":0.5,"g":0.25,"b":0.0,"a":1.0}"#)
            .unwrap();
        prefs.set(COSMETICS_KEY, r#"{"Head":"tophat"}"#).unwrap();

        let profile = PlayerProfile::load(&prefs);
        assert_eq!(profile.nickname, "Alice");
        assert_eq!(profile.colour, Colour::rgb(0.5, 0.25, 0.0));
        assert_eq!(profile.cosmetics.head, "tophat");
    }

    #[test]
    fn test_load_ignores_bad_values() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(COLOUR_KEY, "purple").unwrap();
        prefs.set(COSMETICS_KEY, "[1,2,3]").unwrap();

        let profile = PlayerProfile::load(&prefs);
        assert_eq!(profile, PlayerProfile::default());
    }

    #[test]
    fn test_to_properties() {
        let profile = PlayerProfile::new();
        let props = profile.to_properties();

        assert_eq!(props.len(), 2);
        let colour: Colour =
            serde_json::from_str(props[COLOUR_PROPERTY].as_str().unwrap()).unwrap();
        assert_eq!(colour, Colour::WHITE);
        assert!(props.contains_key(COSMETICS_PROPERTY));
    }

    #[test]
    fn test_cosmetic_type_display() {
        assert_eq!(format!("{}", CosmeticType::BothHands), "BothHands");
    }
}
