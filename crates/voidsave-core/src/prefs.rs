//! Starter selection preferences
//!
//! Plain JSON without big integers, so it goes through serde directly.

use crate::dex::SpeciesId;
use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Remembered starter-select choices for one species
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StarterAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nature: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub female: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiny: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion: Option<u32>,
}

/// Species id → remembered choices
pub type StarterPreferences = BTreeMap<SpeciesId, StarterAttributes>;

/// Encoded form of empty preferences
pub const EMPTY_PREFS: &str = "{}";

pub fn encode_prefs(prefs: &StarterPreferences) -> Result<String, CodecError> {
    serde_json::to_string(prefs).map_err(|e| CodecError::Syntax(e.to_string()))
}

pub fn decode_prefs(text: &str) -> Result<StarterPreferences, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::Syntax(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prefs_text() {
        assert_eq!(encode_prefs(&StarterPreferences::new()).unwrap(), EMPTY_PREFS);
        assert!(decode_prefs(EMPTY_PREFS).unwrap().is_empty());
    }

    #[test]
    fn test_only_set_fields_written() {
        let mut prefs = StarterPreferences::new();
        prefs.insert(
            25,
            StarterAttributes {
                shiny: Some(true),
                nickname: Some("Sparky".into()),
                ..Default::default()
            },
        );
        let text = encode_prefs(&prefs).unwrap();
        assert_eq!(text, r#"{"25":{"shiny":true,"nickname":"Sparky"}}"#);
        assert_eq!(decode_prefs(&text).unwrap(), prefs);
    }
}
