//! Plaintext inside a bundle envelope

use serde::{Deserialize, Serialize};
use voidsave_core::SESSION_SLOTS;

/// `{profileText, sessionTexts}`, each text in codec form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BundlePayload {
    #[serde(rename = "profileText")]
    pub profile_text: String,
    /// One entry per slot, `null` for an empty slot
    #[serde(rename = "sessionTexts")]
    pub session_texts: [Option<String>; SESSION_SLOTS],
}

impl BundlePayload {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let mut payload = BundlePayload {
            profile_text: "{}".into(),
            ..Default::default()
        };
        payload.session_texts[2] = Some("{\"waveIndex\":3}".into());

        let bytes = payload.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("{\"profileText\":\"{}\",\"sessionTexts\":[null,null,"));
        assert_eq!(BundlePayload::from_bytes(&bytes).unwrap(), payload);
    }

    #[test]
    fn test_wrong_slot_count_rejected() {
        let text = br#"{"profileText":"{}","sessionTexts":[null]}"#;
        assert!(BundlePayload::from_bytes(text).is_err());
    }
}
