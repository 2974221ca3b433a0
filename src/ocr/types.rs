//! Shared recognition types.

use serde::{Deserialize, Serialize};

/// Text shown in a row whose recognition call failed.
pub const RECOGNITION_UNAVAILABLE: &str = "content unavailable";

/// Outcome of one recognition call, as stored in a report row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// Text read out of the image; empty when recognition is disabled.
    pub text: String,

    /// Translated text; empty when translation is disabled or failed.
    #[serde(default)]
    pub translation: String,
}

impl Recognition {
    /// Empty pair used when recognition is disabled for the run.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sentinel pair substituted when the service call failed.
    pub fn unavailable() -> Self {
        Self {
            text: RECOGNITION_UNAVAILABLE.to_string(),
            translation: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_payload_parses() {
        let parsed: Recognition =
            serde_json::from_str(r#"{"text":"菜单","translation":"menu"}"#).unwrap();
        assert_eq!(parsed.text, "菜单");
        assert_eq!(parsed.translation, "menu");
    }

    #[test]
    fn test_missing_translation_defaults_to_empty() {
        let parsed: Recognition = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(parsed.translation, "");
    }

    #[test]
    fn test_unavailable_sentinel() {
        let r = Recognition::unavailable();
        assert_eq!(r.text, RECOGNITION_UNAVAILABLE);
        assert_eq!(r.translation, "");
    }
}
