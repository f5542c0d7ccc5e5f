use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const COMPONENT_ID_PATTERN: &str = "^[a-zA-Z0-9\\-_]+$";
pub const COMPONENT_ID_MAX_LEN: usize = 100;

/// Whether a string is a well-formed component id. Says nothing about whether
/// the id exists in any snapshot.
pub fn is_valid_component_id(id: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(COMPONENT_ID_PATTERN).expect("component id pattern is a valid regex")
    });
    !id.is_empty() && id.len() <= COMPONENT_ID_MAX_LEN && re.is_match(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// One catalog record: a reusable UI component.
///
/// `full_code` is populated lazily from the backing store; search results and
/// category listings carry only the preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub code_preview: String,
    #[serde(default)]
    pub full_code: Option<String>,
}

impl Component {
    pub fn has_demo(&self) -> bool {
        self.demo_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_validation() {
        assert!(is_valid_component_id("button-primary"));
        assert!(is_valid_component_id("Modal_2"));
        assert!(!is_valid_component_id(""));
        assert!(!is_valid_component_id("has spaces"));
        assert!(!is_valid_component_id("semi;colon"));
        assert!(!is_valid_component_id(&"x".repeat(101)));
    }

    #[test]
    fn difficulty_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Difficulty::Intermediate).unwrap(),
            "\"intermediate\""
        );
        let parsed: Difficulty = serde_json::from_str("\"advanced\"").unwrap();
        assert_eq!(parsed, Difficulty::Advanced);
    }
}
