use serde::{Deserialize, Serialize};

/// Column names and output shape of converted deck exports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnkiConfig {
    pub vocab_field: String,
    pub reading_field: String,
    /// Column that gets overwritten with the new definition
    pub definition_field: String,
    /// Definitions kept per entry before linking
    pub max_definitions: usize,
    /// Show the single-definition view first
    pub text_mode_default: bool,
}

impl Default for AnkiConfig {
    fn default() -> Self {
        Self {
            vocab_field: "Vocab".to_string(),
            reading_field: "Reading".to_string(),
            definition_field: "Meaning".to_string(),
            max_definitions: 3,
            text_mode_default: true,
        }
    }
}
