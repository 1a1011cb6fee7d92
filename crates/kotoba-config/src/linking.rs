use serde::{Deserialize, Serialize};

/// When a reference pointing back at the entry being linked is dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfLinkPolicy {
    /// Never link an entry to its own headword
    #[default]
    AlwaysSkip,
    /// Only drop the link when it also resolved through the entry's own reading
    SkipWhenReadingMatches,
}

fn default_enabled() -> bool {
    true
}

fn default_max_length() -> usize {
    3000
}

fn default_max_target_chars() -> usize {
    20
}

fn default_max_depth() -> usize {
    2
}

fn default_aggregate_sources() -> Vec<String> {
    vec!["Weblio".to_string()]
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LinkingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Linked definitions longer than this revert to their unlinked text
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Longer reference targets are treated as parse failures
    #[serde(default = "default_max_target_chars")]
    pub max_target_chars: usize,
    /// How many times linked text is itself linked
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    pub self_link: SelfLinkPolicy,
    /// Backing sources searched when a label is not an index key
    #[serde(default = "default_aggregate_sources")]
    pub aggregate_sources: Vec<String>,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_length: default_max_length(),
            max_target_chars: default_max_target_chars(),
            max_depth: default_max_depth(),
            self_link: SelfLinkPolicy::default(),
            aggregate_sources: default_aggregate_sources(),
        }
    }
}
