use std::env;

use serde::{Deserialize, Serialize};

pub mod anki;
pub mod dictionary;
pub mod linking;
pub mod remote;

pub use self::anki::AnkiConfig;
pub use self::dictionary::DictionaryConfig;
pub use self::linking::{LinkingConfig, SelfLinkPolicy};
pub use self::remote::RemoteConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dictionary: DictionaryConfig,
    pub anki: AnkiConfig,
    pub remote: RemoteConfig,
    pub linking: LinkingConfig,
}

impl Config {
    /// Defaults with `KOTOBA_*` environment overrides applied
    pub fn new() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        if let Ok(dir) = env::var("KOTOBA_DATA_DIR") {
            self.dictionary.data_dir = dir;
        }

        if let Ok(order) = env::var("KOTOBA_PRIORITY") {
            let order: Vec<String> = order
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !order.is_empty() {
                self.dictionary.priority_order = order;
            }
        }

        if let Some(enabled) = env::var("KOTOBA_REMOTE").ok().and_then(|v| v.parse().ok()) {
            self.remote.enabled = enabled;
        }

        self.remote.throttle_ms = env::var("KOTOBA_THROTTLE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.remote.throttle_ms);

        self.remote.timeout_seconds = env::var("KOTOBA_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.remote.timeout_seconds);

        if let Ok(url) = env::var("KOTOBA_WEBLIO_URL") {
            self.remote.base_url = url;
        }

        if let Ok(field) = env::var("KOTOBA_VOCAB_FIELD") {
            self.anki.vocab_field = field;
        }
        if let Ok(field) = env::var("KOTOBA_READING_FIELD") {
            self.anki.reading_field = field;
        }
        if let Ok(field) = env::var("KOTOBA_DEFINITION_FIELD") {
            self.anki.definition_field = field;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"remote": {"enabled": false}, "linking": {"max_length": 500}}"#)
                .unwrap();

        assert!(!config.remote.enabled);
        assert_eq!(config.remote.throttle_ms, 1000);
        assert_eq!(config.linking.max_length, 500);
        assert_eq!(config.linking.max_target_chars, 20);
        assert_eq!(config.dictionary.priority_order.last().map(String::as_str), Some("Weblio"));
        assert_eq!(config.anki.max_definitions, 3);
    }

    #[test]
    fn links_aggregate_only_the_weblio_provider_by_default() {
        let config = Config::default();
        assert_eq!(config.linking.aggregate_sources, vec!["Weblio".to_string()]);
        assert_eq!(config.dictionary.priority_order.last().map(String::as_str), Some("Weblio"));
    }

    #[test]
    fn self_link_policy_parses_snake_case() {
        let config: Config =
            serde_json::from_str(r#"{"linking": {"self_link": "skip_when_reading_matches"}}"#).unwrap();
        assert_eq!(config.linking.self_link, SelfLinkPolicy::SkipWhenReadingMatches);
    }
}
