use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    "https://www.weblio.jp/content/".to_string()
}

fn default_throttle_ms() -> u64 {
    1000
}

fn default_timeout_seconds() -> u64 {
    3
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Prefix the query is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Pause after every request
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_base_url(),
            throttle_ms: default_throttle_ms(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}
