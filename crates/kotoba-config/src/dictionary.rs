use serde::{Deserialize, Serialize};

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_priority_order() -> Vec<String> {
    [
        "故事・ことわざ・慣用句オンライン",
        "実用日本語表現辞典",
        "使い方の分かる 類語例解辞典",
        "三省堂国語辞典",
        "旺文社国語辞典 第十一版",
        "大辞泉",
        "大辞林",
        "Weblio",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_stop_at() -> i32 {
    -1
}

fn default_similarity_threshold() -> f64 {
    0.65
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Folder holding the persisted index, reading history and caches
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Source names, most trusted first
    #[serde(default = "default_priority_order")]
    pub priority_order: Vec<String>,
    /// Stop after this many sources matched; zero or negative scans every source
    #[serde(default = "default_stop_at")]
    pub stop_at: i32,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Term-bank folders imported by `kotoba import` when none are given
    #[serde(default)]
    pub import_paths: Vec<String>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            priority_order: default_priority_order(),
            stop_at: default_stop_at(),
            similarity_threshold: default_similarity_threshold(),
            import_paths: vec![],
        }
    }
}
