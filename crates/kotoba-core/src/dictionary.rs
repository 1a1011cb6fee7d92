use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Definitions of one (source, reading, word) triple; never holds duplicates
pub type Definitions = IndexSet<String>;
/// Word -> definitions, for one reading of one source
pub type WordMap = IndexMap<String, Definitions>;
/// Reading -> words, for one source
pub type ReadingMap = IndexMap<String, WordMap>;

/// Every loaded dictionary, keyed source -> reading -> word -> definitions.
///
/// Entries are only ever appended during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DictionaryIndex {
    sources: IndexMap<String, ReadingMap>,
}

impl DictionaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_source(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn source(&self, source: &str) -> Option<&ReadingMap> {
        self.sources.get(source)
    }

    /// Creates an empty source if missing
    pub fn ensure_source(&mut self, source: &str) {
        if !self.sources.contains_key(source) {
            self.sources.insert(source.to_string(), ReadingMap::new());
        }
    }

    pub fn words_with_reading(&self, source: &str, reading: &str) -> Option<&WordMap> {
        self.sources.get(source)?.get(reading)
    }

    pub fn definitions(&self, source: &str, reading: &str, word: &str) -> Option<&Definitions> {
        self.words_with_reading(source, reading)?.get(word)
    }

    pub fn contains(&self, source: &str, reading: &str, word: &str) -> bool {
        self.definitions(source, reading, word).is_some()
    }

    /// Appends definitions, skipping text already present. Returns how many were new.
    pub fn insert<I>(&mut self, source: &str, reading: &str, word: &str, definitions: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let defs = self
            .sources
            .entry(source.to_string())
            .or_default()
            .entry(reading.to_string())
            .or_default()
            .entry(word.to_string())
            .or_default();

        definitions
            .into_iter()
            .filter(|d| defs.insert(d.clone()))
            .count()
    }

    /// Number of (reading, word) pairs filed under `source`
    pub fn entry_count(&self, source: &str) -> usize {
        self.sources
            .get(source)
            .map(|readings| readings.values().map(IndexMap::len).sum())
            .unwrap_or(0)
    }
}

/// Every reading ever seen for a surface form, across all sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingHistory {
    readings: IndexMap<String, IndexSet<String>>,
}

impl ReadingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the reading was not known yet. An empty reading
    /// says nothing about the word and is not kept.
    pub fn record(&mut self, word: &str, reading: &str) -> bool {
        if reading.is_empty() {
            return false;
        }
        self.readings
            .entry(word.to_string())
            .or_default()
            .insert(reading.to_string())
    }

    pub fn readings(&self, word: &str) -> impl Iterator<Item = &str> {
        self.readings
            .get(word)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn knows(&self, word: &str) -> bool {
        self.readings.get(word).is_some_and(|set| !set.is_empty())
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Queries each remote source already answered with nothing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotFoundCache {
    misses: IndexMap<String, IndexSet<String>>,
}

impl NotFoundCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, source: &str, query: &str) -> bool {
        self.misses.get(source).is_some_and(|set| set.contains(query))
    }

    pub fn insert(&mut self, source: &str, query: &str) -> bool {
        let added = self
            .misses
            .entry(source.to_string())
            .or_default()
            .insert(query.to_string());
        if added {
            tracing::debug!("{query} added to the not-found cache of {source}");
        }
        added
    }

    pub fn len(&self, source: &str) -> usize {
        self.misses.get(source).map(IndexSet::len).unwrap_or(0)
    }
}

/// The mutable state of one run, passed explicitly to every lookup and link pass
#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    pub index: DictionaryIndex,
    pub history: ReadingHistory,
    pub not_found: NotFoundCache,
}

impl LookupContext {
    pub fn new(index: DictionaryIndex, history: ReadingHistory, not_found: NotFoundCache) -> Self {
        Self {
            index,
            history,
            not_found,
        }
    }

    /// Files definitions under the index and remembers the reading
    pub fn record_entry<I>(&mut self, source: &str, reading: &str, word: &str, definitions: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        self.history.record(word, reading);
        self.index.insert(source, reading, word, definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_definitions_unique_and_ordered() {
        let mut index = DictionaryIndex::new();
        let added = index.insert("大辞林", "たい", "鯛", ["魚。".to_string(), "赤い。".to_string()]);
        assert_eq!(added, 2);

        let added = index.insert("大辞林", "たい", "鯛", ["赤い。".to_string(), "めでたい。".to_string()]);
        assert_eq!(added, 1);

        let defs: Vec<_> = index.definitions("大辞林", "たい", "鯛").unwrap().iter().cloned().collect();
        assert_eq!(defs, vec!["魚。", "赤い。", "めでたい。"]);
        assert_eq!(index.entry_count("大辞林"), 1);
    }

    #[test]
    fn index_serializes_as_nested_mapping() {
        let mut index = DictionaryIndex::new();
        index.insert("大辞泉", "", "Weblio", ["x".to_string()]);
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"{"大辞泉":{"":{"Weblio":["x"]}}}"#);

        let back: DictionaryIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn history_grows_monotonically() {
        let mut history = ReadingHistory::new();
        assert!(history.record("案内", "あんない"));
        assert!(history.record("案内", "あない"));
        assert!(!history.record("案内", "あんない"));
        assert_eq!(history.readings("案内").collect::<Vec<_>>(), vec!["あんない", "あない"]);
        assert_eq!(history.readings("未知").count(), 0);
    }

    #[test]
    fn entries_without_a_reading_leave_history_alone() {
        let mut ctx = LookupContext::default();
        assert!(!ctx.history.record("鯛", ""));

        ctx.record_entry("Weblio", "", "鯛", ["魚。".to_string()]);
        assert!(ctx.index.contains("Weblio", "", "鯛"));
        assert!(!ctx.history.knows("鯛"));
        assert_eq!(ctx.history.readings("鯛").count(), 0);
    }

    #[test]
    fn not_found_cache_is_per_source() {
        let mut cache = NotFoundCache::new();
        assert!(cache.insert("Weblio", "ほげ"));
        assert!(cache.contains("Weblio", "ほげ"));
        assert!(!cache.contains("大辞林", "ほげ"));
        assert!(!cache.insert("Weblio", "ほげ"));
    }
}
