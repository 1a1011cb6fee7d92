//! Multi-source lookup: variants against the index in priority order, with
//! fuzzy broadening by reading and a remote fallback.

use std::collections::HashSet;

use indexmap::IndexSet;
use kotoba_config::DictionaryConfig;
use kotoba_core::{LookupContext, VariantGenerator};
use kotoba_remote::{RemoteSources, remote_label, split_stored};
use kotoba_types::{LookupEntry, SourceResults, Tag, WordVariant};

use crate::kana;

/// A pair whose reading is just the kana left in the word (e.g. 食べる【べる】)
pub fn makes_no_sense(word: &str, reading: &str) -> bool {
    word != reading && kana::hiragana_residue(word) == reading
}

/// Shared distinct characters over the larger character set
pub fn similarity(a: &str, b: &str) -> f64 {
    let left: HashSet<char> = a.chars().collect();
    let right: HashSet<char> = b.chars().collect();
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let shared = left.intersection(&right).count();
    shared as f64 / left.len().max(right.len()) as f64
}

/// Merges entries that share any definition; later spellings become alternates
pub fn combine_dupes(entries: Vec<LookupEntry>) -> Vec<LookupEntry> {
    let mut combined: Vec<LookupEntry> = Vec::new();

    for entry in entries {
        let group = combined.iter_mut().find(|existing| {
            entry
                .definitions
                .iter()
                .any(|d| existing.definitions.contains(d))
        });

        match group {
            Some(existing) => {
                let spelling = entry.word;
                if !spelling.is_empty()
                    && spelling != entry.reading
                    && spelling != existing.word
                    && !existing.alternates.contains(&spelling)
                {
                    existing.alternates.push(spelling);
                }
            }
            None => combined.push(entry),
        }
    }

    combined
}

pub struct LookupEngine<G> {
    generator: G,
    priority: Vec<String>,
    stop_at: i32,
    threshold: f64,
}

impl<G: VariantGenerator> LookupEngine<G> {
    pub fn new(generator: G, priority: Vec<String>) -> Self {
        Self {
            generator,
            priority,
            stop_at: -1,
            threshold: 0.65,
        }
    }

    pub fn from_config(generator: G, config: &DictionaryConfig) -> Self {
        Self::new(generator, config.priority_order.clone())
            .with_stop_at(config.stop_at)
            .with_threshold(config.similarity_threshold)
    }

    /// Stop once this many sources matched; zero or negative means never
    pub fn with_stop_at(mut self, stop_at: i32) -> Self {
        self.stop_at = stop_at;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Finds entries for a headword across every source, in priority order.
    ///
    /// Remote sources are only consulted when no local source matched.
    pub fn lookup(
        &self,
        ctx: &mut LookupContext,
        remote: Option<&RemoteSources<'_>>,
        word: &str,
        reading: &str,
    ) -> SourceResults {
        let variants = self.generator.variants(word, reading, &ctx.history, false);
        let input_reading = kana::hiragana_only(reading);

        let mut results = SourceResults::new();
        let mut matched = 0;

        for source in &self.priority {
            if self.stop_at > 0 && matched >= self.stop_at {
                break;
            }
            if !ctx.index.has_source(source) {
                tracing::debug!("{source} is not loaded");
                continue;
            }

            let entries = self.search_source(ctx, source, &variants, word, &input_reading);
            if entries.is_empty() {
                continue;
            }

            matched += 1;
            file_entries(&mut results, source, entries);
        }

        if results.is_empty() {
            if let Some(remote) = remote.filter(|r| r.is_enabled()) {
                results = self.fall_back_to_remote(ctx, remote, &variants);
            }
        }

        if results.is_empty() {
            tracing::info!("No entries for {word}【{reading}】");
        }

        results
    }

    fn search_source(
        &self,
        ctx: &LookupContext,
        source: &str,
        variants: &[WordVariant],
        word: &str,
        input_reading: &str,
    ) -> Vec<LookupEntry> {
        for variant in variants {
            let (surface, reading) = (variant.surface.as_str(), variant.reading.as_str());

            if !reading.is_empty() && makes_no_sense(surface, reading) {
                tracing::debug!("Skipping {variant}: reading is only the okurigana");
                continue;
            }

            if let Some(definitions) = ctx.index.definitions(source, reading, surface) {
                tracing::debug!("Exact match for {variant} in {source}");
                return vec![LookupEntry::new(
                    surface,
                    reading,
                    definitions.iter().cloned().collect(),
                )];
            }

            let phonetic = surface == reading && kana::is_hiragana(reading);
            let similar = ctx
                .index
                .words_with_reading(source, reading)
                .is_some_and(|words| {
                    words
                        .keys()
                        .any(|headword| similarity(surface, headword) >= self.threshold)
                });
            if !phonetic && !similar {
                continue;
            }

            let entries = self.entries_with_reading(ctx, source, reading);
            if entries.is_empty() {
                continue;
            }

            let (matching, others): (Vec<_>, Vec<_>) = entries.into_iter().partition(|entry| {
                entry.spellings().any(|s| s == word || s == surface)
            });
            let mut entries = if matching.is_empty() {
                others.into_iter().map(LookupEntry::guessed).collect()
            } else {
                matching
            };

            for entry in &mut entries {
                if entry.reading != input_reading {
                    entry.tag = Some(Tag::Guess);
                }
            }

            tracing::debug!("Broadened {variant} to {} entries in {source}", entries.len());
            return entries;
        }

        Vec::new()
    }

    /// Every headword filed under the first matching spelling of `reading`.
    ///
    /// Readings are tried longest first; headwords that differ from their
    /// reading sort ahead of kana-only ones.
    pub fn entries_with_reading(
        &self,
        ctx: &LookupContext,
        source: &str,
        reading: &str,
    ) -> Vec<LookupEntry> {
        let mut readings: Vec<String> = self
            .generator
            .variants(reading, reading, &ctx.history, true)
            .into_iter()
            .map(|v| v.reading)
            .filter(|r| !r.is_empty())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        readings.sort_by_key(|r| std::cmp::Reverse(r.chars().count()));

        for candidate in readings {
            let Some(words) = ctx.index.words_with_reading(source, &candidate) else {
                continue;
            };
            let mut entries: Vec<LookupEntry> = words
                .iter()
                .map(|(headword, definitions)| {
                    LookupEntry::new(
                        headword.as_str(),
                        candidate.as_str(),
                        definitions.iter().cloned().collect(),
                    )
                })
                .collect();
            entries.sort_by_key(|entry| entry.word == entry.reading);
            return combine_dupes(entries);
        }

        Vec::new()
    }

    /// Asks the remote sources about every variant in turn and merges all
    /// of their hits. A variant's reading is queried only when its surface
    /// found nothing.
    fn fall_back_to_remote(
        &self,
        ctx: &mut LookupContext,
        remote: &RemoteSources<'_>,
        variants: &[WordVariant],
    ) -> SourceResults {
        let mut tried: HashSet<String> = HashSet::new();
        let mut merged = SourceResults::new();

        for variant in variants {
            let reading = variant.reading.as_str();
            let desired = (!reading.is_empty()).then_some(reading);
            let surface = variant.surface.trim_end_matches('。');

            let mut hits = SourceResults::new();
            if !surface.is_empty() && tried.insert(surface.to_string()) {
                hits = remote.fetch(ctx, surface, desired);
            }
            if hits.is_empty() && !reading.is_empty() && tried.insert(reading.to_string()) {
                tracing::info!("Trying reading 【{reading}】");
                hits = remote.fetch(ctx, reading, desired);
            }

            for (label, entries) in hits {
                let filed = merged.entry(label).or_default();
                for entry in entries {
                    if !filed.contains(&entry) {
                        filed.push(entry);
                    }
                }
            }
        }

        merged
    }
}

/// Files a source's entries, splitting remote definitions into one label per
/// sub-dictionary
fn file_entries(results: &mut SourceResults, source: &str, entries: Vec<LookupEntry>) {
    let mut seen: Vec<Vec<String>> = Vec::new();

    for entry in entries {
        let mut local = Vec::new();
        let mut remote: Vec<(String, String)> = Vec::new();

        for definition in &entry.definitions {
            if definition.trim().is_empty() || definition == "⇒" {
                continue;
            }
            match split_stored(definition) {
                (Some(sub), text) => remote.push((remote_label(source, sub), text.to_string())),
                (None, text) => local.push(text.to_string()),
            }
        }

        if !local.is_empty() && !seen.contains(&local) {
            seen.push(local.clone());
            results.entry(source.to_string()).or_default().push(LookupEntry {
                definitions: local,
                ..entry.clone()
            });
        }

        for (label, text) in remote {
            results.entry(label).or_default().push(LookupEntry {
                definitions: vec![text],
                ..entry.clone()
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use kotoba_core::{DictionaryIndex, NotFoundCache, ReadingHistory};
    use kotoba_remote::{RemoteError, RemoteLookup};
    use kotoba_types::RemoteRecord;

    use super::*;
    use crate::variants::JapaneseVariants;

    fn engine(priority: &[&str]) -> LookupEngine<JapaneseVariants> {
        LookupEngine::new(
            JapaneseVariants::new(),
            priority.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn context(entries: &[(&str, &str, &str, &str)]) -> LookupContext {
        let mut ctx = LookupContext::new(
            DictionaryIndex::new(),
            ReadingHistory::new(),
            NotFoundCache::new(),
        );
        for (source, reading, word, definition) in entries {
            ctx.record_entry(source, reading, word, [definition.to_string()]);
        }
        ctx
    }

    #[test]
    fn honorific_word_matches_plain_entry() {
        let mut ctx = context(&[("大辞林", "いそがしい", "忙しい", "用事が多い。")]);
        let results = engine(&["大辞林"]).lookup(&mut ctx, None, "お忙しい", "おいそがしい");

        let entries = &results["大辞林"];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word, "忙しい");
        assert_eq!(entries[0].tag, None);
    }

    #[test]
    fn earlier_source_wins_when_quota_is_one() {
        let mut ctx = context(&[
            ("大辞泉", "たい", "鯛", "泉の鯛。"),
            ("大辞林", "たい", "鯛", "林の鯛。"),
        ]);
        let results = engine(&["大辞泉", "大辞林"])
            .with_stop_at(1)
            .lookup(&mut ctx, None, "鯛", "たい");

        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["大辞泉"]);
        assert_eq!(results["大辞泉"][0].tag, None);

        let results = engine(&["大辞林", "大辞泉"])
            .with_stop_at(1)
            .lookup(&mut ctx, None, "鯛", "たい");
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["大辞林"]);
    }

    #[test]
    fn unrelated_headword_under_same_reading_is_a_guess() {
        let mut ctx = context(&[("大辞林", "こうしょう", "交渉", "話し合い。")]);
        let results = engine(&["大辞林"]).lookup(&mut ctx, None, "こうしょう", "こうしょう");

        let entries = &results["大辞林"];
        assert_eq!(entries[0].word, "交渉");
        assert!(entries[0].is_guess());
    }

    #[test]
    fn kana_query_matching_a_spelling_is_confident() {
        let mut ctx = context(&[
            ("大辞林", "うそ", "嘘", "本当でないこと。"),
            ("大辞林", "うそ", "うそ", "本当でないこと。"),
        ]);
        let results = engine(&["大辞林"]).lookup(&mut ctx, None, "うそ", "うそ");
        // Exact hit on the kana spelling
        assert_eq!(results["大辞林"][0].tag, None);

        let broadened = engine(&["大辞林"]).entries_with_reading(&ctx, "大辞林", "うそ");
        assert_eq!(broadened.len(), 1);
        assert_eq!(broadened[0].word, "嘘");
    }

    #[test]
    fn incoherent_pairs_are_skipped() {
        assert!(makes_no_sense("食べる", "べる"));
        assert!(!makes_no_sense("食べる", "たべる"));
        assert!(!makes_no_sense("たべる", "たべる"));
    }

    #[test]
    fn similarity_uses_the_larger_set() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("可哀想", "可哀相"), 2.0 / 3.0);
        assert_eq!(similarity("鯛", "鯛焼き"), 1.0 / 3.0);
    }

    #[test]
    fn shared_definitions_merge_spellings() {
        let merged = combine_dupes(vec![
            LookupEntry::new("可哀想", "かわいそう", vec!["気の毒。".into()]),
            LookupEntry::new("可哀相", "かわいそう", vec!["気の毒。".into()]),
            LookupEntry::new("かわいそう", "かわいそう", vec!["気の毒。".into()]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].alternates, vec!["可哀相".to_string()]);
        assert_eq!(merged[0].display_word(), "可哀想(可哀相)");
    }

    #[test]
    fn remote_definitions_get_sub_dictionary_labels() {
        let mut ctx = context(&[("Weblio", "たい", "鯛", "デジタル大辞泉|||魚。")]);
        let results = engine(&["Weblio"]).lookup(&mut ctx, None, "鯛", "たい");
        assert_eq!(results["Weblio>デジタル大辞泉"][0].definitions, vec!["魚。"]);
    }

    /// Knows every word it is asked about and remembers the questions
    #[derive(Default)]
    struct AnswersEverything {
        queries: RefCell<Vec<String>>,
    }

    impl RemoteLookup for &AnswersEverything {
        fn name(&self) -> &str {
            "Weblio"
        }

        fn lookup(&self, query: &str, desired: Option<&str>) -> Result<Vec<RemoteRecord>, RemoteError> {
            self.queries.borrow_mut().push(query.to_string());
            Ok(vec![RemoteRecord {
                source: "辞書".into(),
                word: query.into(),
                reading: desired.unwrap_or_default().into(),
                definition: format!("{query}の説明。"),
            }])
        }
    }

    #[test]
    fn remote_hits_of_every_variant_are_merged() {
        let service = AnswersEverything::default();
        let remote = RemoteSources::disabled().with_provider(&service);
        let mut ctx = context(&[]);

        let results = engine(&["大辞林"]).lookup(&mut ctx, Some(&remote), "お忙しい", "おいそがしい");

        let queries = service.queries.borrow();
        assert!(queries.contains(&"お忙しい".to_string()));
        assert!(queries.contains(&"忙しい".to_string()));

        let words: Vec<&str> = results["Weblio>辞書"].iter().map(|e| e.word.as_str()).collect();
        assert!(words.contains(&"お忙しい"));
        assert!(words.contains(&"忙しい"));
        assert!(results["Weblio>辞書"].iter().all(LookupEntry::is_guess));

        let mut unique = queries.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), queries.len(), "a query was sent twice");
    }

    #[test]
    fn missing_word_gives_empty_results() {
        let mut ctx = context(&[("大辞林", "たい", "鯛", "魚。")]);
        assert!(engine(&["大辞林"]).lookup(&mut ctx, None, "犬", "いぬ").is_empty());
    }
}
