use std::sync::OnceLock;

use kotoba_config::Config;
use kotoba_core::LookupContext;
use kotoba_core::preprocess::Preprocessor;
use kotoba_remote::RemoteSources;
use kotoba_types::{LookupEntry, SourceResults};
use regex::Regex;

use crate::kana;
use crate::linker::Linker;
use crate::lookup::LookupEngine;
use crate::rank::rank_sources;
use crate::variants::JapaneseVariants;

/// Annotations around a headword cell. `/` keeps the first spelling, while
/// `・` and `,` keep the last.
fn headword_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"〈|～|~|/.+|^.+・|\[[^\]]+?\]|.+,| |<[^>]+?>|。|\n",
            r"|\([^)]+?\)|【[^】]+?】|〘[^〙]+?〙|［|］|（[^）]+?）|<",
        ))
        .expect("Invalid headword pattern")
    })
}

fn furigana_choice() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(.+?),.+?\]").expect("Invalid furigana pattern"))
}

fn furigana_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[.+?<br>([^<]+?)(?:<br>.+?)?\]").expect("Invalid furigana pattern")
    })
}

fn parenthesized() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\(|（|＜|<)[^)）＞>]+?(?:\)|）|＞|>)").expect("Invalid note pattern")
    })
}

/// Turns one flashcard headword into ranked, linked dictionary entries
pub struct JapaneseProcessor {
    engine: LookupEngine<JapaneseVariants>,
    linker: Linker,
    max_definitions: usize,
}

impl Preprocessor for JapaneseProcessor {}

impl JapaneseProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: LookupEngine::from_config(JapaneseVariants::new(), &config.dictionary),
            linker: Linker::new(config.linking.clone()),
            max_definitions: config.anki.max_definitions,
        }
    }

    pub fn engine(&self) -> &LookupEngine<JapaneseVariants> {
        &self.engine
    }

    /// One spelling of a headword cell, without readings, notes or markup
    pub fn clean_headword(&self, raw: &str) -> String {
        let word = headword_noise().replace_all(raw, "");
        self.process(&word)
    }

    /// Hiragana reading of a reading cell, dropping furigana markup and notes
    pub fn clean_reading(&self, raw: &str) -> String {
        let reading = self.process(raw);
        let reading = furigana_choice().replace_all(&reading, "$1");
        let reading = furigana_lines().replace_all(&reading, "[$1]");
        let reading = parenthesized().replace_all(&reading, "");
        kana::hiragana_only(reading.trim_matches(['<', '>']))
    }

    /// Cleans a deck row's headword and reading. The reading stands in for
    /// an empty headword; `None` when both are empty.
    pub fn clean_pair(&self, raw_word: &str, raw_reading: &str) -> Option<(String, String)> {
        let reading = self.clean_reading(raw_reading);
        let word = match self.clean_headword(raw_word) {
            word if word.is_empty() => reading.clone(),
            word => word,
        };
        (!word.is_empty()).then_some((word, reading))
    }

    /// Looks a headword up, links every reference in the kept definitions
    /// and ranks the sources.
    ///
    /// Identical definition lists found under several sources are kept once,
    /// under the first source. Linking never goes remote.
    pub fn convert(
        &self,
        ctx: &mut LookupContext,
        remote: Option<&RemoteSources<'_>>,
        word: &str,
        reading: &str,
    ) -> SourceResults {
        let found = self.engine.lookup(ctx, remote, word, reading);

        let mut seen: Vec<Vec<String>> = Vec::new();
        let mut results = SourceResults::new();
        for (label, entries) in found {
            let mut kept = Vec::new();
            for entry in entries {
                let mut definitions = Vec::new();
                for definition in &entry.definitions {
                    if !definitions.contains(definition) {
                        definitions.push(definition.clone());
                    }
                }
                if seen.contains(&definitions) {
                    continue;
                }
                seen.push(definitions.clone());

                definitions.truncate(self.max_definitions);
                kept.push(self.link_entry(ctx, &label, entry, definitions));
            }

            if !kept.is_empty() {
                results.insert(label, kept);
            }
        }

        rank_sources(results, self.engine.priority(), word, reading)
    }

    fn link_entry(
        &self,
        ctx: &mut LookupContext,
        label: &str,
        mut entry: LookupEntry,
        definitions: Vec<String>,
    ) -> LookupEntry {
        entry.definitions = definitions
            .into_iter()
            .map(|definition| {
                if definition.contains('⇒') {
                    self.linker
                        .link(ctx, None, &definition, label, &entry.word, &entry.reading)
                } else {
                    definition
                }
            })
            .collect();
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> JapaneseProcessor {
        JapaneseProcessor::new(&Config::default())
    }

    fn context(entries: &[(&str, &str, &str, &[&str])]) -> LookupContext {
        let mut ctx = LookupContext::default();
        for (source, reading, word, definitions) in entries {
            ctx.record_entry(source, reading, word, definitions.iter().map(|d| d.to_string()));
        }
        ctx
    }

    #[test]
    fn headwords_lose_their_annotations() {
        let p = processor();
        assert_eq!(p.clean_headword("食べる[たべる]"), "食べる");
        assert_eq!(p.clean_headword("食べる（たべる）"), "食べる");
        assert_eq!(p.clean_headword("食べる(たべる)"), "食べる");
        assert_eq!(p.clean_headword("鯛【たい】"), "鯛");
        assert_eq!(p.clean_headword("〘名〙言葉"), "言葉");
        assert_eq!(p.clean_headword("［副］〈ゆっくり～と"), "副ゆっくりと");
        assert_eq!(p.clean_headword("<b>鯛</b>。"), "鯛");
        assert_eq!(p.clean_headword(" 鯛\n"), "鯛");
    }

    #[test]
    fn headword_alternatives_pick_one_spelling() {
        let p = processor();
        assert_eq!(p.clean_headword("見る/観る"), "見る");
        assert_eq!(p.clean_headword("あれ・それ・これ"), "これ");
        assert_eq!(p.clean_headword("甲,乙"), "乙");
        assert_eq!(p.clean_headword("[た,べ]る"), "る");
    }

    #[test]
    fn readings_become_hiragana() {
        let p = processor();
        assert_eq!(p.clean_reading("[たべる, タベル]"), "たべる");
        assert_eq!(p.clean_reading("タイ（鯛）"), "たい");
        assert_eq!(p.clean_reading("<さかな>"), "");
        assert_eq!(p.clean_reading("ｻｶﾅ"), "さかな");
    }

    #[test]
    fn reading_replaces_missing_headword() {
        let p = processor();
        assert_eq!(p.clean_pair("", "タイ"), Some(("たい".to_string(), "たい".to_string())));
        assert_eq!(p.clean_pair("", ""), None);
    }

    #[test]
    fn references_are_linked() {
        let mut ctx = context(&[
            ("大辞林", "たい", "鯛", &["①魚の一種。\n②美味な赤い魚。"]),
            ("大辞林", "さかな", "魚", &["①魚の一種。⇒鯛②"]),
        ]);

        let results = processor().convert(&mut ctx, None, "魚", "さかな");

        assert_eq!(
            results["大辞林"][0].definitions,
            vec!["①魚の一種。⇒鯛②\nLinked 鯛【たい】〚2〛\n美味な赤い魚。"]
        );
    }

    #[test]
    fn repeated_definition_lists_are_kept_once() {
        let defs: &[&str] = &["一。", "二。", "三。", "四。"];
        let mut ctx = context(&[
            ("大辞泉", "さかな", "魚", defs),
            ("大辞林", "さかな", "魚", defs),
        ]);

        let results = processor().convert(&mut ctx, None, "魚", "さかな");

        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["大辞泉"]);
        assert_eq!(results["大辞泉"][0].definitions, vec!["一。", "二。", "三。"]);
    }

    #[test]
    fn unknown_words_give_nothing() {
        let mut ctx = context(&[("大辞林", "たい", "鯛", &["魚。"])]);
        assert!(processor().convert(&mut ctx, None, "鰐", "わに").is_empty());
    }
}
