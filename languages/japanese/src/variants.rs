use std::collections::HashSet;

use kotoba_core::{ReadingHistory, VariantGenerator};
use kotoba_types::WordVariant;

use crate::kana;

/// Endings stripped from headwords that were saved in an inflected or
/// phrase-bound form, longest matches included as written
const TRAILING_FORMS: &[&str] = &[
    "ような", "な", "だ", "と", "に", "した", "よう", "になる", "にする", "する", "さん",
];

/// Fixed spelling alternations tried on both the word and the reading
const KANA_SWAPS: &[(&str, &str)] = &[("ず", "づ"), ("づ", "ず"), ("じ", "ぢ"), ("ぢ", "じ")];

/// Verb stems some sources only list in kanji
const STEM_SUBSTITUTIONS: &[(&str, &str)] = &[("づく", "付く"), ("づける", "付ける")];

/// Okurigana endings written in kana by decks and in kanji by dictionaries
const OKURIGANA_SUBSTITUTIONS: &[(&str, &str)] = &[("がたい", "難い"), ("やすい", "易い")];

const DIGITS: [&str; 10] = ["〇", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

/// Hand-tuned spelling variants of a Japanese headword
#[derive(Debug, Default, Clone, Copy)]
pub struct JapaneseVariants;

impl JapaneseVariants {
    pub fn new() -> Self {
        Self
    }
}

struct Candidates {
    out: Vec<WordVariant>,
    seen: HashSet<(String, String)>,
}

impl Candidates {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, surface: impl Into<String>, reading: impl Into<String>) {
        let surface = surface.into();
        let reading = reading.into();
        if surface.is_empty() {
            return;
        }
        if self.seen.insert((surface.clone(), reading.clone())) {
            self.out.push(WordVariant::new(surface, reading));
        }
    }
}

fn drop_last_chars(text: &str, count: usize) -> String {
    let keep = text.chars().count().saturating_sub(count);
    text.chars().take(keep).collect()
}

impl VariantGenerator for JapaneseVariants {
    fn variants(
        &self,
        word: &str,
        reading: &str,
        history: &ReadingHistory,
        extended: bool,
    ) -> Vec<WordVariant> {
        let mut candidates = Candidates::new();
        candidates.push(word, reading);

        let reading = kana::hiragana_only(reading);
        let reading = reading.as_str();
        candidates.push(word, reading);

        self.kana_alternations(&mut candidates, word, reading);
        self.okurigana(&mut candidates, word, reading);
        self.honorifics(&mut candidates, word, reading);
        self.trailing_forms(&mut candidates, word, reading);

        // Reading-agnostic forms
        candidates.push(word, word);
        candidates.push(word, "");

        candidates.push(kana::to_hiragana(word), reading);

        if reading.is_empty() {
            for known in history.readings(word) {
                candidates.push(word, known);
            }
        }

        self.numerals(&mut candidates, word, reading);

        if extended {
            self.extended(&mut candidates);
        }

        candidates.out
    }
}

impl JapaneseVariants {
    fn kana_alternations(&self, candidates: &mut Candidates, word: &str, reading: &str) {
        for (from, to) in KANA_SWAPS {
            candidates.push(word.replace(from, to), reading.replace(from, to));
        }
        for (from, to) in STEM_SUBSTITUTIONS {
            candidates.push(word.replace(from, to), reading);
        }
    }

    fn okurigana(&self, candidates: &mut Candidates, word: &str, reading: &str) {
        for (from, to) in OKURIGANA_SUBSTITUTIONS {
            candidates.push(word.replace(from, to), reading);
        }

        // The reading may say いい or よい, so try both
        if word.contains("いい") {
            let replaced = word.replace("いい", "良い");
            candidates.push(replaced.as_str(), reading);
            candidates.push(replaced, reading.replace("いい", "よい"));
        }
        if word.contains("良い") {
            candidates.push(word.replace("良い", "いい"), reading);
        }
    }

    fn honorifics(&self, candidates: &mut Candidates, word: &str, reading: &str) {
        if let Some(rest) = word.strip_prefix('御') {
            if reading.contains('お') {
                candidates.push(format!("お{rest}"), reading);
            }
            if reading.contains('ご') {
                candidates.push(format!("ご{rest}"), reading);
            }
        }

        if let Some(rest) = word.strip_prefix('お') {
            let reading = reading.strip_prefix('お').unwrap_or(reading);
            candidates.push(rest, reading);
        }
    }

    fn trailing_forms(&self, candidates: &mut Candidates, word: &str, reading: &str) {
        // ズバズバ言う
        if !reading.is_empty() {
            if let Some(stem) = word.strip_suffix("言う") {
                candidates.push(stem, drop_last_chars(reading, 2));
            }
        }

        // キーボードー
        if reading.ends_with('ー') {
            candidates.push(drop_last_chars(word, 1), drop_last_chars(reading, 1));
        }

        for suffix in TRAILING_FORMS {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            let stem_reading = drop_last_chars(reading, suffix.chars().count());
            candidates.push(stem, stem_reading.as_str());

            // Past tense pointing at the dictionary form: 似た -> 似る
            if let Some(base) = stem.strip_suffix('た') {
                let base_reading = drop_last_chars(&stem_reading, 1);
                candidates.push(format!("{base}る"), format!("{base_reading}る"));
            }
        }
    }

    fn numerals(&self, candidates: &mut Candidates, word: &str, reading: &str) {
        let mut converted = String::with_capacity(word.len());
        let mut run = String::new();
        let mut changed = false;

        let mut flush = |run: &mut String, converted: &mut String| {
            if run.is_empty() {
                return;
            }
            match kanji_number(run) {
                Some(kanji) => {
                    converted.push_str(&kanji);
                    changed = true;
                }
                None => converted.push_str(run),
            }
            run.clear();
        };

        for c in word.chars() {
            if c.is_ascii_digit() || ('０'..='９').contains(&c) {
                run.push(c);
            } else {
                flush(&mut run, &mut converted);
                converted.push(c);
            }
        }
        flush(&mut run, &mut converted);

        if changed {
            candidates.push(converted, reading);
        }
    }

    /// Forms used when scanning by reading rather than by word
    fn extended(&self, candidates: &mut Candidates) {
        let snapshot: Vec<WordVariant> = candidates.out.clone();
        for variant in snapshot {
            let (w, r) = (variant.surface.as_str(), variant.reading.as_str());
            if !r.is_empty() {
                candidates.push(r, r);
            }
            if w.contains('が') && r.contains('が') {
                candidates.push(w.replace('が', ""), r.replace('が', ""));
            }
            if w.contains('々') {
                candidates.push(expand_iteration_mark(w), r);
            }
        }
    }
}

/// `1`..`100` (half or full width) as kanji numerals; `0` as 〇
fn kanji_number(digits: &str) -> Option<String> {
    let ascii: String = digits
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect();
    let n: usize = ascii.parse().ok()?;
    match n {
        0..=9 if ascii.len() == 1 => Some(DIGITS[n].to_string()),
        10..=99 => {
            let tens = if n / 10 == 1 { "" } else { DIGITS[n / 10] };
            let ones = if n % 10 == 0 { "" } else { DIGITS[n % 10] };
            Some(format!("{tens}十{ones}"))
        }
        100 => Some("百".to_string()),
        _ => None,
    }
}

/// 時々 -> 時時
fn expand_iteration_mark(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut previous: Option<char> = None;
    for c in word.chars() {
        match (c, previous) {
            ('々', Some(p)) => out.push(p),
            _ => out.push(c),
        }
        if c != '々' {
            previous = Some(c);
        }
    }
    out
}
