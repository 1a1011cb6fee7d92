//! Per-source text normalization.
//!
//! Each dictionary gets a row in a table of ordered [`CleanupStep`]s, keyed by
//! a suffix of the source name (folder names often carry a sort prefix).
//! Every source also runs the shared steps before and after its own.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::linker::{normalize_arrows, strip_linked};
use crate::markers;
use crate::outline;
use crate::ref_path::ReferencePath;

pub enum CleanupStep {
    Replace(&'static str, &'static str),
    Pattern(Regex, &'static str),
    /// Cut everything from the first occurrence on
    TruncateAt(&'static str),
    /// Drop this many leading lines when there is more than one line
    DropLeadingLines(usize),
    /// The definition is unusable when it contains this
    RejectIfContains(&'static str),
    /// Reject text that ends mid-sentence, unless it ends with a reference
    RejectUnterminated,
    /// Remove the headword repeated at the start
    StripHeadword,
    /// `「X」に同じ` becomes a reference to X
    SameAs(Regex),
    /// `「X」の略` adds a reference to X on its own line
    Abbreviation,
    /// `⇒A・B` becomes `⇒A ⇒B`
    SplitReferences,
}

/// How structured term-bank content is flattened for a source
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFilter {
    /// Keep only elements whose `data.name` equals this
    pub keep_only: Option<&'static str>,
    /// Skip annotation elements (etymology, accent, usage notes, ...)
    pub skip_annotations: bool,
    /// Element tags dropped entirely
    pub skip_tags: &'static [&'static str],
    /// Drop `[heading, body]` pairs whose heading just repeats the reading
    pub skip_reading_heading: bool,
}

pub struct SourceRules {
    pub suffix: &'static str,
    pub steps: Vec<CleanupStep>,
    pub content: ContentFilter,
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("Invalid cleanup pattern")
}

fn same_as(phrase: &str) -> CleanupStep {
    CleanupStep::SameAs(pattern(&format!("「([^「」]+?)」{phrase}")))
}

/// Bracketed grammar labels such as `［動ラ下一］［文］かきみだ・る［ラ下二］` or `［名］(スル)`
const GRAMMAR_LABELS: &str = r"(?:［[^］]+?］)+(?:[ぁ-ゔ・]+［[^］]+?］)?(?:《[^》]+?》)?(?:\(スル\))?";

fn builtin_rules() -> Vec<SourceRules> {
    use CleanupStep::*;

    vec![
        SourceRules {
            suffix: "大辞泉",
            steps: vec![
                DropLeadingLines(1),
                TruncateAt("[派生]"),
                // Leftovers of stripped example sentences
                Pattern(pattern(r"・(?:・|／)+"), ""),
                Pattern(pattern(r"「[ぁ-ゔ]+（(\p{Han}+)）([ぁ-ゔ]+)」"), "「$1$2」"),
                Pattern(pattern(r"［[^］]+?］「([^」]+?)」の(?:..?段化|..語)"), "⇒$1 "),
                Pattern(pattern(r"［[^］]+?］《[^》]+?》"), ""),
                Pattern(pattern(GRAMMAR_LABELS), ""),
                Pattern(pattern(r"「[^」]+?」〈[^〉]+?〉"), ""),
                Pattern(pattern(r"《[^》]+?》「[^」]+?」"), ""),
                same_as("に同じ"),
                Abbreviation,
            ],
            content: ContentFilter {
                skip_annotations: true,
                ..ContentFilter::default()
            },
        },
        SourceRules {
            suffix: "旺文社国語辞典 第十一版",
            steps: vec![
                Replace("〔違い〕", ""),
                Pattern(pattern(r" ?\([^)]+?\) 《[^》]+?》"), ""),
                DropLeadingLines(2),
                RejectIfContains("筆順："),
                RejectIfContains("字義"),
                Pattern(pattern(r"図版：\n?"), ""),
                Pattern(pattern(r"〔[^〕]+?〕[ぁ-ゔ・]+（[^）]+?）"), ""),
                TruncateAt("〘使い分け〙"),
                TruncateAt("〘ちがい〙"),
                SplitReferences,
            ],
            content: ContentFilter::default(),
        },
        SourceRules {
            suffix: "三省堂国語辞典",
            steps: vec![Replace("〔〕", ""), same_as("と同じ"), SplitReferences],
            content: ContentFilter {
                skip_annotations: true,
                ..ContentFilter::default()
            },
        },
        SourceRules {
            suffix: "大辞林",
            steps: vec![
                Replace(" ・", "・"),
                Abbreviation,
                SplitReferences,
                TruncateAt("補説欄"),
                RejectUnterminated,
            ],
            content: ContentFilter {
                skip_annotations: true,
                ..ContentFilter::default()
            },
        },
        SourceRules {
            suffix: "実用日本語表現辞典",
            steps: vec![StripHeadword],
            content: ContentFilter {
                keep_only: Some("definition"),
                skip_reading_heading: true,
                ..ContentFilter::default()
            },
        },
        SourceRules {
            suffix: "使い方の分かる 類語例解辞典",
            steps: vec![],
            content: ContentFilter {
                keep_only: Some("意味"),
                skip_reading_heading: true,
                ..ContentFilter::default()
            },
        },
        SourceRules {
            suffix: "故事・ことわざ・慣用句オンライン",
            steps: vec![],
            content: ContentFilter {
                skip_tags: &["span", "table"],
                ..ContentFilter::default()
            },
        },
        SourceRules {
            suffix: "Weblio",
            steps: vec![Pattern(pattern(GRAMMAR_LABELS), "")],
            content: ContentFilter::default(),
        },
    ]
}

fn line_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r"<br ?/?>|\\n"))
}

fn usage_notes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r"(?:\[補説\]|［補説］|［用法］|\[用法\]|\[可能\]|［可能］)[\s\S]*"))
}

/// A reference followed by marker glyphs, e.g. `⇒異化 (いか) ②`
fn reference_with_glyphs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let glyphs = regex::escape(markers::single_char_glyphs());
        pattern(&format!(
            r"⇒([^\s。、⇒〚(（{glyphs}]+)(\s?[(（][ぁ-ゔー]+[)）]\s?)?((?:[{glyphs}]|\d\x{{FE0F}}?\x{{20E3}}|\(\d{{1,2}}\))+)"
        ))
    })
}

fn chained_references() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r"⇒([^\s。、⇒・：\n]+)((?:[・：][^\s。、⇒・：\n]+)+)"))
}

fn abbreviation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r"「([^「」]+?)」の略"))
}

fn trailing_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r"⇒[^\s。⇒]+$"))
}

fn repeated_periods() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r" *。+"))
}

fn spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| pattern(r"[ 　]+"))
}

/// Rewrites the marker glyphs of every reference into `〚n〛` steps so they are
/// not mistaken for the entry's own outline
pub fn normalize_references(text: &str) -> String {
    reference_with_glyphs()
        .replace_all(text, |caps: &Captures| {
            let furigana = caps.get(2).map_or("", |m| m.as_str());
            let path = ReferencePath::parse(&caps[3]);
            format!("⇒{}{furigana}{path}", &caps[1])
        })
        .into_owned()
}

pub struct Cleaner {
    rules: Vec<SourceRules>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner {
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    pub fn with_rules(rules: Vec<SourceRules>) -> Self {
        Self { rules }
    }

    pub fn rules_for(&self, source: &str) -> Option<&SourceRules> {
        self.rules.iter().find(|r| source.ends_with(r.suffix))
    }

    pub fn content_filter(&self, source: &str) -> ContentFilter {
        self.rules_for(source)
            .map(|r| r.content)
            .unwrap_or_default()
    }

    /// Normalizes one definition. `None` means the text is not a usable definition.
    pub fn clean(&self, source: &str, word: &str, reading: &str, text: &str) -> Option<String> {
        if word.ends_with("の解説") || (word.is_empty() && reading.is_empty()) {
            return None;
        }

        let mut text = prepare(text);
        if let Some(rules) = self.rules_for(source) {
            for step in &rules.steps {
                text = apply(step, text, word)?;
            }
        }

        let text = finish(&text);
        (!text.is_empty()).then_some(text)
    }
}

fn prepare(text: &str) -> String {
    let text = line_breaks().replace_all(text, "\n");
    let text = text
        .replace('\u{a0}', " ")
        .replace("_x000D_", "")
        .replace(['\r', '\u{1}', '\u{2}'], "");
    let text = strip_linked(&text);
    let text = usage_notes().replace(text, "");
    normalize_arrows(text.trim())
}

fn finish(text: &str) -> String {
    let text = normalize_references(&normalize_arrows(text));
    let text = outline::normalize(&text);
    let text = repeated_periods().replace_all(&text, "。");
    spaces().replace_all(&text, " ").trim().to_string()
}

fn apply(step: &CleanupStep, text: String, word: &str) -> Option<String> {
    let text = match step {
        CleanupStep::Replace(from, to) => text.replace(from, to),
        CleanupStep::Pattern(re, replacement) => re.replace_all(&text, *replacement).into_owned(),
        CleanupStep::TruncateAt(marker) => match text.find(marker) {
            Some(at) => text[..at].to_string(),
            None => text,
        },
        CleanupStep::DropLeadingLines(count) => {
            let lines: Vec<&str> = text.split('\n').collect();
            if lines.len() > 1 {
                lines.iter().skip(*count).copied().collect::<Vec<_>>().join("\n")
            } else {
                text
            }
        }
        CleanupStep::RejectIfContains(marker) => {
            if text.contains(marker) {
                return None;
            }
            text
        }
        CleanupStep::RejectUnterminated => {
            let trimmed = text.trim_end();
            let terminated = trimmed.ends_with('。') || trimmed.ends_with('」');
            if !terminated && !trailing_reference().is_match(trimmed) {
                return None;
            }
            text
        }
        CleanupStep::StripHeadword => match text.strip_prefix(word) {
            Some(rest) if !word.is_empty() => rest.to_string(),
            _ => text,
        },
        CleanupStep::SameAs(re) => re.replace_all(&text, "⇒$1 ").into_owned(),
        CleanupStep::Abbreviation => {
            let added: Vec<String> = abbreviation()
                .captures_iter(&text)
                .map(|caps| format!("⇒{}。", &caps[1]))
                .filter(|reference| !text.contains(reference.as_str()))
                .collect();
            let mut text = text;
            for reference in added {
                text.push('\n');
                text.push_str(&reference);
            }
            text
        }
        CleanupStep::SplitReferences => chained_references()
            .replace_all(&text, |caps: &Captures| {
                let rest = caps[2]
                    .split(['・', '：'])
                    .filter(|s| !s.is_empty())
                    .map(|s| format!("⇒{s}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("⇒{} {rest}", &caps[1])
            })
            .into_owned(),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(source: &str, word: &str, text: &str) -> Option<String> {
        Cleaner::new().clean(source, word, "よみ", text)
    }

    #[test]
    fn reference_glyphs_become_steps() {
        assert_eq!(normalize_references("魚。⇒鯛②"), "魚。⇒鯛〚2〛");
        assert_eq!(normalize_references("⇒異化 (いか) ②❶"), "⇒異化 (いか) 〚2〛〚1〛");
        assert_eq!(normalize_references("⇒言葉"), "⇒言葉");
    }

    #[test]
    fn cited_senses_do_not_split_the_outline() {
        let text = clean("大辞林", "鯛", "①魚の一種。→鯛②\n②めでたい魚。").unwrap();
        assert_eq!(text, "└① 魚の一種。⇒鯛〚2〛\n└② めでたい魚。");
    }

    #[test]
    fn daijisen_drops_heading_and_labels() {
        let text = clean("01 大辞泉", "走る", "はし・る【走る】\n［動ラ五（四）］速く進む。").unwrap();
        assert_eq!(text, "速く進む。");
    }

    #[test]
    fn same_as_becomes_reference() {
        let text = clean("大辞泉", "ことば", "見出し\n「言葉①」に同じ。").unwrap();
        assert_eq!(text, "⇒言葉〚1〛。");
    }

    #[test]
    fn abbreviation_adds_reference_line() {
        let text = clean("大辞林", "バイト", "「アルバイト」の略。").unwrap();
        assert_eq!(text, "「アルバイト」の略。\n⇒アルバイト。");
    }

    #[test]
    fn chained_references_split() {
        let text = clean("三省堂国語辞典", "脇", "⇒脇⑦・挙げ句②。").unwrap();
        assert_eq!(text, "⇒脇〚7〛 ⇒挙げ句〚2〛。");
    }

    #[test]
    fn unusable_definitions_are_rejected() {
        assert_eq!(clean("旺文社国語辞典 第十一版", "挨", "あい【挨】\nアイ\n筆順：\n"), None);
        assert_eq!(clean("大辞林", "途中", "文が途中で終わって"), None);
        assert_eq!(clean("大辞林", "指数の解説", "説明。"), None);
        assert!(clean("大辞林", "参照", "⇒参照").is_some());
    }

    #[test]
    fn usage_notes_and_old_links_are_cut() {
        let text = clean("Weblio", "鯛", "魚。[補説]長い補足。").unwrap();
        assert_eq!(text, "魚。");
        let text = clean("Weblio", "鯛", "魚。\nLinked 鯉【こい】\n川魚。").unwrap();
        assert_eq!(text, "魚。");
    }

    #[test]
    fn headword_prefix_is_stripped() {
        let text = clean("実用日本語表現辞典", "ご自愛", "ご自愛体を大切にすること。").unwrap();
        assert_eq!(text, "体を大切にすること。");
    }

    #[test]
    fn unknown_sources_only_get_shared_steps() {
        let text = clean("自作辞書", "猫", "小さい  獣。。<br>飼われる。").unwrap();
        assert_eq!(text, "小さい 獣。\n飼われる。");
    }
}
