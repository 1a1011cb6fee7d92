use std::path::Path;

use kotoba_core::{LoadError, LookupContext};
use kotoba_dictionary::TermBankRow;
use kotoba_dictionary::loaders::{read_term_bank, term_bank_files};
use serde_json::Value;

use crate::cleanup::{Cleaner, ContentFilter};
use crate::kana;
use crate::markers;

/// `data.name` values of annotation blocks that are not part of a definition
const ANNOTATIONS: &[&str] = &[
    "違い", "派生", "区別", "百科", "アクセント", "表記", "品詞", "用例", "対義語", "注記",
    "歴史仮名", "ルビ", "見出", "可能形", "異字同訓",
];

const KANSUUJI: [&str; 10] = ["一", "二", "三", "四", "五", "六", "七", "八", "九", "十"];

/// Imports term-bank dictionary folders into the index
pub struct TermBankLoader {
    cleaner: Cleaner,
}

impl Default for TermBankLoader {
    fn default() -> Self {
        Self::new(Cleaner::new())
    }
}

impl TermBankLoader {
    pub fn new(cleaner: Cleaner) -> Self {
        Self { cleaner }
    }

    /// Loads every term bank of `dir`, filed under the folder's name
    pub fn load_dir(&self, ctx: &mut LookupContext, dir: &Path) -> Result<usize, LoadError> {
        let source = dir
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| LoadError::InvalidFormat(format!("{} has no folder name", dir.display())))?;
        self.load_source(ctx, source, dir)
    }

    pub fn load_source(
        &self,
        ctx: &mut LookupContext,
        source: &str,
        dir: &Path,
    ) -> Result<usize, LoadError> {
        tracing::info!("Adding from {}", dir.display());
        ctx.index.ensure_source(source);

        let mut added = 0;
        for file in term_bank_files(dir)? {
            for row in read_term_bank(&file)? {
                added += self.import_row(ctx, source, &row);
            }
        }

        tracing::info!(
            "Loaded {added} definitions into {source} ({} entries)",
            ctx.index.entry_count(source)
        );
        Ok(added)
    }

    /// Cleans one row and files what survives. Returns how many definitions were new.
    pub fn import_row(&self, ctx: &mut LookupContext, source: &str, row: &TermBankRow) -> usize {
        // Sub-entries and phrases are listed under their parent entry
        if matches!(row.def_tags.as_str(), "子" | "句") {
            return 0;
        }

        let reading = if row.reading.is_empty() {
            kana::hiragana_only(&row.word)
        } else {
            kana::hiragana_only(&row.reading)
        };
        let word = row.word.replace('＝', "");
        if word.is_empty() || word.chars().all(|c| c.is_ascii_digit() || ('０'..='９').contains(&c)) {
            tracing::debug!("Skipping headword {:?}", row.word);
            return 0;
        }

        let filter = self.cleaner.content_filter(source);
        let definitions: Vec<String> = row
            .definitions
            .iter()
            .map(|content| flatten_content(content, &filter, &reading))
            .filter_map(|text| self.cleaner.clean(source, &word, &reading, &text))
            .filter(|definition| !definition.contains("Weblio"))
            .collect();

        if definitions.is_empty() {
            return 0;
        }
        ctx.record_entry(source, &reading, &word, definitions)
    }
}

/// Flattens a plain or structured-content definition to text
pub fn flatten_content(content: &Value, filter: &ContentFilter, reading: &str) -> String {
    let mut out = String::new();
    flatten(content, filter, reading, &mut out);
    out
}

fn flatten(value: &Value, filter: &ContentFilter, reading: &str, out: &mut String) {
    match value {
        Value::String(text) => out.push_str(text),
        Value::Array(items) => {
            // [reading heading, body] pairs where only the heading is a repeat
            if filter.skip_reading_heading
                && items.len() == 2
                && items[0].get("content").and_then(Value::as_str) == Some(reading)
            {
                return;
            }
            for item in items {
                flatten(item, filter, reading, out);
            }
        }
        Value::Object(map) => {
            let kind = map.get("type").and_then(Value::as_str);
            if kind == Some("text") {
                if let Some(text) = map.get("text").and_then(Value::as_str) {
                    out.push_str(text);
                }
                return;
            }
            if kind == Some("image") {
                return;
            }

            let tag = map.get("tag").and_then(Value::as_str).unwrap_or_default();
            if filter.skip_tags.contains(&tag) {
                return;
            }

            let name = map
                .get("data")
                .and_then(|data| data.get("name"))
                .and_then(Value::as_str);
            if let Some(name) = name {
                if filter.keep_only.is_some_and(|keep| keep != name) {
                    return;
                }
                if filter.skip_annotations && ANNOTATIONS.iter().any(|a| name.contains(a)) {
                    return;
                }
                if name.contains("参照語義番号") {
                    let inner = map
                        .get("content")
                        .map(|c| flatten_content(c, filter, reading))
                        .unwrap_or_default();
                    match markers::marker(inner.trim()) {
                        Some(marker) => out.push_str(&format!("〚{}〛", marker.value)),
                        None => out.push_str(&inner),
                    }
                    return;
                }
            }

            // Sense numbers drawn as kanji-numeral images
            if let Some(title) = map.get("title").and_then(Value::as_str) {
                if let Some(n) = KANSUUJI.iter().position(|k| *k == title) {
                    match n + 1 {
                        10 => out.push('🔟'),
                        n => out.push_str(&format!("{n}\u{FE0F}\u{20E3}")),
                    }
                    return;
                }
            }

            if tag == "br" {
                out.push('\n');
                return;
            }

            if let Some(content) = map.get("content") {
                flatten(content, filter, reading, out);
            }
            if matches!(tag, "div" | "li") && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        _ => {}
    }
}
