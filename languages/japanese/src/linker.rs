//! Cross-reference linking.
//!
//! A definition such as `…⇒鯛②` points at sense ② of another entry. The
//! linker looks that entry up, narrows it to the addressed sense and appends
//! it as a `Linked 鯛【たい】〚2〛` block.

use std::sync::OnceLock;

use indexmap::IndexSet;
use kotoba_config::{LinkingConfig, SelfLinkPolicy};
use kotoba_core::{DictionaryIndex, LookupContext};
use kotoba_remote::{RemoteSources, label_provider, split_stored};
use regex::Regex;

use crate::kana;
use crate::markers;
use crate::outline;
use crate::ref_path::ReferencePath;

/// Starts every appended block
pub const LINK_SEPARATOR: &str = "\nLinked ";

fn arrows() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[⇔→←☞⇒⇐⇨]+").expect("Invalid arrow pattern"))
}

fn reference_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"⇒\s?",
            r"([^\s。、,，<>⇒・：;〚〛()（）「」『』【】\[\]〔〕［］〈〉《》〘〙｟｠]+)",
            r"(?:\s?[(（]([ぁ-ゔー]+)[)）]\s?)?",
            r"((?:〚[^〛]+〛)*)",
        ))
        .expect("Invalid reference pattern")
    })
}

fn bare_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*⇒\s?[^\s。、⇒]+(?:\s?[(（][^)）]*[)）])?(?:〚[^〛]+〛)*\s*。?\s*$")
            .expect("Invalid bare reference pattern")
    })
}

/// Every arrow glyph becomes `⇒`
pub fn normalize_arrows(text: &str) -> String {
    arrows().replace_all(text, "⇒").into_owned()
}

/// The definition without any appended `Linked` blocks
pub fn strip_linked(definition: &str) -> &str {
    definition
        .split(LINK_SEPARATOR)
        .next()
        .unwrap_or(definition)
}

/// Reference text is a bare pointer with no content of its own
pub fn is_bare_reference(text: &str) -> bool {
    bare_reference().is_match(&normalize_arrows(text))
}

struct Token {
    target: String,
    furigana: Option<String>,
    path: ReferencePath,
}

fn scan(definition: &str) -> Vec<Token> {
    let scannable = markers::to_bracketed(&normalize_arrows(strip_linked(definition)));
    reference_token()
        .captures_iter(&scannable)
        .filter_map(|caps| {
            Some(Token {
                target: caps.get(1)?.as_str().to_string(),
                furigana: caps.get(2).map(|m| m.as_str().to_string()),
                path: ReferencePath::parse(caps.get(3).map_or("", |m| m.as_str())),
            })
        })
        .collect()
}

#[derive(Clone, Copy)]
struct Origin<'a> {
    word: &'a str,
    reading: &'a str,
}

pub struct Linker {
    config: LinkingConfig,
}

impl Linker {
    pub fn new(config: LinkingConfig) -> Self {
        Self { config }
    }

    /// Appends the text of every entry `definition` refers to.
    ///
    /// `source` is the label the definition was found under. The result is
    /// `definition` itself when nothing resolved, when a reference target is
    /// implausibly long, or when linking would exceed the length cap.
    pub fn link(
        &self,
        ctx: &mut LookupContext,
        remote: Option<&RemoteSources<'_>>,
        definition: &str,
        source: &str,
        word: &str,
        reading: &str,
    ) -> String {
        if !self.config.enabled {
            return definition.to_string();
        }

        let visited: IndexSet<String> = [word, reading]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let origin = Origin { word, reading };

        let (linked, _) = self.link_pass(ctx, remote, definition, source, origin, visited, 0);
        linked
    }

    #[allow(clippy::too_many_arguments)]
    fn link_pass(
        &self,
        ctx: &mut LookupContext,
        remote: Option<&RemoteSources<'_>>,
        definition: &str,
        source: &str,
        origin: Origin<'_>,
        mut visited: IndexSet<String>,
        depth: usize,
    ) -> (String, IndexSet<String>) {
        if definition.trim().is_empty() {
            return (definition.to_string(), visited);
        }

        let tokens = scan(definition);
        if let Some(long) = tokens
            .iter()
            .find(|t| t.target.chars().count() > self.config.max_target_chars)
        {
            tracing::debug!("Not linking {}: reference target {} is too long", origin.word, long.target);
            return (definition.to_string(), visited);
        }

        let mut linked = definition.to_string();

        for token in tokens {
            let target = token.target.as_str();
            let is_origin = target == origin.word;
            let exempt = depth == 0
                && is_origin
                && self.config.self_link == SelfLinkPolicy::SkipWhenReadingMatches;
            if visited.contains(target) && !exempt {
                continue;
            }

            let mut readings: Vec<String> = match &token.furigana {
                Some(furigana) => vec![furigana.clone()],
                None if ctx.history.knows(target) => {
                    ctx.history.readings(target).map(str::to_string).collect()
                }
                None if kana::is_hiragana(target) => vec![target.to_string()],
                None => {
                    tracing::debug!("No reading known for {target}, skipping link");
                    continue;
                }
            };

            if exempt {
                // Only another reading of the entry itself is worth linking
                readings.retain(|r| r != origin.reading);
                if readings.is_empty() {
                    continue;
                }
            }

            visited.insert(target.to_string());
            visited.extend(readings.iter().cloned());

            let Some((used_reading, pieces)) =
                self.resolve(ctx, remote, source, target, &readings, &token.path, origin)
            else {
                tracing::debug!("Nothing to link for {target}");
                continue;
            };

            if is_origin && used_reading == origin.reading {
                continue;
            }

            let numbered = pieces.len() > 1;
            let mut block = format!("{LINK_SEPARATOR}{target}【{used_reading}】{}", token.path);
            for (i, piece) in pieces.into_iter().enumerate() {
                let mut text = outline::normalize(&piece);
                if text.contains('⇒') && depth < self.config.max_depth {
                    let inner = Origin {
                        word: target,
                        reading: &used_reading,
                    };
                    let (deeper, seen) =
                        self.link_pass(ctx, None, &text, source, inner, visited, depth + 1);
                    visited = seen;
                    text = deeper;
                }

                block.push('\n');
                if numbered {
                    block.push_str(&format!("{}. ", i + 1));
                }
                block.push_str(&text);
            }

            tracing::debug!("Linked {target}【{used_reading}】 into {}", origin.word);
            linked.push_str(&block);
        }

        let linked = dedupe_blocks(&linked);
        if linked.chars().count() > self.config.max_length {
            tracing::info!("Linked definition of {} is too long, keeping it unlinked", origin.word);
            return (definition.to_string(), visited);
        }

        (linked, visited)
    }

    /// Definitions for the first reading that yields any, narrowed by `path`
    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &self,
        ctx: &mut LookupContext,
        remote: Option<&RemoteSources<'_>>,
        source: &str,
        target: &str,
        readings: &[String],
        path: &ReferencePath,
        origin: Origin<'_>,
    ) -> Option<(String, Vec<String>)> {
        let backing = self.backing_sources(&ctx.index, source);

        for reading in readings {
            let mut found = local_definitions(&ctx.index, &backing, target, reading, origin);

            if found.is_empty() {
                if let Some(remote) = remote.filter(|r| r.is_enabled()) {
                    found = remote
                        .fetch(ctx, target, Some(reading))
                        .into_values()
                        .flatten()
                        .flat_map(|entry| entry.definitions)
                        .collect();
                }
            }

            let pieces: IndexSet<String> = found
                .iter()
                .map(|d| {
                    let text = strip_linked(split_stored(d).1);
                    outline::resolve_path(&outline::build_tree(text), path.steps())
                })
                .filter(|piece| !piece.trim().is_empty() && !is_bare_reference(piece))
                .collect();

            if !pieces.is_empty() {
                return Some((reading.clone(), pieces.into_iter().collect()));
            }
        }

        None
    }

    fn backing_sources(&self, index: &DictionaryIndex, source: &str) -> Vec<String> {
        if index.has_source(source) {
            return vec![source.to_string()];
        }
        let provider = label_provider(source);
        if index.has_source(provider) {
            return vec![provider.to_string()];
        }
        self.config
            .aggregate_sources
            .iter()
            .filter(|s| index.has_source(s))
            .cloned()
            .collect()
    }
}

fn local_definitions(
    index: &DictionaryIndex,
    sources: &[String],
    target: &str,
    reading: &str,
    origin: Origin<'_>,
) -> Vec<String> {
    for source in sources {
        let Some(words) = index.words_with_reading(source, reading) else {
            continue;
        };

        let definitions = words
            .get(target)
            // Synonymous headwords sharing one entry, e.g. 案内【あない】
            .or_else(|| {
                (reading != origin.reading)
                    .then(|| words.get(origin.word))
                    .flatten()
            })
            .or_else(|| (words.len() == 1).then(|| words.values().next()).flatten());

        if let Some(definitions) = definitions {
            return definitions.iter().cloned().collect();
        }
    }
    Vec::new()
}

/// Drops repeated `Linked` blocks, keeping the first of each
pub fn dedupe_blocks(text: &str) -> String {
    let blocks: IndexSet<&str> = text.split(LINK_SEPARATOR).collect();
    blocks.into_iter().collect::<Vec<_>>().join(LINK_SEPARATOR)
}
