//! Catalog of the enumeration glyphs dictionaries use to number senses.
//!
//! Every family has a total order (its rank, starting at 1) and maps each
//! glyph to a normalized [`Step`] so references written in one family can
//! navigate an outline numbered in another.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Normalized value of a marker: a number, or a letter/kana for lettered families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Number(u32),
    Letter(char),
}

impl Step {
    /// Parses `12` or a single character such as `ア`
    pub fn parse(text: &str) -> Option<Step> {
        let text = text.trim();
        if let Ok(n) = text.parse::<u32>() {
            return Some(Step::Number(n));
        }
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Step::Letter(c)),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Number(n) => write!(f, "{n}"),
            Step::Letter(c) => write!(f, "{c}"),
        }
    }
}

/// Glyph families, in declaration order (which breaks offset ties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// ①..⑳ then ㉑..㉟
    Circled,
    /// ❶..❿
    NegativeCircled,
    /// ⑴..⒇
    Parenthesized,
    /// ⒈..⒛
    FullStop,
    /// ➊..➓
    SansSerifNegative,
    /// ➀..➉
    SansSerifCircled,
    /// 🈩🈔🈪
    SquaredIdeograph,
    /// ㊀..㊉
    CircledIdeograph,
    /// ㊤㊥㊦
    CircledPosition,
    /// ㋐..㋾
    CircledKatakana,
    /// ⓐ..ⓩ
    CircledSmallLatin,
    /// Ⓐ..Ⓩ
    CircledLatin,
    /// 🅐..🅩
    NegativeCircledLatin,
    /// (1)..(20)
    AsciiParenthesized,
    /// 1️⃣..9️⃣ and 🔟
    Keycap,
    /// １..９, only when not part of a longer number
    FullWidthDigit,
}

const GOJUON: &str = "アイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワヰヱヲ";

impl Family {
    pub const ALL: [Family; 16] = [
        Family::Circled,
        Family::NegativeCircled,
        Family::Parenthesized,
        Family::FullStop,
        Family::SansSerifNegative,
        Family::SansSerifCircled,
        Family::SquaredIdeograph,
        Family::CircledIdeograph,
        Family::CircledPosition,
        Family::CircledKatakana,
        Family::CircledSmallLatin,
        Family::CircledLatin,
        Family::NegativeCircledLatin,
        Family::AsciiParenthesized,
        Family::Keycap,
        Family::FullWidthDigit,
    ];

    /// `(glyph, rank, value)` for every member
    fn members(self) -> Vec<(String, u32, Step)> {
        fn run(first: u32, last: u32, start_rank: u32) -> Vec<(String, u32, Step)> {
            (first..=last)
                .filter_map(char::from_u32)
                .zip(start_rank..)
                .map(|(c, rank)| (c.to_string(), rank, Step::Number(rank)))
                .collect()
        }

        fn lettered(first: u32, letters: impl Iterator<Item = char>) -> Vec<(String, u32, Step)> {
            letters
                .zip(0..)
                .filter_map(|(letter, i)| {
                    let glyph = char::from_u32(first + i)?;
                    Some((glyph.to_string(), i + 1, Step::Letter(letter)))
                })
                .collect()
        }

        match self {
            Family::Circled => {
                let mut members = run(0x2460, 0x2473, 1);
                members.extend(run(0x3251, 0x325F, 21));
                members
            }
            Family::NegativeCircled => run(0x2776, 0x277F, 1),
            Family::Parenthesized => run(0x2474, 0x2487, 1),
            Family::FullStop => run(0x2488, 0x249B, 1),
            Family::SansSerifNegative => run(0x278A, 0x2793, 1),
            Family::SansSerifCircled => run(0x2780, 0x2789, 1),
            Family::SquaredIdeograph => ["🈩", "🈔", "🈪"]
                .into_iter()
                .zip(1..)
                .map(|(g, rank)| (g.to_string(), rank, Step::Number(rank)))
                .collect(),
            Family::CircledIdeograph => run(0x3280, 0x3289, 1),
            Family::CircledPosition => lettered(0x32A4, "上中下".chars()),
            Family::CircledKatakana => lettered(0x32D0, GOJUON.chars()),
            Family::CircledSmallLatin => lettered(0x24D0, 'a'..='z'),
            Family::CircledLatin => lettered(0x24B6, 'A'..='Z'),
            Family::NegativeCircledLatin => lettered(0x1F150, 'A'..='Z'),
            Family::AsciiParenthesized => (1..=20)
                .map(|n| (format!("({n})"), n, Step::Number(n)))
                .collect(),
            Family::Keycap => {
                let mut members: Vec<_> = (1..=9)
                    .flat_map(|n| {
                        [
                            (format!("{n}\u{FE0F}\u{20E3}"), n, Step::Number(n)),
                            (format!("{n}\u{20E3}"), n, Step::Number(n)),
                        ]
                    })
                    .collect();
                members.push(("🔟".to_string(), 10, Step::Number(10)));
                members
            }
            Family::FullWidthDigit => run(0xFF11, 0xFF19, 1),
        }
    }

    /// Extra context check for a match at `start..end`
    fn accepts(self, text: &str, start: usize, end: usize) -> bool {
        match self {
            Family::FullWidthDigit => {
                let is_digit = |c: char| c.is_ascii_digit() || ('０'..='９').contains(&c);
                let before = text[..start].chars().next_back();
                let mut after = text[end..].chars();
                // "１1️⃣" is a digit followed by a keycap, not a number
                let continues_number = match (after.next(), after.next()) {
                    (Some(c), next) => is_digit(c) && !matches!(next, Some('\u{FE0F}' | '\u{20E3}')),
                    (None, _) => false,
                };
                !before.is_some_and(is_digit) && !continues_number
            }
            // "21⃣" is not keycap 1
            Family::Keycap => !text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_digit()),
            _ => true,
        }
    }
}

/// A glyph of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker {
    pub glyph: &'static str,
    pub family: Family,
    /// Position in the family's order, from 1
    pub rank: u32,
    pub value: Step,
}

/// Where a marker was found, as byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: usize,
    pub end: usize,
    pub marker: Marker,
}

struct FamilyTable {
    family: Family,
    pattern: Regex,
}

struct Catalog {
    tables: Vec<FamilyTable>,
    by_glyph: HashMap<&'static str, Marker>,
    single_chars: String,
}

static GLYPHS: OnceLock<Vec<(Family, Vec<(String, u32, Step)>)>> = OnceLock::new();
static CATALOG: OnceLock<Catalog> = OnceLock::new();

fn glyphs() -> &'static [(Family, Vec<(String, u32, Step)>)] {
    GLYPHS.get_or_init(|| Family::ALL.iter().map(|f| (*f, f.members())).collect())
}

fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| {
        let mut by_glyph = HashMap::new();
        let mut tables = Vec::new();
        let mut single_chars = String::new();

        for (family, members) in glyphs() {
            let mut alternatives: Vec<&'static str> = Vec::with_capacity(members.len());
            for (glyph, rank, value) in members {
                let glyph: &'static str = glyph.as_str();
                by_glyph.insert(
                    glyph,
                    Marker {
                        glyph,
                        family: *family,
                        rank: *rank,
                        value: *value,
                    },
                );
                alternatives.push(glyph);
                if glyph.chars().count() == 1 {
                    single_chars.push_str(glyph);
                }
            }
            // Longest first so alternation never stops at a prefix
            alternatives.sort_by_key(|g| std::cmp::Reverse(g.len()));
            let source = alternatives
                .iter()
                .map(|g| regex::escape(g))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = Regex::new(&source).expect("Invalid marker pattern");
            tables.push(FamilyTable {
                family: *family,
                pattern,
            });
        }

        Catalog {
            tables,
            by_glyph,
            single_chars,
        }
    })
}

fn table(family: Family) -> &'static FamilyTable {
    let tables = &catalog().tables;
    let index = Family::ALL.iter().position(|f| *f == family).unwrap_or(0);
    &tables[index]
}

/// Looks a glyph up, e.g. `"②"` -> rank 2 of [`Family::Circled`]
pub fn marker(glyph: &str) -> Option<Marker> {
    catalog().by_glyph.get(glyph).copied()
}

/// Every single-character glyph, concatenated (for building character classes)
pub fn single_char_glyphs() -> &'static str {
    &catalog().single_chars
}

/// All accepted occurrences of `family` in `text`, left to right
pub fn occurrences(text: &str, family: Family) -> Vec<Occurrence> {
    table(family)
        .pattern
        .find_iter(text)
        .filter(|m| family.accepts(text, m.start(), m.end()))
        .filter_map(|m| {
            Some(Occurrence {
                start: m.start(),
                end: m.end(),
                marker: marker(m.as_str())?,
            })
        })
        .collect()
}

fn first_offset(text: &str, family: Family) -> Option<usize> {
    let table = table(family);
    table
        .pattern
        .find_iter(text)
        .find(|m| table.family.accepts(text, m.start(), m.end()))
        .map(|m| m.start())
}

/// Families present in `text`, ordered by where they first appear
pub fn families_by_offset(text: &str) -> Vec<Family> {
    let mut found: Vec<(usize, Family)> = Family::ALL
        .iter()
        .filter_map(|family| Some((first_offset(text, *family)?, *family)))
        .collect();
    // Stable: equal offsets keep declaration order
    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, family)| family).collect()
}

/// The family whose first glyph comes earliest in `text`
pub fn find_first_family(text: &str) -> Option<Family> {
    families_by_offset(text).into_iter().next()
}

/// Replaces every glyph (including multi-character ones) with its `〚value〛` form
pub fn to_bracketed(text: &str) -> String {
    let mut out = text.to_string();
    for family in Family::ALL {
        let hits = occurrences(&out, family);
        if hits.is_empty() {
            continue;
        }
        let mut replaced = String::with_capacity(out.len());
        let mut last = 0;
        for hit in hits {
            replaced.push_str(&out[last..hit.start]);
            replaced.push_str(&format!("〚{}〛", hit.marker.value));
            last = hit.end;
        }
        replaced.push_str(&out[last..]);
        out = replaced;
    }
    out
}
