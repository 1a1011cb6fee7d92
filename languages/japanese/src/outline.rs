//! Outline trees recovered from enumerated definition text.
//!
//! `"①魚。②肉。"` becomes a branch with two leaves keyed by ① and ②, and
//! [`render`] writes it back one sense per line with `└`, `└─`, ... indentation.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::markers::{self, Family, Marker, Occurrence, Step};

#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Leaf(String),
    Branch {
        /// Text before the first accepted marker
        prefix: String,
        children: IndexMap<Marker, Outline>,
    },
}

/// One level of splitting, before recursion
#[derive(Debug, Default, PartialEq)]
pub struct Segments {
    pub prefix: String,
    pub parts: IndexMap<Marker, String>,
}

fn dangling_indent_at_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"└─*$").expect("Invalid indent pattern"))
}

fn line_breaks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]*(?:<br ?/?>|\n)+").expect("Invalid line break pattern"))
}

fn dangling_indent() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"└─*(?:\n|$)").expect("Invalid indent pattern"))
}

fn clean(body: &str) -> String {
    let body = line_breaks().replace_all(body, "\n");
    dangling_indent_at_end().replace(&body, "").trim().to_string()
}

/// Splits `text` on the markers of `family`.
///
/// A marker opens a new part only when it continues the family's order
/// (rank = previous + 1) and is not the root family reappearing below the
/// root. Anything else is a citation of another sense and stays glued to the
/// currently open part.
pub fn segment(text: &str, family: Family, root_family: Family, depth: usize) -> Segments {
    let mut accepted: Vec<Occurrence> = Vec::new();
    if depth == 0 || family != root_family {
        let mut previous_rank = 0;
        for hit in markers::occurrences(text, family) {
            if hit.marker.rank == previous_rank + 1 {
                previous_rank = hit.marker.rank;
                accepted.push(hit);
            }
        }
    }

    let first_start = accepted.first().map_or(text.len(), |h| h.start);
    let mut segments = Segments {
        prefix: clean(&text[..first_start]),
        parts: IndexMap::new(),
    };
    for (i, hit) in accepted.iter().enumerate() {
        let body_end = accepted.get(i + 1).map_or(text.len(), |next| next.start);
        segments.parts.insert(hit.marker, clean(&text[hit.end..body_end]));
    }
    segments
}

/// Parses `text` into an outline; text without markers is a leaf
pub fn build_tree(text: &str) -> Outline {
    build(text, None, 0)
}

fn build(text: &str, root_family: Option<Family>, depth: usize) -> Outline {
    for family in markers::families_by_offset(text) {
        let root = root_family.unwrap_or(family);
        let segments = segment(text, family, root, depth);
        // Markers with nothing after them are not an outline
        if segments.parts.values().all(String::is_empty) {
            continue;
        }

        let children = segments
            .parts
            .into_iter()
            .map(|(marker, body)| (marker, build(&body, Some(root), depth + 1)))
            .collect();

        return Outline::Branch {
            prefix: segments.prefix,
            children,
        };
    }

    Outline::Leaf(text.to_string())
}

/// Writes an outline back as text. Leaves come back verbatim.
pub fn render(node: &Outline) -> String {
    match node {
        Outline::Leaf(text) => text.clone(),
        Outline::Branch { prefix, children } => {
            let raw = render_branch(prefix, children, 0);
            let collapsed = line_breaks().replace_all(&raw, "\n");
            dangling_indent()
                .replace_all(&collapsed, "")
                .trim()
                .to_string()
        }
    }
}

fn render_branch(prefix: &str, children: &IndexMap<Marker, Outline>, depth: usize) -> String {
    let indent = format!("└{}", "─".repeat(depth));
    let bodies: Vec<(&Marker, String)> = children
        .iter()
        .map(|(marker, child)| (marker, render_child(child, depth)))
        .collect();

    // Empty senses before the last written one keep their marker so the
    // ranks of the later ones stay contiguous
    let kept = bodies
        .iter()
        .rposition(|(_, body)| !body.is_empty())
        .map_or(0, |last| last + 1);

    let mut out = prefix.to_string();
    for (marker, body) in bodies.into_iter().take(kept) {
        out.push('\n');
        out.push_str(&indent);
        out.push_str(marker.glyph);
        if !body.is_empty() && !body.starts_with('\n') {
            out.push(' ');
        }
        out.push_str(&body);
    }

    out
}

fn render_child(child: &Outline, depth: usize) -> String {
    match child {
        Outline::Leaf(value) => value.trim_end_matches('└').trim().to_string(),
        Outline::Branch { prefix, children } => render_branch(prefix, children, depth + 1),
    }
}

/// Narrows an outline to the sense addressed by `path`.
///
/// Walking stops at the first step with no matching child; whatever node was
/// reached is rendered.
pub fn resolve_path(tree: &Outline, path: &[Step]) -> String {
    let mut current = tree;
    for step in path {
        let Outline::Branch { children, .. } = current else {
            break;
        };
        match children.iter().find(|(marker, _)| marker.value == *step) {
            Some((_, child)) => current = child,
            None => break,
        }
    }
    render(current)
}

/// `render(build_tree(text))`
pub fn normalize(text: &str) -> String {
    render(&build_tree(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_values(tree: &Outline) -> Vec<Step> {
        match tree {
            Outline::Branch { children, .. } => children.keys().map(|m| m.value).collect(),
            Outline::Leaf(_) => Vec::new(),
        }
    }

    #[test]
    fn splits_on_the_first_family() {
        let tree = build_tree("魚の名。①海の魚。②川の魚。");
        match &tree {
            Outline::Branch { prefix, children } => {
                assert_eq!(prefix, "魚の名。");
                assert_eq!(children.len(), 2);
            }
            Outline::Leaf(_) => panic!("expected a branch"),
        }
        assert_eq!(child_values(&tree), vec![Step::Number(1), Step::Number(2)]);
    }

    #[test]
    fn nests_other_families() {
        let tree = build_tree("①動く。❶歩く。❷走る。②止まる。");
        let Outline::Branch { children, .. } = &tree else {
            panic!("expected a branch");
        };
        let first = children.values().next().unwrap();
        assert_eq!(child_values(first), vec![Step::Number(1), Step::Number(2)]);
        assert_eq!(
            render(&tree),
            "└① 動く。\n└─❶ 歩く。\n└─❷ 走る。\n└② 止まる。"
        );
    }

    #[test]
    fn out_of_order_markers_fold_into_the_open_sense() {
        let tree = build_tree("①甲。②乙。①を参照。③丙。");
        let Outline::Branch { children, .. } = &tree else {
            panic!("expected a branch");
        };
        let values: Vec<&Outline> = children.values().collect();
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], &Outline::Leaf("乙。①を参照。".to_string()));
    }

    #[test]
    fn root_family_below_the_root_is_a_citation() {
        let tree = build_tree("①甲。❶子。①と同じ。❷孫。②乙。");
        assert_eq!(
            resolve_path(&tree, &[Step::Number(1), Step::Number(1)]),
            "子。①と同じ。"
        );
        assert_eq!(resolve_path(&tree, &[Step::Number(2)]), "乙。");
    }

    #[test]
    fn resolves_a_numbered_sense() {
        let tree = build_tree("①魚の一種。\n②美味な赤い魚。");
        assert_eq!(resolve_path(&tree, &[Step::Number(2)]), "美味な赤い魚。");
    }

    #[test]
    fn missing_step_stops_at_the_current_node() {
        let tree = build_tree("①甲。②乙。");
        assert_eq!(resolve_path(&tree, &[Step::Number(5)]), render(&tree));
        assert_eq!(
            resolve_path(&tree, &[Step::Number(2), Step::Number(1)]),
            "乙。"
        );
    }

    #[test]
    fn empty_path_is_the_whole_tree() {
        let tree = build_tree("①甲。②乙。");
        assert_eq!(resolve_path(&tree, &[]), render(&tree));

        let leaf = build_tree("ただの文章。");
        assert_eq!(leaf, Outline::Leaf("ただの文章。".to_string()));
        assert_eq!(resolve_path(&leaf, &[]), "ただの文章。");
    }

    #[test]
    fn rendering_is_idempotent() {
        let samples = [
            "前置き ①動く。❶歩く。❷走る。②止まる。",
            "①甲。<br />②乙。①を参照。③丙。",
            "㋐あ。㋑い。",
            "(1)一つ目。(2)二つ目。\n\n",
            "①甲。❶子。②と同じ。❷孫。②乙。",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not stable for {sample:?}");
        }
    }

    /// Texts glued together from marker glyphs of several families and
    /// short runs of text, whitespace and line breaks
    fn generated_texts(count: usize) -> Vec<String> {
        const PIECES: [&str; 28] = [
            "①", "②", "③", "❶", "❷", "❸", "⑴", "⑵", "⒈", "⒉", "㋐", "㋑", "㊤", "㊥", "１", "２",
            "1\u{FE0F}\u{20E3}", "2\u{20E3}", "(1)", "(2)", "い", "魚。", "12", " ", "\n", "\u{3000}",
            "<br>", "「",
        ];

        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move |bound: usize| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as usize % bound
        };

        (0..count)
            .map(|_| {
                let len = 1 + next(12);
                (0..len)
                    .map(|_| PIECES[next(PIECES.len())])
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn normalizing_generated_outlines_is_stable() {
        for text in generated_texts(20_000) {
            let once = normalize(&text);
            assert_eq!(normalize(&once), once, "not stable for {text:?}");
        }
    }

    #[test]
    fn empty_senses_are_dropped_or_kept_in_place() {
        assert_eq!(normalize("①い②⑴"), "└① い\n└② ⑴");
        assert_eq!(normalize("①い②③う"), "└① い\n└②\n└③ う");
        assert_eq!(normalize("①い②う③"), "└① い\n└② う");
        assert_eq!(normalize("㋐\n １"), "└㋐ １");
        assert_eq!(normalize("❶２㋐⑴"), "└❶ ２\n└─㋐ ⑴");
    }

    #[test]
    fn lettered_steps_navigate_lettered_families() {
        let tree = build_tree("①名詞。㋐物。㋑事。②動詞。");
        assert_eq!(
            resolve_path(&tree, &[Step::Number(1), Step::Letter('イ')]),
            "事。"
        );
    }
}
