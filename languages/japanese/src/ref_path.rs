use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::markers::{self, Step};

/// Steps into an outline, e.g. `②❶` -> `[2, 1]`.
///
/// Displayed in the family-neutral `〚2〛〚1〛` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencePath(Vec<Step>);

fn path_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"〚([^〛]*)〛|\((\d{1,2})\)|\d\x{FE0F}?\x{20E3}|\S")
            .expect("Invalid path token pattern")
    })
}

impl ReferencePath {
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    /// Reads glyphs, keycaps, `(n)` and `〚v〛` tokens. Whitespace and
    /// characters that are not markers are skipped.
    pub fn parse(text: &str) -> Self {
        let steps = path_token()
            .captures_iter(text)
            .filter_map(|caps| {
                if let Some(bracketed) = caps.get(1) {
                    Step::parse(bracketed.as_str())
                } else if let Some(number) = caps.get(2) {
                    number.as_str().parse().ok().map(Step::Number)
                } else {
                    markers::marker(caps.get(0)?.as_str()).map(|m| m.value)
                }
            })
            .collect();
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ReferencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            write!(f, "〚{step}〛")?;
        }
        Ok(())
    }
}
