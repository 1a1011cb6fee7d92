use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A candidate spelling of a headword, paired with its reading.
///
/// An empty reading means "unknown": lookups treat it as matching any
/// entry filed under the empty reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordVariant {
    pub surface: String,
    pub reading: String,
}

impl WordVariant {
    pub fn new(surface: impl Into<String>, reading: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            reading: reading.into(),
        }
    }
}

impl fmt::Display for WordVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}【{}】", self.surface, self.reading)
    }
}

/// Marks a result that did not come from a confident local match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Guess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub word: String,
    pub reading: String,
    pub definitions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    /// Other spellings merged into this entry because they share its definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<String>,
}

impl LookupEntry {
    pub fn new(word: impl Into<String>, reading: impl Into<String>, definitions: Vec<String>) -> Self {
        Self {
            word: word.into(),
            reading: reading.into(),
            definitions,
            tag: None,
            alternates: Vec::new(),
        }
    }

    pub fn guessed(mut self) -> Self {
        self.tag = Some(Tag::Guess);
        self
    }

    pub fn is_guess(&self) -> bool {
        self.tag == Some(Tag::Guess)
    }

    /// Headword plus every merged alternate spelling
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.word.as_str()).chain(self.alternates.iter().map(String::as_str))
    }

    /// Display form, e.g. `可哀想(可哀相)` when alternates were merged
    pub fn display_word(&self) -> String {
        if self.alternates.is_empty() {
            self.word.clone()
        } else {
            format!("{}({})", self.word, self.alternates.join("・"))
        }
    }
}

/// Lookup output keyed by source label, in insertion (later: ranked) order.
pub type SourceResults = IndexMap<String, Vec<LookupEntry>>;

/// One entry returned by a remote dictionary service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Sub-dictionary the service attributed the text to
    pub source: String,
    pub word: String,
    pub reading: String,
    pub definition: String,
}
