use kotoba_core::LoadError;
use serde_json::{Value, json};

/// One line of a term bank: `[word, reading, defTags, rules, score, definitions, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct TermBankRow {
    pub word: String,
    pub reading: String,
    pub def_tags: String,
    pub rules: String,
    pub score: Value,
    /// Plain strings or structured-content trees
    pub definitions: Vec<Value>,
}

impl TermBankRow {
    /// A row holding plain-text definitions, as written for remote findings
    pub fn plain(word: &str, reading: &str, definitions: impl IntoIterator<Item = String>) -> Self {
        Self {
            word: word.to_string(),
            reading: reading.to_string(),
            def_tags: String::new(),
            rules: String::new(),
            score: Value::String(String::new()),
            definitions: definitions.into_iter().map(Value::String).collect(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        let Value::Array(mut items) = value else {
            return Err(LoadError::InvalidFormat("term bank row is not an array".into()));
        };
        if items.len() < 6 {
            return Err(LoadError::InvalidFormat(format!(
                "term bank row has {} fields, expected at least 6",
                items.len()
            )));
        }
        items.truncate(6);

        let definitions = match items.pop() {
            Some(Value::Array(defs)) => defs,
            Some(Value::String(def)) => vec![Value::String(def)],
            _ => Vec::new(),
        };
        let score = items.pop().unwrap_or(Value::Null);
        let mut text = items.into_iter().map(|v| match v {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        });

        Ok(Self {
            word: text.next().unwrap_or_default(),
            reading: text.next().unwrap_or_default(),
            def_tags: text.next().unwrap_or_default(),
            rules: text.next().unwrap_or_default(),
            score,
            definitions,
        })
    }

    pub fn to_value(&self) -> Value {
        json!([
            self.word,
            self.reading,
            self.def_tags,
            self.rules,
            self.score,
            self.definitions,
        ])
    }

    /// The definitions that are plain strings
    pub fn text_definitions(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().filter_map(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_with_trailing_fields() {
        let row = TermBankRow::from_value(json!(["鯛", "たい", "名", "", 0, ["魚。"], 12, ""])).unwrap();
        assert_eq!(row.word, "鯛");
        assert_eq!(row.reading, "たい");
        assert_eq!(row.def_tags, "名");
        assert_eq!(row.text_definitions().collect::<Vec<_>>(), vec!["魚。"]);
    }

    #[test]
    fn rejects_short_rows() {
        assert!(TermBankRow::from_value(json!(["鯛", "たい"])).is_err());
        assert!(TermBankRow::from_value(json!({"word": "鯛"})).is_err());
    }
}
