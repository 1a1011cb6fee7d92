use kotoba_remote::label_provider;
use kotoba_types::{LookupEntry, SourceResults};

use crate::lookup::similarity;

/// Orders sources for presentation, lowest penalty first.
///
/// The penalty adds one point per hundred definition characters, the
/// source's priority index, a flat `priority.len()` when anything in the
/// source is a guess, and how far the best entry's word and reading drift
/// from the query. Empty sources are dropped.
pub fn rank_sources(
    results: SourceResults,
    priority: &[String],
    word: &str,
    reading: &str,
) -> SourceResults {
    let mut scored: Vec<(f64, String, Vec<LookupEntry>)> = results
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(label, entries)| {
            let score = penalty(&label, &entries, priority, word, reading);
            (score, label, entries)
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored
        .into_iter()
        .map(|(_, label, entries)| (label, entries))
        .collect()
}

fn penalty(
    label: &str,
    entries: &[LookupEntry],
    priority: &[String],
    word: &str,
    reading: &str,
) -> f64 {
    let total_chars: usize = entries
        .iter()
        .flat_map(|e| &e.definitions)
        .map(|d| d.chars().count())
        .sum();
    let length = (total_chars / 100) as f64;

    let provider = label_provider(label);
    let index = priority
        .iter()
        .position(|p| p == label || p == provider)
        .unwrap_or(0) as f64;

    let guess = if entries.iter().any(LookupEntry::is_guess) {
        priority.len() as f64
    } else {
        0.0
    };

    let drift = entries
        .iter()
        .map(|e| {
            (1.0 - similarity(&e.reading, reading)).exp() + (1.0 - similarity(&e.word, word)).exp()
        })
        .fold(f64::INFINITY, f64::min);

    length + index + guess + drift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priority() -> Vec<String> {
        vec!["大辞泉".into(), "大辞林".into(), "Weblio".into()]
    }

    #[test]
    fn priority_order_breaks_even_matches() {
        let mut results = SourceResults::new();
        results.insert("大辞林".into(), vec![LookupEntry::new("鯛", "たい", vec!["魚。".into()])]);
        results.insert("大辞泉".into(), vec![LookupEntry::new("鯛", "たい", vec!["魚。".into()])]);

        let ranked = rank_sources(results, &priority(), "鯛", "たい");
        assert_eq!(ranked.keys().collect::<Vec<_>>(), vec!["大辞泉", "大辞林"]);
    }

    #[test]
    fn guesses_sink_below_confident_matches() {
        let mut results = SourceResults::new();
        results.insert(
            "大辞泉".into(),
            vec![LookupEntry::new("鯛", "たい", vec!["魚。".into()]).guessed()],
        );
        results.insert(
            "Weblio>デジタル大辞泉".into(),
            vec![LookupEntry::new("鯛", "たい", vec!["魚。".into()])],
        );
        results.insert("大辞林".into(), vec![]);

        let ranked = rank_sources(results, &priority(), "鯛", "たい");
        assert_eq!(
            ranked.keys().collect::<Vec<_>>(),
            vec!["Weblio>デジタル大辞泉", "大辞泉"]
        );
    }
}
