use kotoba_anki::{Deck, DeckColumns, build_definition_html};
use kotoba_core::{LookupContext, RowError};
use kotoba_lang_japanese::JapaneseProcessor;
use kotoba_remote::RemoteSources;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Converted,
    /// Nothing found; the row keeps its old definition
    PassedThrough,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub converted: usize,
    pub passed_through: usize,
    pub failed: usize,
    pub duplicates: usize,
}

/// Converts deck rows one at a time, each fully resolved before the next
pub struct Pipeline<'a> {
    processor: &'a JapaneseProcessor,
    remote: Option<&'a RemoteSources<'a>>,
    text_mode_default: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        processor: &'a JapaneseProcessor,
        remote: Option<&'a RemoteSources<'a>>,
        text_mode_default: bool,
    ) -> Self {
        Self {
            processor,
            remote,
            text_mode_default,
        }
    }

    pub fn convert_deck(
        &self,
        ctx: &mut LookupContext,
        deck: &mut Deck,
        columns: DeckColumns,
    ) -> Summary {
        let mut summary = Summary {
            duplicates: deck.dedupe_by(columns.vocab),
            ..Summary::default()
        };
        if summary.duplicates > 0 {
            tracing::info!("Dropped {} duplicate rows", summary.duplicates);
        }

        let total = deck.rows.len();
        let interval = (total / 10).max(1);

        for (i, row) in deck.rows.iter_mut().enumerate() {
            match self.convert_row(ctx, row, columns) {
                Ok(RowOutcome::Converted) => summary.converted += 1,
                Ok(RowOutcome::PassedThrough) => summary.passed_through += 1,
                Err(e) => {
                    let cell = |c: usize| row.get(c).map(String::as_str).unwrap_or_default();
                    tracing::error!(
                        word = cell(columns.vocab),
                        reading = cell(columns.reading),
                        "Row {} kept its definition: {e}",
                        i + 1
                    );
                    summary.failed += 1;
                }
            }

            if i > 0 && i % interval == 0 {
                tracing::info!("Progress: {}%", i * 100 / total);
            }
        }

        tracing::info!(
            "Converted {} rows, passed through {}, failed {}",
            summary.converted,
            summary.passed_through,
            summary.failed
        );
        summary
    }

    pub fn convert_row(
        &self,
        ctx: &mut LookupContext,
        row: &mut [String],
        columns: DeckColumns,
    ) -> Result<RowOutcome, RowError> {
        let cell = |i: usize| row.get(i).cloned().ok_or(RowError::MissingColumn(i));
        let raw_word = cell(columns.vocab)?;
        let raw_reading = cell(columns.reading)?;
        if columns.definition >= row.len() {
            return Err(RowError::MissingColumn(columns.definition));
        }

        let (word, reading) = self
            .processor
            .clean_pair(&raw_word, &raw_reading)
            .ok_or(RowError::Empty)?;

        let results = self.processor.convert(ctx, self.remote, &word, &reading);
        let Some(html) = build_definition_html(&results, self.text_mode_default) else {
            tracing::info!("Didn't find {word}【{reading}】");
            return Ok(RowOutcome::PassedThrough);
        };

        row[columns.definition] = html;
        if raw_word.trim().is_empty() {
            row[columns.vocab] = raw_reading;
        }
        Ok(RowOutcome::Converted)
    }
}

#[cfg(test)]
mod tests {
    use kotoba_config::Config;
    use kotoba_remote::{RemoteError, RemoteLookup};
    use kotoba_types::RemoteRecord;

    use super::*;

    const EXPORT: &str = "Vocab\tReading\tMeaning\n鯛\tたい\tsea bream\n鰐\tわに\tcrocodile\n鯛\tたい\tsnapper\n\tタイ\tfish\n\t\tnothing\n";

    fn setup() -> (JapaneseProcessor, LookupContext, Deck, DeckColumns) {
        let config = Config::default();
        let mut ctx = LookupContext::default();
        ctx.record_entry("大辞林", "たい", "鯛", ["スズキ目の魚。".to_string()]);
        let deck = Deck::parse(EXPORT).unwrap();
        let columns = deck.columns(&config.anki).unwrap();
        (JapaneseProcessor::new(&config), ctx, deck, columns)
    }

    #[test]
    fn rows_are_converted_or_kept() {
        let (processor, mut ctx, mut deck, columns) = setup();
        let pipeline = Pipeline::new(&processor, None, true);

        let summary = pipeline.convert_deck(&mut ctx, &mut deck, columns);

        assert_eq!(
            summary,
            Summary {
                converted: 2,
                passed_through: 1,
                failed: 1,
                duplicates: 1,
            }
        );
        assert!(deck.rows[0][2].contains("スズキ目の魚。"));
        assert_eq!(deck.rows[1][2], "crocodile");
        assert_eq!(deck.rows[2][0], "タイ");
        assert_eq!(deck.rows[3][2], "nothing");
    }

    #[test]
    fn short_rows_fail_alone() {
        let (processor, mut ctx, _, columns) = setup();
        let pipeline = Pipeline::new(&processor, None, true);

        let mut row = vec!["鯛".to_string(), "たい".to_string()];
        let err = pipeline.convert_row(&mut ctx, &mut row, columns).unwrap_err();
        assert!(matches!(err, RowError::MissingColumn(2)));
    }

    struct Dictionary;

    impl RemoteLookup for Dictionary {
        fn name(&self) -> &str {
            "Weblio"
        }

        fn lookup(&self, query: &str, _: Option<&str>) -> Result<Vec<RemoteRecord>, RemoteError> {
            Ok(vec![RemoteRecord {
                source: "デジタル大辞泉".into(),
                word: query.into(),
                reading: "わに".into(),
                definition: "ワニ目の爬虫類。".into(),
            }])
        }
    }

    #[test]
    fn remote_findings_are_marked_as_guesses() {
        let (processor, mut ctx, _, columns) = setup();
        let remote = RemoteSources::disabled().with_provider(Dictionary);
        let pipeline = Pipeline::new(&processor, Some(&remote), true);

        let mut row = vec!["鰐".to_string(), "わに".to_string(), "crocodile".to_string()];
        let outcome = pipeline.convert_row(&mut ctx, &mut row, columns).unwrap();

        assert_eq!(outcome, RowOutcome::Converted);
        assert!(row[2].contains("ワニ目の爬虫類。<br />Warning: This is a guess entry"));
        assert!(ctx.index.contains("Weblio", "わに", "鰐"));
    }
}
