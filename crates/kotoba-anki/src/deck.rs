use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use kotoba_config::AnkiConfig;

/// A tab-separated note export whose first non-comment line names the columns
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Positions of the columns the converter reads and writes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckColumns {
    pub vocab: usize,
    pub reading: usize,
    pub definition: usize,
}

impl Deck {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read deck {}", path.display()))?;
        let deck =
            Self::parse(&text).with_context(|| format!("Malformed deck {}", path.display()))?;
        tracing::info!("Read {} rows from {}", deck.rows.len(), path.display());
        Ok(deck)
    }

    /// Parses the export. `#` lines are Anki's file directives and are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.starts_with('#'));

        let Some(header) = lines.next() else {
            bail!("deck has no header row");
        };
        let headers: Vec<String> = header.split('\t').map(str::to_string).collect();

        let rows = lines
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let mut cells: Vec<String> = line.split('\t').map(str::to_string).collect();
                cells.resize(headers.len().max(cells.len()), String::new());
                cells
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("no column named {name:?} in {:?}", self.headers))
    }

    pub fn columns(&self, config: &AnkiConfig) -> Result<DeckColumns> {
        Ok(DeckColumns {
            vocab: self.column(&config.vocab_field)?,
            reading: self.column(&config.reading_field)?,
            definition: self.column(&config.definition_field)?,
        })
    }

    /// Drops rows repeating an earlier value of `column`, and rows repeating
    /// the header itself. Blank cells are never duplicates.
    pub fn dedupe_by(&mut self, column: usize) -> usize {
        let header = self.headers.get(column).cloned().unwrap_or_default();
        let mut seen = HashSet::new();
        let before = self.rows.len();

        self.rows.retain(|row| {
            let value = row.get(column).map(String::as_str).unwrap_or_default();
            value.trim().is_empty() || (value != header && seen.insert(value.to_string()))
        });

        before - self.rows.len()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            let cells: Vec<String> = line.iter().map(|cell| flatten_cell(cell)).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_tsv())
            .with_context(|| format!("Failed to write deck {}", path.display()))
    }
}

/// Cells hold HTML, so line structure survives as `<br />`
fn flatten_cell(cell: &str) -> String {
    cell.replace("\r\n", "<br />")
        .replace('\n', "<br />")
        .replace('\t', " ")
}

/// `[FIXED] <name>.txt` next to the input deck
pub fn fixed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck".to_string());
    input.with_file_name(format!("[FIXED] {stem}.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "#separator:tab\n#html:true\nVocab\tReading\tMeaning\n鯛\tたい\tsea bream\n鰹\tかつお\tbonito\n鯛\tたい\tsnapper\nVocab\tReading\tMeaning\n";

    #[test]
    fn parses_header_and_rows() {
        let deck = Deck::parse(EXPORT).unwrap();
        assert_eq!(deck.headers, vec!["Vocab", "Reading", "Meaning"]);
        assert_eq!(deck.rows.len(), 4);

        let columns = deck.columns(&AnkiConfig::default()).unwrap();
        assert_eq!(columns, DeckColumns { vocab: 0, reading: 1, definition: 2 });
    }

    #[test]
    fn duplicate_headwords_keep_the_first_row() {
        let mut deck = Deck::parse(EXPORT).unwrap();
        assert_eq!(deck.dedupe_by(0), 2);
        assert_eq!(deck.rows, vec![
            vec!["鯛".to_string(), "たい".to_string(), "sea bream".to_string()],
            vec!["鰹".to_string(), "かつお".to_string(), "bonito".to_string()],
        ]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let deck = Deck::parse("Front\tBack\n").unwrap();
        assert!(deck.column("Vocab").is_err());
        assert!(Deck::parse("#only directives\n").is_err());
    }

    #[test]
    fn writes_next_to_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("core2k.txt");
        fs::write(&input, EXPORT).unwrap();

        let mut deck = Deck::read(&input).unwrap();
        deck.rows[0][2] = "一行目\n二行目".to_string();
        let output = fixed_path(&input);
        deck.write(&output).unwrap();

        assert_eq!(output.file_name().unwrap(), "[FIXED] core2k.txt");
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("Vocab\tReading\tMeaning\n鯛\tたい\t一行目<br />二行目\n"));
    }
}
