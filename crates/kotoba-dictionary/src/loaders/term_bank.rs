use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use kotoba_core::LoadError;
use regex::Regex;
use serde_json::Value;

use crate::types::TermBankRow;

static TERM_BANK_NAME: OnceLock<Regex> = OnceLock::new();

fn term_bank_name() -> &'static Regex {
    TERM_BANK_NAME
        .get_or_init(|| Regex::new(r"^term_bank_(\d+)\.json$").expect("Invalid term bank pattern"))
}

/// `term_bank_<n>.json` files of a dictionary folder, in numeric order
pub fn term_bank_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::FileNotFound(dir.display().to_string()));
    }

    let mut files: Vec<(u64, PathBuf)> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = term_bank_name()
                .captures(name.to_str()?)?
                .get(1)?
                .as_str()
                .parse()
                .ok()?;
            Some((number, entry.path()))
        })
        .collect();
    files.sort_by_key(|(number, _)| *number);

    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Parses one term bank file. Rows that do not have the expected shape are skipped.
pub fn read_term_bank(path: &Path) -> Result<Vec<TermBankRow>, LoadError> {
    tracing::info!("Processing {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let Value::Array(rows) = serde_json::from_reader(reader)? else {
        return Err(LoadError::InvalidFormat(format!(
            "{} is not a JSON array",
            path.display()
        )));
    };

    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        match TermBankRow::from_value(row) {
            Ok(row) => parsed.push(row),
            Err(e) => tracing::warn!("Skipping row in {}: {e}", path.display()),
        }
    }
    Ok(parsed)
}

pub fn write_term_bank(path: &Path, rows: &[TermBankRow]) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let values: Vec<Value> = rows.iter().map(TermBankRow::to_value).collect();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &values)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_ordered_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["term_bank_10.json", "term_bank_2.json", "index.json", "term_bank_1.json"] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }

        let names: Vec<String> = term_bank_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["term_bank_1.json", "term_bank_2.json", "term_bank_10.json"]);
    }

    #[test]
    fn written_rows_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Weblio").join("term_bank_1.json");
        let rows = vec![TermBankRow::plain("鯛", "たい", ["大辞泉|||魚。".to_string()])];

        write_term_bank(&path, &rows).unwrap();

        assert_eq!(read_term_bank(&path).unwrap(), rows);
    }

    #[test]
    fn missing_folder_is_reported() {
        let err = term_bank_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
    }
}
