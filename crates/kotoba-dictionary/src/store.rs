use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use kotoba_core::{
    DictionaryIndex, DictionaryStore, LoadError, LookupContext, NotFoundCache, ReadingHistory,
    StoreError,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::loaders::{read_term_bank, term_bank_files, write_term_bank};
use crate::types::TermBankRow;

const INDEX_FILE: &str = "big_data.json";
const HISTORY_FILE: &str = "word_to_readings_map.json";
const NOT_FOUND_FILE: &str = "not_found.json";
const REMOTE_DIR: &str = "remote";

/// Keeps the run state as JSON files under one data folder:
///
/// - `big_data.json`: source -> reading -> word -> definitions
/// - `word_to_readings_map.json`: word -> readings
/// - `not_found.json`: remote source -> queries known to be absent
/// - `remote/<source>/term_bank_1.json`: remote findings, flushed as they arrive
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn remote_bank(&self, source: &str) -> PathBuf {
        self.dir.join(REMOTE_DIR).join(source).join("term_bank_1.json")
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.dir.join(name);
        if !path.exists() {
            tracing::warn!("{} missing, starting empty", path.display());
            return Ok(T::default());
        }
        let file = File::open(&path).map_err(|e| StoreError::io(&path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::json(&path, e))
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let path = self.dir.join(name);
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
            serde_json::to_writer(BufWriter::new(file), value)
                .map_err(|e| StoreError::json(&tmp, e))?;
        }
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))
    }

    /// Folds previously flushed remote findings back into the index
    fn merge_remote(&self, ctx: &mut LookupContext) {
        let remote = self.dir.join(REMOTE_DIR);
        let Ok(entries) = fs::read_dir(&remote) else {
            return;
        };

        for entry in entries.filter_map(Result::ok) {
            let Some(source) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Err(e) = self.merge_remote_source(ctx, &source, &entry.path()) {
                tracing::warn!("Could not read remote findings of {source}: {e}");
            }
        }
    }

    fn merge_remote_source(
        &self,
        ctx: &mut LookupContext,
        source: &str,
        dir: &Path,
    ) -> Result<(), LoadError> {
        let mut added = 0;
        for file in term_bank_files(dir)? {
            for row in read_term_bank(&file)? {
                let defs: Vec<String> = row.text_definitions().map(str::to_string).collect();
                added += ctx.record_entry(source, &row.reading, &row.word, defs);
            }
        }
        tracing::info!("Merged {added} remote definitions of {source}");
        Ok(())
    }
}

impl DictionaryStore for JsonStore {
    fn load(&self) -> Result<LookupContext, StoreError> {
        let index: DictionaryIndex = self.read_or_default(INDEX_FILE)?;
        let history: ReadingHistory = self.read_or_default(HISTORY_FILE)?;
        let not_found: NotFoundCache = self.read_or_default(NOT_FOUND_FILE)?;

        for source in index.source_names() {
            tracing::info!("Loaded {} entries of {source}", index.entry_count(source));
        }

        let mut ctx = LookupContext::new(index, history, not_found);
        self.merge_remote(&mut ctx);
        Ok(ctx)
    }

    fn save(&self, ctx: &LookupContext) -> Result<(), StoreError> {
        self.write(INDEX_FILE, &ctx.index)?;
        self.write(HISTORY_FILE, &ctx.history)?;
        self.write(NOT_FOUND_FILE, &ctx.not_found)?;
        tracing::info!("Saved dictionary data to {}", self.dir.display());
        Ok(())
    }

    fn persist_source(&self, ctx: &LookupContext, source: &str) -> Result<(), StoreError> {
        let path = self.remote_bank(source);
        let rows: Vec<TermBankRow> = ctx
            .index
            .source(source)
            .into_iter()
            .flat_map(|readings| readings.iter())
            .flat_map(|(reading, words)| {
                words
                    .iter()
                    .map(move |(word, defs)| TermBankRow::plain(word, reading, defs.iter().cloned()))
            })
            .collect();

        write_term_bank(&path, &rows).map_err(|e| match e {
            LoadError::ParseError(e) => StoreError::json(&path, e),
            LoadError::IoError(e) => StoreError::io(&path, e),
            other => StoreError::io(&path, std::io::Error::other(other.to_string())),
        })?;
        self.write(HISTORY_FILE, &ctx.history)
    }
}
