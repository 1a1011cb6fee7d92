use kotoba_core::{DictionaryStore, LookupContext};
use kotoba_types::{LookupEntry, RemoteRecord, SourceResults};

/// Separates the sub-dictionary name from the text in stored remote definitions
pub const SUB_SOURCE_SEPARATOR: &str = "|||";

/// A remote dictionary service
pub trait RemoteLookup {
    /// Source name the results are filed under
    fn name(&self) -> &str;

    /// Fetch entries for `query`. An empty vector means the service has no such word.
    fn lookup(
        &self,
        query: &str,
        desired_reading: Option<&str>,
    ) -> Result<Vec<RemoteRecord>, RemoteError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected page layout: {0}")]
    ParseError(String),
}

/// Splits a stored remote definition into its sub-dictionary and text
pub fn split_stored(definition: &str) -> (Option<&str>, &str) {
    match definition.split_once(SUB_SOURCE_SEPARATOR) {
        Some((sub, text)) => (Some(sub), text),
        None => (None, definition),
    }
}

/// Result label of a remote sub-dictionary, e.g. `Weblio>大辞泉`
pub fn remote_label(provider: &str, sub: &str) -> String {
    format!("{provider}>{sub}")
}

/// The backing source of a label produced by [`remote_label`]
pub fn label_provider(label: &str) -> &str {
    label.split_once('>').map_or(label, |(provider, _)| provider)
}

/// Remote providers plus the bookkeeping every remote call needs:
/// the not-found cache, write-back into the index and immediate persistence.
pub struct RemoteSources<'s> {
    providers: Vec<Box<dyn RemoteLookup + 's>>,
    store: Option<&'s dyn DictionaryStore>,
}

impl<'s> RemoteSources<'s> {
    pub fn new(store: Option<&'s dyn DictionaryStore>) -> Self {
        Self {
            providers: Vec::new(),
            store,
        }
    }

    /// No providers; every fetch is a miss
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn with_provider(mut self, provider: impl RemoteLookup + 's) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }

    /// Asks every provider that has not already ruled `query` out.
    ///
    /// Hits are filed into the index under the provider's name, persisted at
    /// once and returned tagged as guesses. A transport failure only counts as
    /// a miss for this attempt.
    pub fn fetch(
        &self,
        ctx: &mut LookupContext,
        query: &str,
        desired_reading: Option<&str>,
    ) -> SourceResults {
        let mut results = SourceResults::new();
        let query = query.trim();
        if query.is_empty() {
            return results;
        }
        let desired_reading = desired_reading.filter(|r| !r.is_empty());

        for provider in &self.providers {
            let name = provider.name();
            if ctx.not_found.contains(name, query) {
                tracing::debug!("Skipping {query} in {name}: known to be absent");
                continue;
            }

            tracing::info!("Looking for {query} in {name} (reading {desired_reading:?})");
            let records = match provider.lookup(query, desired_reading) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("{name} unavailable for {query}: {e}");
                    continue;
                }
            };

            if records.is_empty() {
                tracing::info!("{query} not found in {name}");
                ctx.not_found.insert(name, query);
                continue;
            }

            let mut added = 0;
            for record in records {
                if let Some(reading) = desired_reading {
                    if !record.reading.contains(reading) {
                        continue;
                    }
                }

                let stored = format!("{}{SUB_SOURCE_SEPARATOR}{}", record.source, record.definition);
                added += ctx.record_entry(name, &record.reading, &record.word, [stored]);

                results
                    .entry(remote_label(name, &record.source))
                    .or_default()
                    .push(
                        LookupEntry::new(record.word, record.reading, vec![record.definition])
                            .guessed(),
                    );
            }

            if added > 0 {
                self.persist(ctx, name);
            }
        }

        results
    }

    fn persist(&self, ctx: &LookupContext, source: &str) {
        let Some(store) = self.store else {
            return;
        };
        match store.persist_source(ctx, source) {
            Ok(()) => tracing::info!("Saved new {source} findings"),
            Err(e) => tracing::error!("Failed to save {source} findings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use kotoba_core::StoreError;

    use super::*;

    struct FakeService {
        calls: Cell<usize>,
        answer: fn(&str) -> Result<Vec<RemoteRecord>, RemoteError>,
    }

    impl FakeService {
        fn new(answer: fn(&str) -> Result<Vec<RemoteRecord>, RemoteError>) -> Self {
            Self {
                calls: Cell::new(0),
                answer,
            }
        }
    }

    impl RemoteLookup for &FakeService {
        fn name(&self) -> &str {
            "Weblio"
        }

        fn lookup(&self, query: &str, _: Option<&str>) -> Result<Vec<RemoteRecord>, RemoteError> {
            self.calls.set(self.calls.get() + 1);
            (self.answer)(query)
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        persisted: RefCell<Vec<String>>,
    }

    impl DictionaryStore for RecordingStore {
        fn load(&self) -> Result<LookupContext, StoreError> {
            Ok(LookupContext::default())
        }

        fn save(&self, _: &LookupContext) -> Result<(), StoreError> {
            Ok(())
        }

        fn persist_source(&self, _: &LookupContext, source: &str) -> Result<(), StoreError> {
            self.persisted.borrow_mut().push(source.to_string());
            Ok(())
        }
    }

    fn found(query: &str) -> Result<Vec<RemoteRecord>, RemoteError> {
        Ok(vec![RemoteRecord {
            source: "デジタル大辞泉".into(),
            word: query.into(),
            reading: "たい".into(),
            definition: "スズキ目の魚。".into(),
        }])
    }

    #[test]
    fn hits_are_written_back_and_persisted() {
        let service = FakeService::new(found);
        let store = RecordingStore::default();
        let sources = RemoteSources::new(Some(&store)).with_provider(&service);
        let mut ctx = LookupContext::default();

        let results = sources.fetch(&mut ctx, "鯛", Some("たい"));

        let entries = &results["Weblio>デジタル大辞泉"];
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_guess());
        assert!(ctx.index.contains("Weblio", "たい", "鯛"));
        assert_eq!(
            ctx.index.definitions("Weblio", "たい", "鯛").unwrap()[0],
            "デジタル大辞泉|||スズキ目の魚。"
        );
        assert_eq!(ctx.history.readings("鯛").collect::<Vec<_>>(), vec!["たい"]);
        assert_eq!(*store.persisted.borrow(), vec!["Weblio".to_string()]);
    }

    #[test]
    fn misses_are_cached_and_not_retried() {
        let service = FakeService::new(|_| Ok(vec![]));
        let sources = RemoteSources::disabled().with_provider(&service);
        let mut ctx = LookupContext::default();

        assert!(sources.fetch(&mut ctx, "ほげ", None).is_empty());
        assert!(sources.fetch(&mut ctx, "ほげ", None).is_empty());

        assert_eq!(service.calls.get(), 1);
        assert!(ctx.not_found.contains("Weblio", "ほげ"));
    }

    #[test]
    fn transport_errors_are_not_cached() {
        let service = FakeService::new(|_| Err(RemoteError::ParseError("no heading".into())));
        let sources = RemoteSources::disabled().with_provider(&service);
        let mut ctx = LookupContext::default();

        assert!(sources.fetch(&mut ctx, "ほげ", None).is_empty());
        assert!(!ctx.not_found.contains("Weblio", "ほげ"));
    }

    #[test]
    fn stored_definitions_split_on_separator() {
        assert_eq!(split_stored("大辞泉|||魚。"), (Some("大辞泉"), "魚。"));
        assert_eq!(split_stored("魚。"), (None, "魚。"));
        assert_eq!(label_provider("Weblio>大辞泉"), "Weblio");
        assert_eq!(label_provider("大辞林"), "大辞林");
    }
}
