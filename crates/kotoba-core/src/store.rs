use crate::dictionary::LookupContext;
use crate::error::StoreError;

/// Persistent home of the index, reading history and not-found caches
pub trait DictionaryStore {
    /// Loads everything once at the start of a run
    fn load(&self) -> Result<LookupContext, StoreError>;

    /// Writes everything back
    fn save(&self, ctx: &LookupContext) -> Result<(), StoreError>;

    /// Flushes one source right after it gained entries, so a crash keeps them
    fn persist_source(&self, ctx: &LookupContext, source: &str) -> Result<(), StoreError>;
}
