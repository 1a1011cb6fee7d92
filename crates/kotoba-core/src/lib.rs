pub mod dictionary;
pub mod error;
pub mod language;
pub mod preprocess;
pub mod store;

pub use dictionary::{DictionaryIndex, LookupContext, NotFoundCache, ReadingHistory};
pub use error::{LoadError, RowError, StoreError};
pub use language::VariantGenerator;
pub use store::DictionaryStore;
