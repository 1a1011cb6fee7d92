pub mod cleanup;
pub mod kana;
pub mod linker;
pub mod loader;
pub mod lookup;
pub mod markers;
pub mod outline;
pub mod processor;
pub mod rank;
pub mod ref_path;
pub mod variants;
pub mod weblio;

pub use cleanup::Cleaner;
pub use linker::Linker;
pub use loader::TermBankLoader;
pub use lookup::LookupEngine;
pub use markers::{Family, Marker, Step};
pub use outline::Outline;
pub use processor::JapaneseProcessor;
pub use rank::rank_sources;
pub use ref_path::ReferencePath;
pub use variants::JapaneseVariants;
pub use weblio::WeblioLookup;
