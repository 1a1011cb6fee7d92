pub mod loaders;
mod store;
pub mod types;

pub use store::JsonStore;
pub use types::TermBankRow;
