mod term_bank;

pub use term_bank::{read_term_bank, term_bank_files, write_term_bank};
