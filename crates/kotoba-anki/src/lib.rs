mod deck;
mod template;

pub use deck::{Deck, DeckColumns, fixed_path};
pub use template::{TOGGLE_SCRIPT, build_definition_html};
