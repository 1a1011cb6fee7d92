use kotoba_types::WordVariant;

use crate::dictionary::ReadingHistory;

/// Produces the spellings a headword may be filed under
pub trait VariantGenerator {
    /// Ordered, duplicate-free candidates; the input pair always comes first.
    ///
    /// `extended` adds reading-driven forms used when scanning by reading.
    fn variants(
        &self,
        word: &str,
        reading: &str,
        history: &ReadingHistory,
        extended: bool,
    ) -> Vec<WordVariant>;
}
