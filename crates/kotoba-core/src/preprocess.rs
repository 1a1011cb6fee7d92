use unicode_normalization::UnicodeNormalization;

pub trait Preprocessor {
    /// Default cell cleanup for headwords and readings
    fn process(&self, text: &str) -> String {
        let mut text = text.trim().to_string();

        if text.is_empty() {
            return text;
        }

        // Unicode normalization (NFKC)
        text = text.nfkc().collect();

        text = text.replace(['\n', '\r'], "").trim().to_string();

        text
    }
}

pub struct DefaultPreprocessor;
impl Preprocessor for DefaultPreprocessor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_half_width_katakana_and_newlines() {
        let p = DefaultPreprocessor;
        assert_eq!(p.process("  ｶﾀｶﾅ\r\n"), "カタカナ");
        assert_eq!(p.process("１００円"), "100円");
        assert_eq!(p.process("   "), "");
    }
}
