//! Script helpers. "Hiragana" here means the block ぁ..ゔ plus the long-vowel mark.

const KATAKANA_START: u32 = 0x30A1; // ァ
const KATAKANA_END: u32 = 0x30F6; // ヶ
const KANA_OFFSET: u32 = 0x60;

pub fn is_hiragana_char(c: char) -> bool {
    matches!(c, 'ぁ'..='ゔ' | 'ー')
}

pub fn is_katakana_char(c: char) -> bool {
    matches!(c, 'ァ'..='ヺ' | 'ー')
}

pub fn is_kanji_char(c: char) -> bool {
    matches!(c, '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}' | '々')
}

/// Non-empty and made only of hiragana
pub fn is_hiragana(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_hiragana_char)
}

/// Katakana folded to hiragana; everything else untouched
pub fn to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if (KATAKANA_START..=KATAKANA_END).contains(&code) {
                char::from_u32(code - KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Folds katakana, then drops everything that is not hiragana
pub fn hiragana_only(text: &str) -> String {
    to_hiragana(text).chars().filter(|c| is_hiragana_char(*c)).collect()
}

/// The hiragana left in a mixed-script word, e.g. 食べる -> べる
pub fn hiragana_residue(text: &str) -> String {
    text.chars().filter(|c| is_hiragana_char(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_katakana() {
        assert_eq!(to_hiragana("テンパる"), "てんぱる");
        assert_eq!(to_hiragana("キーボード"), "きーぼーど");
        assert_eq!(to_hiragana("漢字"), "漢字");
    }

    #[test]
    fn keeps_only_hiragana() {
        assert_eq!(hiragana_only("イソガシイ"), "いそがしい");
        assert_eq!(hiragana_only("お忙しい"), "おしい");
        assert_eq!(hiragana_only("[たい] "), "たい");
        assert!(is_hiragana("たい"));
        assert!(!is_hiragana("鯛"));
        assert!(!is_hiragana(""));
    }
}
