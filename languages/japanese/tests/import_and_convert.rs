use kotoba_config::Config;
use kotoba_core::DictionaryStore;
use kotoba_dictionary::loaders::write_term_bank;
use kotoba_dictionary::{JsonStore, TermBankRow};
use kotoba_lang_japanese::{JapaneseProcessor, TermBankLoader};

fn row(word: &str, reading: &str, definition: &str) -> TermBankRow {
    TermBankRow::plain(word, reading, [definition.to_string()])
}

#[test]
fn imported_dictionary_survives_a_restart_and_links() {
    let root = tempfile::tempdir().unwrap();
    let dict_dir = root.path().join("大辞林");
    write_term_bank(
        &dict_dir.join("term_bank_1.json"),
        &[
            row("鯛", "タイ", "①魚の一種。②美味な赤い魚。"),
            row("魚", "さかな", "水中の生き物。⇒鯛②。"),
        ],
    )
    .unwrap();

    let store = JsonStore::new(root.path().join("data"));
    let mut ctx = store.load().unwrap();
    let added = TermBankLoader::default().load_dir(&mut ctx, &dict_dir).unwrap();
    assert_eq!(added, 2);
    store.save(&ctx).unwrap();

    let mut ctx = store.load().unwrap();
    assert_eq!(ctx.history.readings("鯛").collect::<Vec<_>>(), vec!["たい"]);

    let processor = JapaneseProcessor::new(&Config::default());
    let results = processor.convert(&mut ctx, None, "魚", "さかな");

    let definitions = &results["大辞林"][0].definitions;
    assert_eq!(definitions.len(), 1);
    assert!(definitions[0].starts_with("水中の生き物。"));
    assert!(definitions[0].contains("Linked 鯛【たい】"));
    assert!(definitions[0].ends_with("美味な赤い魚。"));
}

#[test]
fn kana_headwords_fall_back_to_guesses() {
    let root = tempfile::tempdir().unwrap();
    let dict_dir = root.path().join("大辞泉");
    write_term_bank(&dict_dir.join("term_bank_1.json"), &[row("鯛", "たい", "たい【鯛】\n魚の名。")]).unwrap();

    let mut ctx = JsonStore::new(root.path().join("data")).load().unwrap();
    TermBankLoader::default().load_dir(&mut ctx, &dict_dir).unwrap();

    let processor = JapaneseProcessor::new(&Config::default());
    let results = processor.convert(&mut ctx, None, "たい", "たい");

    let entry = &results["大辞泉"][0];
    assert_eq!(entry.word, "鯛");
    assert_eq!(entry.definitions, vec!["魚の名。"]);
    assert!(entry.is_guess());
}
