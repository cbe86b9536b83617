use tablegrid::state::data_model::ValueKind;
use tablegrid::state::i18n::{self, Language};
use std::collections::BTreeSet;

#[test]
fn test_default_language_is_english() {
    assert_eq!(Language::default(), Language::En);
    assert_eq!(i18n::tr(Language::default(), "toolbar.open"), "Open");
}

#[test]
fn test_language_switch_changes_ui_text() {
    assert_eq!(i18n::tr(Language::En, "toolbar.open"), "Open");
    assert_eq!(i18n::tr(Language::ZhHant, "toolbar.open"), "開啟");
}

#[test]
fn test_missing_key_falls_back_to_english() {
    assert_eq!(
        i18n::tr(Language::ZhHant, "test.fallback_only"),
        "Fallback value"
    );
}

#[test]
fn test_language_code_roundtrip() {
    assert_eq!(Language::from_code("en"), Some(Language::En));
    assert_eq!(Language::from_code("zh-Hant"), Some(Language::ZhHant));
    assert_eq!(Language::from_code("unknown"), None);
}

#[test]
fn test_zh_hant_catalog_matches_english_keys_except_fallback_probe() {
    let en: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(include_str!("../assets/i18n/en.json"))
            .expect("en.json should be valid JSON object");
    let zh: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(include_str!("../assets/i18n/zh-Hant.json"))
            .expect("zh-Hant.json should be valid JSON object");

    let allowed_missing: BTreeSet<&str> = BTreeSet::from(["test.fallback_only"]);

    let en_keys: BTreeSet<&str> = en.keys().map(String::as_str).collect();
    let zh_keys: BTreeSet<&str> = zh.keys().map(String::as_str).collect();

    let missing: Vec<&str> = en_keys
        .difference(&zh_keys)
        .copied()
        .filter(|key| !allowed_missing.contains(key))
        .collect();

    assert!(
        missing.is_empty(),
        "zh-Hant catalog is missing keys: {}",
        missing.join(", ")
    );
}

#[test]
fn test_every_kind_has_a_label() {
    for language in Language::all().iter().copied() {
        for kind in ValueKind::all() {
            assert_ne!(
                i18n::tr(language, kind.label_key()),
                kind.label_key(),
                "missing label for {kind} in {}",
                language.code()
            );
        }
    }
}

#[test]
fn test_placeholders_are_substituted() {
    let text = i18n::tr_with(
        Language::En,
        "dialog.data_loss_body",
        &[("column", "code"), ("kind", "Integer"), ("rows", "1")],
    );
    assert!(text.contains("\"code\""));
    assert!(text.contains("Integer"));
    assert!(!text.contains('{'));

    let zh = i18n::tr_with(Language::ZhHant, "dialog.choose_sheet_body", &[("sheet", "Data")]);
    assert!(zh.contains("Data"));
}

#[test]
fn test_unknown_key_echoes_key() {
    assert_eq!(i18n::tr(Language::ZhHant, "no.such.key"), "no.such.key");
}
