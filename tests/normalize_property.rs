//! Property tests for the text normalizer over fuzzed accented and
//! corrupted inputs.

use proptest::prelude::*;

use despacho::utils::normalize::{
    fold_street_designators, normalize, normalize_strict, normalize_upper, postal_digits,
    repair_encoding,
};
use despacho::utils::phone::split_phone;

fn cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(256)
}

/// Strings biased towards the corruption the normalizer exists to repair:
/// accented Latin text, mojibake pairs, and replacement characters.
fn corrupted_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[a-zA-Z0-9 .,;/-]{1,8}",
            Just("Ã¡".to_string()),
            Just("Ã­".to_string()),
            Just("Ã±".to_string()),
            Just("á".to_string()),
            Just("Ú".to_string()),
            Just("\u{FFFD}".to_string()),
            Just("Entre R\u{FFFD}os".to_string()),
            Just("C\u{FFFD}rdoba".to_string()),
            Just("Ruta Nacional 40".to_string()),
        ],
        0..6,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: cases(), ..ProptestConfig::default() })]

    #[test]
    fn normalize_is_idempotent(s in corrupted_text()) {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_deterministic(s in corrupted_text()) {
        prop_assert_eq!(normalize(&s), normalize(&s));
    }

    #[test]
    fn normalize_output_is_ascii_lowercase_words(s in corrupted_text()) {
        let out = normalize(&s);
        prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
        prop_assert!(!out.starts_with(' '));
        prop_assert!(!out.ends_with(' '));
        prop_assert!(!out.contains("  "));
    }

    #[test]
    fn normalize_upper_agrees_with_normalize(s in corrupted_text()) {
        prop_assert_eq!(normalize_upper(&s), normalize(&s).to_ascii_uppercase());
    }

    #[test]
    fn repair_never_leaves_replacement_characters(s in corrupted_text()) {
        let repaired = repair_encoding(&s);
        let clean = !repaired.contains('\u{FFFD}');
        prop_assert!(clean, "replacement character survived in {:?}", repaired);
    }

    #[test]
    fn strict_form_only_keeps_carrier_safe_characters(s in corrupted_text()) {
        let out = normalize_strict(&s);
        let safe = out
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '.');
        prop_assert!(safe, "forbidden character in {:?}", out);
    }

    #[test]
    fn street_folding_is_idempotent(s in corrupted_text()) {
        let once = fold_street_designators(&s);
        prop_assert_eq!(fold_street_designators(&once), once);
    }

    #[test]
    fn postal_digits_is_all_digits(s in "[A-Z]?[0-9]{0,6}[A-Z]{0,3}") {
        prop_assert!(postal_digits(&s).chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn phone_split_never_loses_digits(raw in "[0-9+ -]{0,18}", province in "[a-zA-Z ]{0,12}") {
        let parts = split_phone(&raw, &province);
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        let recombined = format!("{}{}", parts.area_code, parts.number);
        // Only the country prefix and the mobile nine may be stripped.
        prop_assert!(digits.ends_with(&recombined));
    }
}
