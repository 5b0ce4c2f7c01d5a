//! Text normalization for address and name comparison.
//!
//! Source exports arrive with two recurring corruptions: UTF-8 text decoded
//! as Latin-1 (`Ã¡` where `á` was meant) and U+FFFD replacement characters
//! inside well-known province names. Everything that compares order text
//! against catalog text goes through [`normalize`] first, which repairs both
//! and reduces the string to a diacritic-free, single-spaced token form.
//!
//! All functions here are pure; `normalize` and `normalize_upper` are
//! idempotent (`normalize(normalize(x)) == normalize(x)`).

use regex::Regex;
use std::sync::OnceLock;

/// UTF-8 byte pairs mis-decoded as Latin-1. Two-character sequences must be
/// replaced before the lone `Ã` fallback at the end of the table.
const MOJIBAKE: &[(&str, &str)] = &[
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã­", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã‰", "É"),
    ("Ãš", "Ú"),
    ("Ã§", "ç"),
    ("Ã¼", "ü"),
    ("Ã¶", "ö"),
    ("Ã", "Á"),
];

fn replacement_repairs() -> &'static [(Regex, &'static str)] {
    static REPAIRS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    REPAIRS.get_or_init(|| {
        // Province names that show up with U+FFFD or with the accented letter
        // dropped entirely. Word-bounded so street names stay untouched.
        let rules: &[(&str, &str)] = &[
            (r"(?i)\bentre r[\u{FFFD}]?os\b", "Entre Ríos"),
            (r"(?i)\bc[\u{FFFD}]?rdoba\b", "Córdoba"),
            (r"(?i)\bneuqu[\u{FFFD}]?n\b", "Neuquén"),
            (r"(?i)\btucum[\u{FFFD}]?n\b", "Tucumán"),
            (r"(?i)\br[\u{FFFD}]?o negro\b", "Río Negro"),
        ];
        rules
            .iter()
            .map(|(pat, rep)| (Regex::new(pat).expect("static repair pattern"), *rep))
            .collect()
    })
}

/// Repairs known encoding corruption without otherwise altering the text.
pub fn repair_encoding(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut repaired = text.to_string();
    for (bad, good) in MOJIBAKE {
        if repaired.contains(bad) {
            repaired = repaired.replace(bad, good);
        }
    }

    for (pattern, replacement) in replacement_repairs() {
        if pattern.is_match(&repaired) {
            repaired = pattern.replace_all(&repaired, *replacement).into_owned();
        }
    }

    // Whatever U+FFFD survives the contextual repairs carries no information.
    if repaired.contains('\u{FFFD}') {
        repaired = repaired.replace('\u{FFFD}', "");
    }

    repaired
}

/// Maps accented Latin letters to their base letter, leaving everything else
/// alone.
pub fn strip_diacritics(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            'Á' | 'À' | 'Ä' | 'Â' | 'Ã' | 'Å' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// Canonical lowercase comparable form: encoding repaired, diacritics
/// stripped, punctuation collapsed to single spaces.
pub fn normalize(text: &str) -> String {
    let repaired = repair_encoding(text);
    let stripped = strip_diacritics(&repaired);

    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for c in stripped.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Uppercase twin of [`normalize`], for call sites that compare against
/// uppercase reference data (postal regions, province tables).
pub fn normalize_upper(text: &str) -> String {
    normalize(text).to_ascii_uppercase()
}

/// Strict carrier-safe form: keeps letters, digits, spaces, hyphens and
/// periods only. The carrier rejects every other character outright, so this
/// variant is intentionally lossy and one-way. Case is preserved.
pub fn normalize_strict(text: &str) -> String {
    let repaired = repair_encoding(text);
    let stripped = strip_diacritics(&repaired);

    let mut cleaned = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{201C}' | '\u{201D}'
            | '\u{0027}' | '"' | '`' => {}
            '\u{2013}' | '\u{2014}' => cleaned.push('-'),
            '\u{2026}' => cleaned.push_str("..."),
            c if c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '.' => cleaned.push(c),
            _ => cleaned.push(' '),
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn street_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rules: &[(&str, &str)] = &[
            (r"\bruta nacional (\d+)", "rn$1"),
            (r"\bruta (\d+)", "rn$1"),
            (r"\brn (\d+)", "rn$1"),
            (r"\bavenida\b", "av"),
            (r"\bdoctor\b", "dr"),
            (r"\bgeneral\b", "gral"),
            (r"\bprofesor\b", "prof"),
            (r"\bingeniero\b", "ing"),
            (r"^(?:calle )+", ""),
        ];
        rules
            .iter()
            .map(|(pat, rep)| (Regex::new(pat).expect("static street pattern"), *rep))
            .collect()
    })
}

/// Folds street-designator spelling variants onto one form so that
/// "Ruta Nacional 40", "Ruta 40" and "RN 40" compare equal. Applies
/// [`normalize`] first.
pub fn fold_street_designators(text: &str) -> String {
    let mut folded = normalize(text);
    for (pattern, replacement) in street_rules() {
        if pattern.is_match(&folded) {
            folded = pattern.replace_all(&folded, *replacement).into_owned();
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn digit_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static digit pattern"))
}

/// Every digit run in the text, parsed as integers. Runs too long for i64
/// are ignored.
pub fn numeric_tokens(text: &str) -> Vec<i64> {
    digit_runs()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .collect()
}

/// The last digit run in the text (the street number in "Balcarce 333").
pub fn trailing_number(text: &str) -> Option<i64> {
    numeric_tokens(text).pop()
}

/// Byte offset and text of the last digit run, leading zeros preserved.
pub fn trailing_digit_run(text: &str) -> Option<(usize, &str)> {
    digit_runs()
        .find_iter(text)
        .last()
        .map(|m| (m.start(), m.as_str()))
}

fn postal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Argentine postal codes are 4 digits, optionally prefixed by the
    // province letter in CPA form ("B8000" for Bahía Blanca).
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z]?(\d{4})\b").expect("static postal pattern"))
}

/// Digit core of a declared postal code: "B8000" and "8000" both yield
/// "8000".
pub fn postal_digits(code: &str) -> String {
    code.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Postal codes embedded in a free-text address, CPA letter stripped.
pub fn embedded_postal_codes(text: &str) -> Vec<String> {
    postal_pattern()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_mojibake_sequences() {
        assert_eq!(repair_encoding("Bahía Blanca"), "Bahía Blanca");
        assert_eq!(repair_encoding("BahÃ­a Blanca"), "Bahía Blanca");
        assert_eq!(repair_encoding("Ã±andÃº"), "ñandú");
    }

    #[test]
    fn test_repair_replacement_characters() {
        assert_eq!(repair_encoding("Entre R\u{FFFD}os"), "Entre Ríos");
        assert_eq!(repair_encoding("C\u{FFFD}rdoba"), "Córdoba");
        assert_eq!(repair_encoding("Tucumn"), "Tucumán");
        assert_eq!(repair_encoding("Ro Negro"), "Río Negro");
        // Unknown context: the replacement character is dropped.
        assert_eq!(repair_encoding("Av. Rivad\u{FFFD}via"), "Av. Rivadvia");
    }

    #[test]
    fn test_normalize_canonical_form() {
        assert_eq!(normalize("  Bahía   Blanca, (Bs. As.) "), "bahia blanca bs as");
        assert_eq!(normalize("CÓRDOBA / CAPITAL"), "cordoba capital");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "BahÃ­a Blanca",
            "Entre R\u{FFFD}os",
            "Gral. JosÉ de San MartÍn, 1175",
            "  ña-ña  ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_normalize_upper() {
        assert_eq!(normalize_upper("Bahía Blanca"), "BAHIA BLANCA");
    }

    #[test]
    fn test_normalize_strict_drops_forbidden_characters() {
        assert_eq!(normalize_strict("O’Higgins Nº 1234"), "OHiggins N 1234");
        assert_eq!(normalize_strict("PB “A” – Dto. 2"), "PB A - Dto. 2");
        assert_eq!(normalize_strict("Güemes 45, 3º B"), "Guemes 45 3 B");
    }

    #[test]
    fn test_fold_street_designators() {
        assert_eq!(fold_street_designators("Ruta Nacional 40 km 2"), "rn40 km 2");
        assert_eq!(fold_street_designators("Ruta 40"), "rn40");
        assert_eq!(fold_street_designators("RN 40"), "rn40");
        assert_eq!(fold_street_designators("Avenida Gral. Paz"), "av gral paz");
        assert_eq!(fold_street_designators("Calle Falsa 123"), "falsa 123");
    }

    #[test]
    fn test_numeric_and_trailing_tokens() {
        assert_eq!(numeric_tokens("Balcarce 333, B8000"), vec![333, 8000]);
        assert_eq!(trailing_number("Av. San Martín 1175"), Some(1175));
        assert_eq!(trailing_number("sin numero"), None);
    }

    #[test]
    fn test_trailing_digit_run_keeps_leading_zeros() {
        assert_eq!(trailing_digit_run("Guemes 050"), Some((7, "050")));
        assert_eq!(trailing_digit_run("Ruta 3 km 695"), Some((10, "695")));
        assert_eq!(trailing_digit_run("sin numero"), None);
    }

    #[test]
    fn test_postal_digits() {
        assert_eq!(postal_digits("B8000"), "8000");
        assert_eq!(postal_digits(" 8000 "), "8000");
        assert_eq!(postal_digits("B8000CTX"), "8000");
        assert_eq!(postal_digits(""), "");
    }

    #[test]
    fn test_embedded_postal_codes() {
        assert_eq!(
            embedded_postal_codes("Balcarce 333, B8000 Bahía Blanca"),
            vec!["8000"]
        );
        assert_eq!(
            embedded_postal_codes("Blvd. Balcarce 445, S2500 Cañada de Gomez"),
            vec!["2500"]
        );
        assert!(embedded_postal_codes("Balcarce 333").is_empty());
    }
}
