//! Phone splitting into carrier area-code / local-number pairs.

use crate::utils::normalize::normalize;

/// Area codes with four digits. Checked before the three-digit list so the
/// longest prefix wins.
const AREA_CODES_4: &[&str] = &[
    "2652", "2901", "2920", "2944", "2954", "2965", "2966", "3541",
];

const AREA_CODES_3: &[&str] = &[
    "221", "223", "291", "341", "342", "343", "351", "358", "261", "381", "376", "362", "379",
    "370", "387", "388", "380", "383", "385", "264", "297", "299",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneParts {
    pub area_code: String,
    pub number: String,
}

/// Splits a raw phone string into area code and local number.
///
/// Strips non-digits, the `+54` country prefix, and the mobile `9` that
/// Argentine numbers carry after the country code. The Buenos Aires metro
/// code `11` only applies when the declared province agrees, since `11` is a
/// common leading pair elsewhere.
pub fn split_phone(raw: &str, province: &str) -> PhoneParts {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if let Some(rest) = digits.strip_prefix("54") {
        digits = rest.to_string();
    }
    if let Some(rest) = digits.strip_prefix('9') {
        digits = rest.to_string();
    }

    let province_norm = normalize(province);
    let metro = province_norm.contains("buenos aires")
        || province_norm.contains("capital federal")
        || province_norm.contains("caba");
    if metro && digits.starts_with("11") {
        return PhoneParts {
            area_code: "11".to_string(),
            number: digits[2..].to_string(),
        };
    }

    for code in AREA_CODES_4 {
        if digits.starts_with(code) {
            return PhoneParts {
                area_code: code.to_string(),
                number: digits[4..].to_string(),
            };
        }
    }

    for code in AREA_CODES_3 {
        if digits.starts_with(code) {
            return PhoneParts {
                area_code: code.to_string(),
                number: digits[3..].to_string(),
            };
        }
    }

    // Unknown code: assume a four-digit area code rather than dropping it.
    let cut = digits.len().min(4);
    PhoneParts {
        area_code: digits[..cut].to_string(),
        number: digits[cut..].to_string(),
    }
}
