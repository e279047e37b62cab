//! Per-country lookup tables backing phone and postal-code validation.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Digit-length bounds and dialing prefix for a country's phone numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneRule {
    pub country: &'static str,
    pub dial_code: &'static str,
    pub min_digits: usize,
    pub max_digits: usize,
}

const fn rule(
    country: &'static str,
    dial_code: &'static str,
    min_digits: usize,
    max_digits: usize,
) -> PhoneRule {
    PhoneRule {
        country,
        dial_code,
        min_digits,
        max_digits,
    }
}

/// National significant number lengths, keyed by ISO 3166-1 alpha-2 code.
pub const PHONE_RULES: &[PhoneRule] = &[
    // North America
    rule("US", "+1", 10, 10),
    rule("CA", "+1", 10, 10),
    rule("MX", "+52", 10, 10),
    rule("PR", "+1", 10, 10),
    rule("DO", "+1", 10, 10),
    // Central and South America
    rule("GT", "+502", 8, 8),
    rule("CR", "+506", 8, 8),
    rule("PA", "+507", 7, 8),
    rule("CO", "+57", 10, 10),
    rule("VE", "+58", 10, 10),
    rule("EC", "+593", 9, 9),
    rule("PE", "+51", 9, 9),
    rule("BO", "+591", 8, 8),
    rule("BR", "+55", 10, 11),
    rule("PY", "+595", 9, 9),
    rule("UY", "+598", 8, 8),
    rule("AR", "+54", 10, 11),
    rule("CL", "+56", 9, 9),
    // Europe
    rule("GB", "+44", 10, 10),
    rule("IE", "+353", 9, 9),
    rule("FR", "+33", 9, 9),
    rule("DE", "+49", 10, 11),
    rule("ES", "+34", 9, 9),
    rule("PT", "+351", 9, 9),
    rule("IT", "+39", 9, 10),
    rule("NL", "+31", 9, 9),
    rule("BE", "+32", 8, 9),
    rule("CH", "+41", 9, 9),
    rule("AT", "+43", 10, 13),
    rule("SE", "+46", 7, 9),
    rule("NO", "+47", 8, 8),
    rule("DK", "+45", 8, 8),
    rule("FI", "+358", 9, 10),
    rule("PL", "+48", 9, 9),
    rule("CZ", "+420", 9, 9),
    rule("GR", "+30", 10, 10),
    rule("HU", "+36", 8, 9),
    rule("RO", "+40", 9, 9),
    rule("UA", "+380", 9, 9),
    rule("RU", "+7", 10, 10),
    rule("TR", "+90", 10, 10),
    // Middle East and Africa
    rule("IL", "+972", 9, 9),
    rule("AE", "+971", 9, 9),
    rule("SA", "+966", 9, 9),
    rule("EG", "+20", 10, 10),
    rule("MA", "+212", 9, 9),
    rule("NG", "+234", 10, 10),
    rule("KE", "+254", 9, 9),
    rule("ZA", "+27", 9, 9),
    // Asia Pacific
    rule("IN", "+91", 10, 10),
    rule("PK", "+92", 10, 10),
    rule("BD", "+880", 10, 10),
    rule("CN", "+86", 11, 11),
    rule("JP", "+81", 10, 10),
    rule("KR", "+82", 9, 10),
    rule("TW", "+886", 9, 9),
    rule("HK", "+852", 8, 8),
    rule("SG", "+65", 8, 8),
    rule("MY", "+60", 9, 10),
    rule("TH", "+66", 9, 9),
    rule("VN", "+84", 9, 10),
    rule("PH", "+63", 10, 10),
    rule("ID", "+62", 9, 12),
    rule("AU", "+61", 9, 9),
    rule("NZ", "+64", 8, 10),
];

const POSTAL_PATTERNS: &[(&str, &str)] = &[
    ("US", r"^\d{5}(-\d{4})?$"),
    ("CA", r"^[A-Za-z]\d[A-Za-z][ -]?\d[A-Za-z]\d$"),
    ("GB", r"^[A-Za-z]{1,2}\d[A-Za-z\d]?\s?\d[A-Za-z]{2}$"),
    ("DE", r"^\d{5}$"),
    ("FR", r"^\d{5}$"),
    ("ES", r"^\d{5}$"),
    ("IT", r"^\d{5}$"),
    ("MX", r"^\d{5}$"),
    ("NL", r"^\d{4}\s?[A-Za-z]{2}$"),
    ("BE", r"^\d{4}$"),
    ("CH", r"^\d{4}$"),
    ("AT", r"^\d{4}$"),
    ("AU", r"^\d{4}$"),
    ("PT", r"^\d{4}-\d{3}$"),
    ("SE", r"^\d{3}\s?\d{2}$"),
    ("JP", r"^\d{3}-?\d{4}$"),
    ("BR", r"^\d{5}-?\d{3}$"),
    ("IN", r"^\d{6}$"),
];

static COMPILED_POSTAL: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    POSTAL_PATTERNS
        .iter()
        .filter_map(|(country, pattern)| Regex::new(pattern).ok().map(|re| (*country, re)))
        .collect()
});

fn normalize_country(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Phone rule for a country code, if the table knows it.
pub fn phone_rule(country_code: &str) -> Option<&'static PhoneRule> {
    let code = normalize_country(country_code);
    PHONE_RULES.iter().find(|rule| rule.country == code)
}

/// International dialing prefix (e.g. `+44`) for a country code.
pub fn dial_code(country_code: &str) -> Option<&'static str> {
    phone_rule(country_code).map(|rule| rule.dial_code)
}

/// Compiled postal-code pattern for a country code.
pub fn postal_pattern(country_code: &str) -> Option<&'static Regex> {
    let code = normalize_country(country_code);
    COMPILED_POSTAL.get(code.as_str())
}
