//! Stateless field validation.
//!
//! [`validate`] maps a raw input string and a [`FieldType`] to a
//! [`ValidationResult`]. It never fails and never panics: every invalid input
//! is reported as data with a user-facing message, so the same input always
//! produces the same result.

pub mod rules;

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const COMPANY_MIN: usize = 2;
const COMPANY_MAX: usize = 100;
const ADDRESS_MIN: usize = 5;
const ADDRESS_MAX: usize = 200;
const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;
const ZIP_MIN: usize = 3;
const ZIP_MAX: usize = 10;
const EMAIL_DOMAIN_MIN: usize = 3;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static NAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{00FF}\s'\-]+$")
        .expect("name pattern is valid")
});

/// Kind of input a field holds; selects the validator that runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Email,
    Phone,
    Name,
    Company,
    Address,
    ZipCode,
    Select,
    Required,
    Text,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        FieldType::Email,
        FieldType::Phone,
        FieldType::Name,
        FieldType::Company,
        FieldType::Address,
        FieldType::ZipCode,
        FieldType::Select,
        FieldType::Required,
        FieldType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Name => "name",
            FieldType::Company => "company",
            FieldType::Address => "address",
            FieldType::ZipCode => "zipCode",
            FieldType::Select => "select",
            FieldType::Required => "required",
            FieldType::Text => "text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(FieldType::Email),
            "phone" => Ok(FieldType::Phone),
            "name" => Ok(FieldType::Name),
            "company" => Ok(FieldType::Company),
            "address" => Ok(FieldType::Address),
            "zipcode" | "zip_code" | "zip" => Ok(FieldType::ZipCode),
            "select" => Ok(FieldType::Select),
            "required" => Ok(FieldType::Required),
            "text" => Ok(FieldType::Text),
            other => Err(format!(
                "Unknown field type `{}`. Expected one of: {}",
                other,
                FieldType::ALL
                    .iter()
                    .map(FieldType::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Outcome of validating a single value. `message` is empty when valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

/// Optional extra inputs: a display name for messages and a country code for
/// phone/postal rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    pub field_name: Option<String>,
    pub country_code: Option<String>,
}

impl ValidationContext {
    pub fn named(field_name: impl Into<String>) -> Self {
        Self {
            field_name: Some(field_name.into()),
            country_code: None,
        }
    }

    pub fn for_country(country_code: impl Into<String>) -> Self {
        Self {
            field_name: None,
            country_code: Some(country_code.into()),
        }
    }

    pub fn with_country(mut self, country_code: Option<&str>) -> Self {
        self.country_code = country_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string);
        self
    }

    fn name_or(&self, fallback: &'static str) -> &str {
        self.field_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(fallback)
    }

    fn country(&self) -> Option<&str> {
        self.country_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Validates `value` as `field_type`.
pub fn validate(value: &str, field_type: FieldType, context: &ValidationContext) -> ValidationResult {
    match field_type {
        FieldType::Text => ValidationResult::valid(),
        FieldType::Required => validate_required(value, context),
        FieldType::Email => validate_email(value),
        FieldType::Phone => validate_phone(value, context),
        FieldType::Name => validate_name(value, context),
        FieldType::Company => validate_company(value),
        FieldType::Address => validate_address(value),
        FieldType::ZipCode => validate_zip(value, context),
        FieldType::Select => validate_select(value, context),
    }
}

fn validate_required(value: &str, context: &ValidationContext) -> ValidationResult {
    if value.trim().is_empty() {
        ValidationResult::invalid(format!("{} is required", context.name_or("This field")))
    } else {
        ValidationResult::valid()
    }
}

fn validate_email(value: &str) -> ValidationResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid("Email is required");
    }
    if !EMAIL_SHAPE.is_match(trimmed) {
        return ValidationResult::invalid("Please enter a valid email address");
    }
    let domain = trimmed.rsplit('@').next().unwrap_or_default();
    if domain.chars().count() < EMAIL_DOMAIN_MIN {
        return ValidationResult::invalid("Please enter a valid email domain");
    }
    ValidationResult::valid()
}

fn validate_phone(value: &str, context: &ValidationContext) -> ValidationResult {
    if value.trim().is_empty() {
        return ValidationResult::invalid("Phone number is required");
    }
    let digits: String = value
        .chars()
        .filter(|ch| !(ch.is_whitespace() || matches!(ch, '-' | '(' | ')')))
        .collect();
    if !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return ValidationResult::invalid("Phone number can only contain digits");
    }
    let count = digits.len();

    if let Some(rule) = context.country().and_then(rules::phone_rule) {
        if count < rule.min_digits {
            return ValidationResult::invalid(format!(
                "Phone number is too short for {}: enter at least {} digits",
                rule.country, rule.min_digits
            ));
        }
        if count > rule.max_digits {
            return ValidationResult::invalid(format!(
                "Phone number is too long for {}: enter at most {} digits",
                rule.country, rule.max_digits
            ));
        }
        return ValidationResult::valid();
    }

    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&count) {
        return ValidationResult::invalid(format!(
            "Phone number must be between {} and {} digits",
            PHONE_MIN_DIGITS, PHONE_MAX_DIGITS
        ));
    }
    ValidationResult::valid()
}

fn validate_name(value: &str, context: &ValidationContext) -> ValidationResult {
    let label = context.name_or("Name");
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid(format!("{} is required", label));
    }
    let length = trimmed.chars().count();
    if length < NAME_MIN {
        return ValidationResult::invalid(format!(
            "{} must be at least {} characters",
            label, NAME_MIN
        ));
    }
    if length > NAME_MAX {
        return ValidationResult::invalid(format!(
            "{} cannot exceed {} characters",
            label, NAME_MAX
        ));
    }
    if !NAME_CHARS.is_match(trimmed) {
        return ValidationResult::invalid(format!(
            "{} can only contain letters, spaces, hyphens, and apostrophes",
            label
        ));
    }
    ValidationResult::valid()
}

fn validate_company(value: &str) -> ValidationResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid("Company name is required");
    }
    let length = trimmed.chars().count();
    if length < COMPANY_MIN {
        return ValidationResult::invalid(format!(
            "Company name must be at least {} characters",
            COMPANY_MIN
        ));
    }
    if length > COMPANY_MAX {
        return ValidationResult::invalid(format!(
            "Company name cannot exceed {} characters",
            COMPANY_MAX
        ));
    }
    ValidationResult::valid()
}

fn validate_address(value: &str) -> ValidationResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid("Address is required");
    }
    let length = trimmed.chars().count();
    if length < ADDRESS_MIN {
        return ValidationResult::invalid(format!(
            "Address must be at least {} characters",
            ADDRESS_MIN
        ));
    }
    if length > ADDRESS_MAX {
        return ValidationResult::invalid(format!(
            "Address cannot exceed {} characters",
            ADDRESS_MAX
        ));
    }
    ValidationResult::valid()
}

fn validate_zip(value: &str, context: &ValidationContext) -> ValidationResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid("ZIP code is required");
    }
    if let Some(country) = context.country() {
        if let Some(pattern) = rules::postal_pattern(country) {
            return if pattern.is_match(trimmed) {
                ValidationResult::valid()
            } else {
                ValidationResult::invalid(format!(
                    "Please enter a valid ZIP/postal code for {}",
                    country.to_ascii_uppercase()
                ))
            };
        }
    }
    let length = trimmed.chars().count();
    if !(ZIP_MIN..=ZIP_MAX).contains(&length) {
        return ValidationResult::invalid(format!(
            "ZIP/postal code must be between {} and {} characters",
            ZIP_MIN, ZIP_MAX
        ));
    }
    ValidationResult::valid()
}

fn validate_select(value: &str, context: &ValidationContext) -> ValidationResult {
    if value.is_empty() {
        ValidationResult::invalid(format!("Please select a {}", context.name_or("option")))
    } else {
        ValidationResult::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(value: &str, field_type: FieldType) -> ValidationResult {
        validate(value, field_type, &ValidationContext::default())
    }

    #[test]
    fn select_requires_a_choice() {
        let context = ValidationContext::named("state");
        assert_eq!(
            validate("", FieldType::Select, &context),
            ValidationResult::invalid("Please select a state")
        );
        assert!(validate("CA", FieldType::Select, &context).is_valid);
    }

    #[test]
    fn whitespace_only_required_value_is_empty() {
        let result = validate("   ", FieldType::Required, &ValidationContext::named("Zip"));
        assert!(!result.is_valid);
        assert_eq!(result.message, "Zip is required");
    }

    #[test]
    fn text_is_always_valid() {
        assert!(check("", FieldType::Text).is_valid);
        assert!(check("anything at all", FieldType::Text).is_valid);
    }

    #[test]
    fn email_boundaries() {
        assert!(check("a@b.c", FieldType::Email).is_valid);
        assert!(!check("a@bc", FieldType::Email).is_valid);
        assert_eq!(check("", FieldType::Email).message, "Email is required");
        assert!(!check("user@@example.com", FieldType::Email).is_valid);
        assert!(check(" owner@clinic.io ", FieldType::Email).is_valid);
    }

    #[test]
    fn phone_uses_country_rules() {
        let us = ValidationContext::for_country("US");
        assert!(validate("5551234567", FieldType::Phone, &us).is_valid);
        assert!(validate("(555) 123-4567", FieldType::Phone, &us).is_valid);

        let short = validate("555123", FieldType::Phone, &us);
        assert!(!short.is_valid);
        assert!(short.message.contains("too short"));
        assert!(short.message.contains("10"));

        let long = validate("555123456789", FieldType::Phone, &us);
        assert!(long.message.contains("too long"));
    }

    #[test]
    fn phone_falls_back_to_generic_range() {
        assert!(check("1234567", FieldType::Phone).is_valid);
        assert!(!check("123456", FieldType::Phone).is_valid);
        assert!(!check("1234567890123456", FieldType::Phone).is_valid);
        let unknown = ValidationContext::for_country("ZZ");
        assert!(validate("12345678", FieldType::Phone, &unknown).is_valid);
    }

    #[test]
    fn phone_rejects_non_digits() {
        let result = check("555-CALL-NOW", FieldType::Phone);
        assert_eq!(result.message, "Phone number can only contain digits");
        assert!(!check("+15551234567", FieldType::Phone).is_valid);
    }

    #[test]
    fn name_character_set_and_length() {
        assert!(check("José Ñúñez-O'Neil", FieldType::Name).is_valid);
        assert!(!check("A", FieldType::Name).is_valid);
        assert!(!check(&"a".repeat(51), FieldType::Name).is_valid);
        assert!(!check("R2-D2", FieldType::Name).is_valid);
        assert!(!check("Dana × Reyes", FieldType::Name).is_valid);
        assert!(!check("Dana÷Reyes", FieldType::Name).is_valid);
        assert!(check("Zoë Ødegård", FieldType::Name).is_valid);
        let named = validate("", FieldType::Name, &ValidationContext::named("First name"));
        assert_eq!(named.message, "First name is required");
    }

    #[test]
    fn company_and_address_lengths() {
        assert!(!check("X", FieldType::Company).is_valid);
        assert!(check("XY", FieldType::Company).is_valid);
        assert!(!check(&"c".repeat(101), FieldType::Company).is_valid);
        assert!(!check("1 A", FieldType::Address).is_valid);
        assert!(check("1 Main St", FieldType::Address).is_valid);
        assert!(!check(&"a".repeat(201), FieldType::Address).is_valid);
    }

    #[test]
    fn zip_uses_country_patterns() {
        let us = ValidationContext::for_country("US");
        assert!(validate("94107", FieldType::ZipCode, &us).is_valid);
        assert!(validate("94107-1234", FieldType::ZipCode, &us).is_valid);
        assert!(!validate("9410", FieldType::ZipCode, &us).is_valid);

        let ca = ValidationContext::for_country("CA");
        assert!(validate("K1A 0B1", FieldType::ZipCode, &ca).is_valid);

        // No pattern for this country: generic length rule.
        let nz = ValidationContext::for_country("NZ");
        assert!(validate("6011", FieldType::ZipCode, &nz).is_valid);
        assert!(!validate("60", FieldType::ZipCode, &nz).is_valid);
    }

    #[test]
    fn validation_is_deterministic_for_every_type() {
        let samples = ["", " ", "a", "a@b.c", "5551234567", "K1A 0B1", "1 Main Street", "ü"];
        let contexts = [
            ValidationContext::default(),
            ValidationContext::named("Field").with_country(Some("US")),
        ];
        for field_type in FieldType::ALL {
            for sample in samples {
                for context in &contexts {
                    let first = validate(sample, field_type, context);
                    let second = validate(sample, field_type, context);
                    assert_eq!(first, second);
                    assert_eq!(first.is_valid, first.message.is_empty());
                }
            }
        }
    }

    #[test]
    fn field_type_parses_from_cli_names() {
        assert_eq!("zipCode".parse::<FieldType>(), Ok(FieldType::ZipCode));
        assert_eq!("EMAIL".parse::<FieldType>(), Ok(FieldType::Email));
        assert!("color".parse::<FieldType>().is_err());
    }
}
