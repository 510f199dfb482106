//! SSN rule engine.
//!
//! Structural check first (`AAA-GG-SSSS`), then the SSA anomaly rules.
//! A structural failure is exclusive: no policy rule is evaluated on a string
//! that is not shaped like an SSN.

use regex::Regex;
use serde::{Serialize, Serializer};

/// Anchored `AAA-GG-SSSS` pattern. ASCII digits only; `\d` would admit any Unicode digit.
const SSN_PATTERN: &str = r"^[0-9]{3}-[0-9]{2}-[0-9]{4}$";

/// Publicly circulated numbers the SSA has voided.
const KNOWN_TEST_NUMBERS: [&str; 3] = [
    "078-05-1120", // Woolworth wallet insert
    "219-09-9999", // advertising
    "457-55-5462", // advertising
];

/// A rule an input failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    Required,
    Format,
    AreaZero,
    AreaSixSixSix,
    GroupZero,
    SerialZero,
    KnownTestNumber,
}

impl Violation {
    /// Human-readable message, as rendered to clients.
    pub fn message(self) -> &'static str {
        match self {
            Violation::Required => "SSN is required",
            Violation::Format => "SSN must be in XXX-XX-XXXX format",
            Violation::AreaZero => "Area number (first 3 digits) cannot be 000",
            Violation::AreaSixSixSix => "Area number (first 3 digits) cannot be 666",
            Violation::GroupZero => "Group number (middle 2 digits) cannot be 00",
            Violation::SerialZero => "Serial number (last 4 digits) cannot be 0000",
            Violation::KnownTestNumber => "This SSN is a known invalid test number",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Outcome of validating one input. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    valid: bool,
    #[serde(rename = "ssn")]
    normalized_input: Option<String>,
    errors: Vec<Violation>,
}

impl Verdict {
    fn new(normalized_input: Option<String>, errors: Vec<Violation>) -> Self {
        Self {
            valid: errors.is_empty(),
            normalized_input,
            errors,
        }
    }

    /// Verdict for an absent or blank field.
    pub fn required() -> Self {
        Self::new(None, vec![Violation::Required])
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The trimmed input that was evaluated. `None` only when nothing was supplied.
    pub fn normalized_input(&self) -> Option<&str> {
        self.normalized_input.as_deref()
    }

    /// Violations in rule order.
    pub fn errors(&self) -> &[Violation] {
        &self.errors
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|v| v.message().to_string()).collect()
    }
}

/// Stateless SSN validator. Construct once and share.
#[derive(Debug, Clone)]
pub struct SsnValidator {
    pattern: Regex,
}

impl Default for SsnValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SsnValidator {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(SSN_PATTERN).expect("SSN pattern is a valid regex"),
        }
    }

    /// Validate a raw value.
    pub fn validate(&self, raw: &str) -> Verdict {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Verdict::required();
        }

        if !self.pattern.is_match(normalized) {
            return Verdict::new(Some(normalized.to_string()), vec![Violation::Format]);
        }

        // The pattern guarantees ASCII digits at fixed offsets.
        let area = &normalized[0..3];
        let group = &normalized[4..6];
        let serial = &normalized[7..11];

        let mut errors = Vec::new();
        if area == "000" {
            errors.push(Violation::AreaZero);
        }
        if area == "666" {
            errors.push(Violation::AreaSixSixSix);
        }
        if group == "00" {
            errors.push(Violation::GroupZero);
        }
        if serial == "0000" {
            errors.push(Violation::SerialZero);
        }
        if KNOWN_TEST_NUMBERS.contains(&normalized) {
            errors.push(Violation::KnownTestNumber);
        }

        Verdict::new(Some(normalized.to_string()), errors)
    }

    /// Validate an optional value; `None` is treated like a blank string.
    pub fn validate_opt(&self, raw: Option<&str>) -> Verdict {
        match raw {
            Some(raw) => self.validate(raw),
            None => Verdict::required(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(raw: &str) -> Verdict {
        SsnValidator::new().validate(raw)
    }

    #[test]
    fn test_accepts_ordinary_numbers() {
        for ssn in ["123-45-6789", "001-01-0001", "899-99-9999", "665-12-3456", "667-12-3456"] {
            let verdict = validate(ssn);
            assert!(verdict.is_valid(), "{ssn} should be valid");
            assert!(verdict.errors().is_empty());
            assert_eq!(verdict.normalized_input(), Some(ssn));
        }
    }

    #[test]
    fn test_accepts_itin_range_areas() {
        assert!(validate("900-12-3456").is_valid());
        assert!(validate("999-99-9999").is_valid());
    }

    #[test]
    fn test_trims_whitespace() {
        let verdict = validate(" 123-45-6789 ");
        assert!(verdict.is_valid());
        assert_eq!(verdict.normalized_input(), Some("123-45-6789"));

        let again = validate(verdict.normalized_input().unwrap());
        assert_eq!(again, verdict);
    }

    #[test]
    fn test_required() {
        for raw in ["", "   ", "\t\n"] {
            let verdict = validate(raw);
            assert!(!verdict.is_valid());
            assert_eq!(verdict.messages(), vec!["SSN is required"]);
        }
        assert_eq!(SsnValidator::new().validate_opt(None).errors(), &[Violation::Required]);
    }

    #[test]
    fn test_format_is_exclusive() {
        for raw in ["123456789", "123-456-789", "12-345-6789", "abc-de-fghi", "000-00-0000x", "123-45-678"] {
            let verdict = validate(raw);
            assert!(!verdict.is_valid(), "{raw} should fail");
            assert_eq!(verdict.errors(), &[Violation::Format], "{raw}");
        }
        // Even an all-zero value with the wrong shape only reports format.
        assert_eq!(validate("000000000").errors(), &[Violation::Format]);
    }

    #[test]
    fn test_format_rejects_non_ascii_digits() {
        assert_eq!(validate("١٢٣-٤٥-٦٧٨٩").errors(), &[Violation::Format]);
    }

    #[test]
    fn test_format_failure_keeps_trimmed_input() {
        let verdict = validate("  12345  ");
        assert_eq!(verdict.normalized_input(), Some("12345"));
    }

    #[test]
    fn test_forbidden_areas() {
        let verdict = validate("000-45-6789");
        assert!(!verdict.is_valid());
        assert_eq!(verdict.messages(), vec!["Area number (first 3 digits) cannot be 000"]);

        let verdict = validate("666-45-6789");
        assert!(!verdict.is_valid());
        assert_eq!(verdict.messages(), vec!["Area number (first 3 digits) cannot be 666"]);
    }

    #[test]
    fn test_group_and_serial() {
        assert_eq!(validate("123-00-6789").errors(), &[Violation::GroupZero]);
        assert_eq!(validate("123-45-0000").errors(), &[Violation::SerialZero]);
    }

    #[test]
    fn test_multiple_rules_in_order() {
        let verdict = validate("000-00-0000");
        assert_eq!(
            verdict.errors(),
            &[Violation::AreaZero, Violation::GroupZero, Violation::SerialZero]
        );

        let verdict = validate("666-00-0000");
        assert_eq!(
            verdict.errors(),
            &[Violation::AreaSixSixSix, Violation::GroupZero, Violation::SerialZero]
        );
    }

    #[test]
    fn test_known_test_numbers() {
        for ssn in KNOWN_TEST_NUMBERS {
            let verdict = validate(ssn);
            assert!(!verdict.is_valid(), "{ssn}");
            assert_eq!(verdict.messages(), vec!["This SSN is a known invalid test number"]);
        }
        assert!(validate("078-05-1121").is_valid());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(validate("123-00-6789")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "valid": false,
                "ssn": "123-00-6789",
                "errors": ["Group number (middle 2 digits) cannot be 00"],
            })
        );

        let json = serde_json::to_value(Verdict::required()).unwrap();
        assert_eq!(json["ssn"], serde_json::Value::Null);
    }
}
