//! Record validation rules
//!
//! Rules run in a fixed order and stop at the first failure. A failure is a
//! classification, not an error: the driver only counts it.

use crate::extract::{FieldTriple, DOB_PATTERN, SSN_PATTERN};
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Why a line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    MissingName,
    InvalidDateFormat,
    InvalidDate,
    OutOfRange,
    InvalidSsnFormat,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidReason::MissingName => "missing name",
            InvalidReason::InvalidDateFormat => "invalid date format",
            InvalidReason::InvalidDate => "invalid date",
            InvalidReason::OutOfRange => "out of range",
            InvalidReason::InvalidSsnFormat => "invalid SSN format",
        };
        f.write_str(text)
    }
}

/// Field values that passed every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFields {
    pub name: String,
    pub dob: String,
    pub ssn: String,
    pub year: i32,
}

/// Outcome of validating one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid(ValidFields),
    Invalid(Vec<InvalidReason>),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }

    /// Failure reasons in rule order; empty when valid
    pub fn reasons(&self) -> &[InvalidReason] {
        match self {
            Verdict::Valid(_) => &[],
            Verdict::Invalid(reasons) => reasons.as_slice(),
        }
    }
}

/// Checks field triples against format and birth-year range rules
#[derive(Debug, Clone)]
pub struct Validator {
    min_year: i32,
    /// Dec 31 of the max year; `None` when that date is not representable
    latest: Option<NaiveDate>,
}

impl Validator {
    pub fn new(min_year: i32, max_year: i32) -> Self {
        Self {
            min_year,
            latest: NaiveDate::from_ymd_opt(max_year, 12, 31),
        }
    }

    pub fn check(&self, triple: FieldTriple) -> Verdict {
        let FieldTriple { name, dob, ssn } = triple;

        let name = match name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => return Verdict::Invalid(vec![InvalidReason::MissingName]),
        };

        let dob = match dob {
            Some(dob) if DOB_PATTERN.is_match(&dob) => dob,
            _ => return Verdict::Invalid(vec![InvalidReason::InvalidDateFormat]),
        };

        let date = match NaiveDate::parse_from_str(&dob, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => return Verdict::Invalid(vec![InvalidReason::InvalidDate]),
        };

        if !self.in_range(date) {
            return Verdict::Invalid(vec![InvalidReason::OutOfRange]);
        }

        let ssn = match ssn {
            Some(ssn) if SSN_PATTERN.is_match(&ssn) => ssn,
            _ => return Verdict::Invalid(vec![InvalidReason::InvalidSsnFormat]),
        };

        Verdict::Valid(ValidFields {
            name,
            dob,
            ssn,
            year: date.year(),
        })
    }

    fn in_range(&self, date: NaiveDate) -> bool {
        if date.year() < self.min_year {
            return false;
        }
        match self.latest {
            Some(latest) => date <= latest,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(name: &str, dob: &str, ssn: &str) -> FieldTriple {
        FieldTriple {
            name: Some(name.to_string()),
            dob: Some(dob.to_string()),
            ssn: Some(ssn.to_string()),
        }
    }

    fn reason(verdict: Verdict) -> InvalidReason {
        verdict.reasons()[0]
    }

    #[test]
    fn test_valid_record() {
        let validator = Validator::new(1940, 2024);
        match validator.check(triple(" Ann Lee ", "1980-02-29", "123-45-6789")) {
            Verdict::Valid(fields) => {
                assert_eq!(fields.name, "Ann Lee");
                assert_eq!(fields.year, 1980);
            }
            other => panic!("expected valid, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_bound_is_inclusive() {
        let validator = Validator::new(1940, 2024);
        assert!(validator.check(triple("A B", "1940-01-01", "123-45-6789")).is_valid());
        assert_eq!(
            reason(validator.check(triple("A B", "1939-12-31", "123-45-6789"))),
            InvalidReason::OutOfRange
        );
    }

    #[test]
    fn test_upper_bound_is_end_of_max_year() {
        let validator = Validator::new(1940, 2000);
        assert!(validator.check(triple("A B", "2000-12-31", "123-45-6789")).is_valid());
        assert_eq!(
            reason(validator.check(triple("A B", "2001-01-01", "123-45-6789"))),
            InvalidReason::OutOfRange
        );
    }

    #[test]
    fn test_rule_order_short_circuits() {
        let validator = Validator::new(1940, 2024);
        let verdict = validator.check(triple("  ", "garbage", "nope"));
        assert_eq!(verdict.reasons(), &[InvalidReason::MissingName]);

        let verdict = validator.check(triple("A B", "garbage", "nope"));
        assert_eq!(verdict.reasons(), &[InvalidReason::InvalidDateFormat]);
    }

    #[test]
    fn test_calendar_checks() {
        let validator = Validator::new(1940, 2024);
        assert_eq!(
            reason(validator.check(triple("A B", "1975-00-10", "123-45-6789"))),
            InvalidReason::InvalidDate
        );
        assert_eq!(
            reason(validator.check(triple("A B", "1981-02-29", "123-45-6789"))),
            InvalidReason::InvalidDate
        );
    }

    #[test]
    fn test_missing_fields() {
        let validator = Validator::new(1940, 2024);
        assert_eq!(
            reason(validator.check(FieldTriple::default())),
            InvalidReason::MissingName
        );

        let absent_dob = FieldTriple {
            name: Some("A B".to_string()),
            ..Default::default()
        };
        assert_eq!(
            reason(validator.check(absent_dob)),
            InvalidReason::InvalidDateFormat
        );

        let absent_ssn = FieldTriple {
            ssn: None,
            ..triple("A B", "1990-01-01", "")
        };
        assert_eq!(
            reason(validator.check(absent_ssn)),
            InvalidReason::InvalidSsnFormat
        );
    }

    #[test]
    fn test_reason_messages() {
        assert_eq!(InvalidReason::OutOfRange.to_string(), "out of range");
        assert_eq!(InvalidReason::InvalidSsnFormat.to_string(), "invalid SSN format");
    }
}
