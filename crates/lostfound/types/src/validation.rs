//! Input validation for registration and item reports
//!
//! Validation happens once, when raw input is turned into a checked type.
//! Every failing field is reported, not just the first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Minimum username length, counted in characters.
pub const MIN_USERNAME_LEN: usize = 3;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
// ASCII digits only; `\d` would also accept other Unicode digits.
const PHONE_PATTERN: &str = r"^[0-9]{10}$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
}

/// A single rejected field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Malformed input. Recoverable: the caller corrects and resubmits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether the given field was rejected.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Combine the violations of two independently validated parts of one form.
    pub fn merge(mut self, other: ValidationError) -> Self {
        self.violations.extend(other.violations);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationError {}

/// Collects field violations across a whole form.
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, field: &str, reason: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    /// Require a non-blank value; returns the trimmed value.
    pub fn required<'a>(&mut self, field: &str, value: &'a str) -> &'a str {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.reject(field, format!("{} is required", field));
        }
        trimmed
    }

    pub fn username<'a>(&mut self, value: &'a str) -> &'a str {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.reject("username", "username is required");
        } else if trimmed.chars().count() < MIN_USERNAME_LEN {
            self.reject(
                "username",
                format!("username must be at least {} characters", MIN_USERNAME_LEN),
            );
        }
        trimmed
    }

    pub fn email<'a>(&mut self, value: &'a str) -> &'a str {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.reject("email", "email is required");
        } else if !email_regex().is_match(trimmed) {
            self.reject("email", "email must be a valid address");
        }
        trimmed
    }

    pub fn phone<'a>(&mut self, value: &'a str) -> &'a str {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.reject("phone", "phone number is required");
        } else if !phone_regex().is_match(trimmed) {
            self.reject("phone", "phone number must be exactly 10 digits");
        }
        trimmed
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}
