//! Error types for vouch.
//!
//! Two classes of error are kept strictly apart:
//!
//! - [`RuleError`] and [`BookError`] describe mistakes in how rules were
//!   written. They abort the whole call and never reach the per-field map.
//! - [`ValidationError`] describes bad input for one field. These are
//!   collected per field into [`ValidationErrors`] and never raised.

use crate::rule::FieldType;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A rule that cannot be built or applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("min and max are of different kinds (min: {min}, max: {max})")]
    MismatchedBounds { min: &'static str, max: &'static str },

    #[error("disparate values passed into between (min: {min}, max: {max})")]
    MismatchedBetween { min: &'static str, max: &'static str },

    #[error("cannot add a {requested} constraint to a {current} rule")]
    ConflictingType {
        current: FieldType,
        requested: FieldType,
    },

    #[error("unrecognized bound for `{field}`: {found}")]
    UnrecognizedBound { field: String, found: String },

    #[error("tried to validate without any input")]
    MissingInput,

    #[error("unrecognized input data: expected a map of fields, got {0}")]
    UnrecognizedInput(&'static str),
}

/// A rule book file that cannot be loaded.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule book: {0}")]
    Parse(String),

    #[error("unsupported rule book format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// The errors collected for a single field.
///
/// Order follows the order in which checks ran; duplicates are kept.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    /// Individual validation errors
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create an empty validation errors collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validation errors collection from a single error.
    pub fn from_error(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add the error of a failed check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.errors.push(error);
        }
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Replace the message of every error, keeping rule and values.
    pub fn with_message(mut self, message: &str) -> Self {
        for error in &mut self.errors {
            error.message = message.to_string();
        }
        self
    }

    /// Whether any error was raised by the given rule tag.
    pub fn has_rule(&self, rule: &str) -> bool {
        self.errors.iter().any(|e| e.rule.as_deref() == Some(rule))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "No validation errors")
        } else if self.errors.len() == 1 {
            write!(f, "Validation error: {}", self.errors[0])
        } else {
            writeln!(f, "{} validation errors:", self.errors.len())?;
            for (i, error) in self.errors.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, error)?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self::from_error(error)
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// A single validation failure for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Key of the field that failed validation.
    pub path: String,

    /// Human-readable error message.
    pub message: String,

    /// The check that failed.
    ///
    /// One of `required`, `type`, `minimum`, `maximum`, `pattern`, `enum`,
    /// `after`, `before` or `custom`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// The expected value or constraint (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// The actual value that failed validation (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            rule: None,
            expected: None,
            actual: None,
        }
    }

    /// Set the rule that was violated.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Set the expected value.
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Set the actual value.
    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    // --- Common error constructors ---

    /// Create an error for a required field that is missing.
    pub fn required(path: impl Into<String>) -> Self {
        Self::new(path, "required field is missing").with_rule("required")
    }

    /// Create an error for a value that cannot be coerced to the rule's type.
    pub fn conversion(path: impl Into<String>, expected: FieldType, actual_kind: &str) -> Self {
        Self::new(
            path,
            format!("cannot convert {} to {}", actual_kind, expected),
        )
        .with_rule("type")
        .with_expected(expected.to_string())
        .with_actual(actual_kind.to_string())
    }

    /// Create an error for a pattern mismatch.
    pub fn pattern(path: impl Into<String>, pattern: &str, value: &str) -> Self {
        Self::new(path, format!("value does not match pattern: {}", pattern))
            .with_rule("pattern")
            .with_expected(pattern.to_string())
            .with_actual(value.to_string())
    }

    /// Create an error for a pattern that does not compile.
    pub fn invalid_pattern(path: impl Into<String>, pattern: &str) -> Self {
        Self::new(path, format!("invalid regex pattern: {}", pattern))
            .with_rule("pattern")
            .with_expected(pattern.to_string())
    }

    /// Create an error for a number below minimum.
    pub fn minimum(path: impl Into<String>, min: f64, actual: impl fmt::Display) -> Self {
        Self::new(path, format!("value {} is less than minimum {}", actual, min))
            .with_rule("minimum")
            .with_expected(format!(">= {}", min))
            .with_actual(actual.to_string())
    }

    /// Create an error for a number above maximum.
    pub fn maximum(path: impl Into<String>, max: f64, actual: impl fmt::Display) -> Self {
        Self::new(path, format!("value {} exceeds maximum {}", actual, max))
            .with_rule("maximum")
            .with_expected(format!("<= {}", max))
            .with_actual(actual.to_string())
    }

    /// Create an error for an invalid enum value.
    pub fn invalid_enum(path: impl Into<String>, allowed: &[String], actual: &str) -> Self {
        Self::new(
            path,
            format!(
                "invalid value '{}', must be one of: {}",
                actual,
                allowed.join(", ")
            ),
        )
        .with_rule("enum")
        .with_expected(allowed.join(" | "))
        .with_actual(actual.to_string())
    }

    /// Create an error for a time earlier than the `after` bound.
    pub fn too_early(path: impl Into<String>, after: &str, actual: &str) -> Self {
        Self::new(path, format!("time {} is before {}", actual, after))
            .with_rule("after")
            .with_expected(format!(">= {}", after))
            .with_actual(actual.to_string())
    }

    /// Create an error for a time later than the `before` bound.
    pub fn too_late(path: impl Into<String>, before: &str, actual: &str) -> Self {
        Self::new(path, format!("time {} is after {}", actual, before))
            .with_rule("before")
            .with_expected(format!("<= {}", before))
            .with_actual(actual.to_string())
    }

    /// Create an error for a failed custom predicate.
    pub fn custom(path: impl Into<String>, index: usize) -> Self {
        Self::new(path, format!("custom check #{} failed", index + 1)).with_rule("custom")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }

        if let Some(rule) = &self.rule {
            write!(f, " [{}]", rule)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}
