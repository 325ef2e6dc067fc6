//! Per-type constraint checks on coerced values.
//!
//! Each check returns `Ok(())` or the error describing the failure.
//! [`evaluate`] runs every check that applies to a rule and keeps all
//! failures.

use crate::errors::{ValidationError, ValidationErrors};
use crate::rule::{NumberRule, RuleKind, StringRule, TimeRule};
use crate::value::Value;
use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;
use tracing::warn;

/// Run all constraints of `kind` against an already coerced value.
pub fn evaluate(kind: &RuleKind, value: &Value, path: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    match kind {
        RuleKind::Number(rule) => match value {
            Value::Int(i) => check_integer(rule, *i, path, &mut errors),
            _ => {
                if let Some(n) = value.as_f64() {
                    check_number(rule, n, path, &mut errors);
                }
            }
        },
        RuleKind::String(rule) => {
            if let Some(s) = value.as_str() {
                check_string(rule, s, path, &mut errors);
            }
        }
        RuleKind::Time(rule) => {
            if let Some(t) = value.as_time() {
                check_time(rule, t, path, &mut errors);
            }
        }
        RuleKind::Boolean | RuleKind::Unspecified => {}
    }
    errors
}

fn check_number(rule: &NumberRule, value: f64, path: &str, errors: &mut ValidationErrors) {
    if let Some(min) = rule.min {
        errors.check(validate_minimum(value, min, path));
    }
    if let Some(max) = rule.max {
        errors.check(validate_maximum(value, max, path));
    }
}

/// Integers are compared against the bounds exactly, without going
/// through `f64`.
fn check_integer(rule: &NumberRule, value: i64, path: &str, errors: &mut ValidationErrors) {
    if let Some(min) = rule.min {
        if compare_integer(value, min) == Some(Ordering::Less) {
            errors.push(ValidationError::minimum(path, min, value));
        }
    }
    if let Some(max) = rule.max {
        if compare_integer(value, max) == Some(Ordering::Greater) {
            errors.push(ValidationError::maximum(path, max, value));
        }
    }
}

/// Order an integer against a float bound. `None` for a NaN bound.
fn compare_integer(value: i64, bound: f64) -> Option<Ordering> {
    // 2^63, the first float above i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if bound.is_nan() {
        None
    } else if bound >= LIMIT {
        Some(Ordering::Less)
    } else if bound < -LIMIT {
        Some(Ordering::Greater)
    } else {
        let whole = bound.trunc();
        match value.cmp(&(whole as i64)) {
            Ordering::Equal => 0.0_f64.partial_cmp(&(bound - whole)),
            other => Some(other),
        }
    }
}

fn check_string(rule: &StringRule, value: &str, path: &str, errors: &mut ValidationErrors) {
    if let Some(pattern) = &rule.pattern {
        errors.check(validate_pattern(value, pattern, path));
    }
    if !rule.allowed.is_empty() {
        errors.check(validate_enum(value, &rule.allowed, path));
    }
}

fn check_time(rule: &TimeRule, value: DateTime<Utc>, path: &str, errors: &mut ValidationErrors) {
    if let Some(after) = rule.after {
        errors.check(validate_after(value, after, path));
    }
    if let Some(before) = rule.before {
        errors.check(validate_before(value, before, path));
    }
}

// --- Validation helper functions ---

/// Validate that a string matches a pattern.
///
/// The pattern is compiled for this call only. A pattern that does not
/// compile fails the value.
pub fn validate_pattern(value: &str, pattern: &str, path: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new(pattern).map_err(|err| {
        warn!("{}: invalid regex {:?}: {}", path, pattern, err);
        ValidationError::invalid_pattern(path, pattern)
    })?;

    if re.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::pattern(path, pattern, value))
    }
}

/// Validate that a number meets minimum value.
pub fn validate_minimum(value: f64, min: f64, path: &str) -> Result<(), ValidationError> {
    if value < min {
        Err(ValidationError::minimum(path, min, value))
    } else {
        Ok(())
    }
}

/// Validate that a number meets maximum value.
pub fn validate_maximum(value: f64, max: f64, path: &str) -> Result<(), ValidationError> {
    if value > max {
        Err(ValidationError::maximum(path, max, value))
    } else {
        Ok(())
    }
}

/// Validate that a value is in an allowed set.
pub fn validate_enum(value: &str, allowed: &[String], path: &str) -> Result<(), ValidationError> {
    if allowed.iter().any(|a| a == value) {
        Ok(())
    } else {
        Err(ValidationError::invalid_enum(path, allowed, value))
    }
}

/// Validate that a time is not earlier than `after`.
pub fn validate_after(
    value: DateTime<Utc>,
    after: DateTime<Utc>,
    path: &str,
) -> Result<(), ValidationError> {
    if value < after {
        Err(ValidationError::too_early(path, &rfc3339(after), &rfc3339(value)))
    } else {
        Ok(())
    }
}

/// Validate that a time is not later than `before`.
pub fn validate_before(
    value: DateTime<Utc>,
    before: DateTime<Utc>,
    path: &str,
) -> Result<(), ValidationError> {
    if value > before {
        Err(ValidationError::too_late(path, &rfc3339(before), &rfc3339(value)))
    } else {
        Ok(())
    }
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_helpers() {
        assert!(validate_maximum(5.0, 10.0, "field").is_ok());
        assert!(validate_maximum(15.0, 10.0, "field").is_err());
        assert!(validate_minimum(10.0, 10.0, "field").is_ok());
        assert!(validate_minimum(9.5, 10.0, "field").is_err());

        let allowed = vec!["Pending".to_string(), "Running".to_string()];
        assert!(validate_enum("Running", &allowed, "status").is_ok());
        assert!(validate_enum("running", &allowed, "status").is_err());
    }

    #[test]
    fn test_pattern() {
        assert!(validate_pattern("hi", "hi", "f").is_ok());
        let err = validate_pattern("hi", "r.*", "f").unwrap_err();
        assert_eq!(err.rule.as_deref(), Some("pattern"));
        assert_eq!(err.actual.as_deref(), Some("hi"));
    }

    #[test]
    fn test_invalid_pattern_is_a_field_error() {
        let err = validate_pattern("hi", "(unclosed", "f").unwrap_err();
        assert_eq!(err.message, "invalid regex pattern: (unclosed");
        assert_eq!(err.actual, None);
    }

    #[test]
    fn test_string_checks_are_collected() {
        let kind = RuleKind::String(StringRule {
            pattern: Some("^x".to_string()),
            allowed: vec!["ho".to_string(), "he".to_string()],
        });
        let errors = evaluate(&kind, &Value::from("hi"), "f");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors[0].rule.as_deref(), Some("pattern"));
        assert_eq!(errors.errors[1].rule.as_deref(), Some("enum"));
    }

    #[test]
    fn test_empty_allow_list_allows_anything() {
        let kind = RuleKind::String(StringRule::default());
        assert!(evaluate(&kind, &Value::from("anything"), "f").is_empty());
    }

    #[test]
    fn test_time_error_values() {
        let bound = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2019, 12, 31, 23, 59, 59).unwrap();
        let err = validate_after(early, bound, "at").unwrap_err();
        assert_eq!(err.expected.as_deref(), Some(">= 2020-01-01T00:00:00Z"));
        assert_eq!(err.actual.as_deref(), Some("2019-12-31T23:59:59Z"));
        assert!(validate_before(early, bound, "at").is_ok());
    }

    #[test]
    fn test_integers_compare_exactly() {
        let kind = RuleKind::Number(NumberRule {
            min: Some(1.5),
            max: Some(9_007_199_254_740_992.0),
        });
        assert!(evaluate(&kind, &Value::Int(2), "n").is_empty());
        assert!(evaluate(&kind, &Value::Int(1), "n").has_rule("minimum"));
        assert!(evaluate(&kind, &Value::Int(9_007_199_254_740_992), "n").is_empty());

        let errors = evaluate(&kind, &Value::Int(9_007_199_254_740_993), "n");
        assert!(errors.has_rule("maximum"));
        assert_eq!(errors.errors[0].actual.as_deref(), Some("9007199254740993"));

        assert_eq!(compare_integer(-1, -1.5), Some(Ordering::Greater));
        assert_eq!(compare_integer(i64::MAX, 1e19), Some(Ordering::Less));
        assert_eq!(compare_integer(i64::MIN, -1e19), Some(Ordering::Greater));
        assert_eq!(compare_integer(0, f64::NAN), None);
    }

    #[test]
    fn test_boolean_has_no_constraints() {
        assert!(evaluate(&RuleKind::Boolean, &Value::Bool(false), "b").is_empty());
    }
}
