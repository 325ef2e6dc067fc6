//! Conversion of raw values into a rule's canonical representation.
//!
//! Values already in canonical form pass through untouched. Strings are
//! parsed according to the target type:
//!
//! - number: floating point first, then base-10 integer
//! - boolean: `1`, `0`, `true`, `false` in any case
//! - time: RFC 3339 only
//!
//! Anything else is a conversion error naming the value's kind and the
//! expected type.

use crate::errors::ValidationError;
use crate::rule::FieldType;
use crate::value::Value;
use chrono::{DateTime, Utc};
use tracing::trace;

/// Coerce `raw` to the canonical representation of `field_type`.
pub fn coerce(field_type: FieldType, raw: Value, path: &str) -> Result<Value, ValidationError> {
    match (field_type, raw) {
        (FieldType::Unspecified, value) => Ok(value),

        (FieldType::Number, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (FieldType::Number, Value::String(s)) => parse_number(&s)
            .ok_or_else(|| ValidationError::conversion(path, field_type, "string").with_actual(s)),

        (FieldType::String, value @ Value::String(_)) => Ok(value),

        (FieldType::Boolean, value @ Value::Bool(_)) => Ok(value),
        (FieldType::Boolean, Value::String(s)) => parse_bool(&s)
            .map(Value::Bool)
            .ok_or_else(|| ValidationError::conversion(path, field_type, "string").with_actual(s)),

        (FieldType::Time, value @ Value::Time(_)) => Ok(value),
        (FieldType::Time, Value::String(s)) => parse_time(&s)
            .map(Value::Time)
            .ok_or_else(|| ValidationError::conversion(path, field_type, "string").with_actual(s)),

        (field_type, value) => Err(ValidationError::conversion(
            path,
            field_type,
            value.kind_name(),
        )),
    }
}

/// Parse a numeric string, trying every strategy before giving up.
///
/// Float parsing runs first so that `"4.7"` is never truncated. Non-finite
/// results such as `"NaN"` or `"inf"` are not accepted as numbers. An
/// integer that a float cannot hold exactly, such as `"9007199254740993"`,
/// is kept as an integer.
pub fn parse_number(s: &str) -> Option<Value> {
    let float = s.parse::<f64>().ok().filter(|f| f.is_finite());
    let int = s.parse::<i64>().ok();
    match (float, int) {
        (Some(f), Some(i)) if f as i128 != i128::from(i) => {
            trace!("parsed {:?} as integer, float would round it", s);
            Some(Value::Int(i))
        }
        (Some(f), _) => {
            trace!("parsed {:?} as float", s);
            Some(Value::Float(f))
        }
        (None, int) => int.map(Value::Int),
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp, e.g. `2006-01-02T15:04:05Z`.
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(coerce(FieldType::Number, Value::Int(5), "n"), Ok(Value::Int(5)));
        assert_eq!(coerce(FieldType::Number, Value::Float(0.5), "n"), Ok(Value::Float(0.5)));
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(coerce(FieldType::Number, Value::from("4"), "n"), Ok(Value::Float(4.0)));
        assert_eq!(coerce(FieldType::Number, Value::from("4.7"), "n"), Ok(Value::Float(4.7)));
        assert_eq!(coerce(FieldType::Number, Value::from("-1e3"), "n"), Ok(Value::Float(-1000.0)));
    }

    #[test]
    fn test_large_integers_keep_precision() {
        assert_eq!(
            parse_number("9007199254740993"),
            Some(Value::Int(9_007_199_254_740_993))
        );
        assert_eq!(parse_number("9223372036854775807"), Some(Value::Int(i64::MAX)));
        assert_eq!(
            parse_number("9007199254740992"),
            Some(Value::Float(9_007_199_254_740_992.0))
        );
        assert_eq!(parse_number("-12"), Some(Value::Float(-12.0)));
    }

    #[test]
    fn test_bad_numeric_strings() {
        for raw in ["", "four", "4,5", "NaN", "inf", " 4"] {
            let err = coerce(FieldType::Number, Value::from(raw), "n").unwrap_err();
            assert_eq!(err.rule.as_deref(), Some("type"), "input {:?}", raw);
            assert_eq!(err.expected.as_deref(), Some("number"));
            assert_eq!(err.actual.as_deref(), Some(raw));
        }
    }

    #[test]
    fn test_wrong_kind_reports_observed_kind() {
        let err = coerce(FieldType::Number, Value::Bool(true), "n").unwrap_err();
        assert_eq!(err.message, "cannot convert bool to number");

        let err = coerce(FieldType::String, Value::Int(3), "s").unwrap_err();
        assert_eq!(err.message, "cannot convert int to string");

        let err = coerce(FieldType::Time, Value::Null, "t").unwrap_err();
        assert_eq!(err.actual.as_deref(), Some("null"));
    }

    #[test]
    fn test_booleans() {
        for (raw, expected) in [("1", true), ("TRUE", true), ("True", true), ("0", false), ("fAlSe", false)] {
            assert_eq!(
                coerce(FieldType::Boolean, Value::from(raw), "b"),
                Ok(Value::Bool(expected))
            );
        }
        assert!(coerce(FieldType::Boolean, Value::from("yes"), "b").is_err());
        assert!(coerce(FieldType::Boolean, Value::Int(1), "b").is_err());
    }

    #[test]
    fn test_time_single_layout() {
        let expected = Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap();
        assert_eq!(
            coerce(FieldType::Time, Value::from("2006-01-02T15:04:05-07:00"), "t"),
            Ok(Value::Time(expected))
        );
        assert!(coerce(FieldType::Time, Value::from("2006-01-02"), "t").is_err());
        assert!(coerce(FieldType::Time, Value::from("Jan 2, 2006"), "t").is_err());
    }

    #[test]
    fn test_unspecified_accepts_anything() {
        let raw = Value::List(vec![Value::Null]);
        assert_eq!(coerce(FieldType::Unspecified, raw.clone(), "x"), Ok(raw));
    }
}
