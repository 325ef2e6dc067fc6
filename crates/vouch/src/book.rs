//! Rule books declared in YAML, TOML or JSON files.
//!
//! ```yaml
//! fields:
//!   age:
//!     required: true
//!     min: 0
//!     max: 150
//!   email:
//!     email: true
//!     message: please enter a valid email address
//!   role:
//!     in: [admin, member]
//!   since:
//!     after: 2000-01-01T00:00:00Z
//! ```
//!
//! Each entry is applied to a [`RuleBuilder`] in a fixed order: type,
//! required, bounds, pattern, allow-list, message. Invalid combinations fail
//! with the same [`RuleError`]s as the builder API.

use crate::builder::RuleBuilder;
use crate::coerce;
use crate::errors::{BookError, RuleError};
use crate::rule::{Bound, FieldType};
use crate::validate::RuleBook;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Serialization formats a rule book can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Yaml,
    Toml,
    Json,
}

impl BookFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, BookError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(BookFormat::Yaml),
            "toml" => Ok(BookFormat::Toml),
            "json" => Ok(BookFormat::Json),
            _ => Err(BookError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A bound as written in a rule book.
///
/// TOML hands over its native datetimes as their own type, while YAML and
/// JSON carry timestamps as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoundDef {
    Number(f64),
    Text(String),
    TomlTime(toml::value::Datetime),
}

impl BoundDef {
    fn to_bound(&self) -> Option<Bound> {
        match self {
            BoundDef::Number(n) => Some(Bound::Number(*n)),
            BoundDef::Text(s) => coerce::parse_time(s).map(Bound::Time),
            BoundDef::TomlTime(t) => coerce::parse_time(&t.to_string()).map(Bound::Time),
        }
    }

    fn to_time(&self) -> Option<DateTime<Utc>> {
        match self.to_bound()? {
            Bound::Time(t) => Some(t),
            Bound::Number(_) => None,
        }
    }
}

impl fmt::Display for BoundDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundDef::Number(n) => write!(f, "{}", n),
            BoundDef::Text(s) => write!(f, "{:?}", s),
            BoundDef::TomlTime(t) => write!(f, "{}", t),
        }
    }
}

/// The declaration of one field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub required: bool,
    /// Number, or RFC 3339 time for a time bound.
    pub min: Option<BoundDef>,
    pub max: Option<BoundDef>,
    pub before: Option<BoundDef>,
    pub after: Option<BoundDef>,
    pub regex: Option<String>,
    #[serde(default)]
    pub email: bool,
    #[serde(rename = "in")]
    pub allowed: Option<Vec<String>>,
    pub message: Option<String>,
}

impl RuleDef {
    /// Turn the declaration into a builder for the field `name`.
    pub fn to_builder(&self, name: &str) -> Result<RuleBuilder, RuleError> {
        let mut builder = RuleBuilder::new();

        if let Some(field_type) = self.field_type {
            builder = builder.of_type(field_type);
        }
        if self.required {
            builder = builder.required();
        }
        if let Some(min) = &self.min {
            builder = builder.min(parse_bound(name, min)?);
        }
        if let Some(max) = &self.max {
            builder = builder.max(parse_bound(name, max)?);
        }
        if let Some(after) = &self.after {
            builder = builder.after(parse_time_bound(name, after)?);
        }
        if let Some(before) = &self.before {
            builder = builder.before(parse_time_bound(name, before)?);
        }
        if let Some(regex) = &self.regex {
            builder = builder.regex(regex.as_str());
        }
        if self.email {
            builder = builder.email();
        }
        if let Some(allowed) = &self.allowed {
            builder = builder.one_of(allowed.iter().cloned());
        }
        if let Some(message) = &self.message {
            builder = builder.message(message.as_str());
        }

        match builder.error() {
            Some(error) => Err(error.clone()),
            None => Ok(builder),
        }
    }
}

/// A rule book as written in a file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleBookFile {
    #[serde(default)]
    pub fields: BTreeMap<String, RuleDef>,
}

impl RuleBookFile {
    pub fn from_yaml_str(source: &str) -> Result<Self, BookError> {
        serde_yaml::from_str(source).map_err(|e| BookError::Parse(e.to_string()))
    }

    pub fn from_toml_str(source: &str) -> Result<Self, BookError> {
        toml::from_str(source).map_err(|e| BookError::Parse(e.to_string()))
    }

    pub fn from_json_str(source: &str) -> Result<Self, BookError> {
        serde_json::from_str(source).map_err(|e| BookError::Parse(e.to_string()))
    }

    pub fn from_str_as(source: &str, format: BookFormat) -> Result<Self, BookError> {
        match format {
            BookFormat::Yaml => Self::from_yaml_str(source),
            BookFormat::Toml => Self::from_toml_str(source),
            BookFormat::Json => Self::from_json_str(source),
        }
    }

    /// Read a rule book file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let path = path.as_ref();
        let format = BookFormat::from_path(path)?;
        debug!("Loading {:?} rule book from {}", format, path.display());

        let source = std::fs::read_to_string(path).map_err(|source| BookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str_as(&source, format)
    }

    pub fn into_rule_book(self) -> Result<RuleBook, RuleError> {
        self.fields
            .iter()
            .map(|(name, def)| Ok::<_, RuleError>((name.as_str(), def.to_builder(name)?)))
            .collect()
    }
}

/// Load a rule book file straight into a [`RuleBook`].
pub fn load_rule_book(path: impl AsRef<Path>) -> Result<RuleBook, BookError> {
    Ok(RuleBookFile::from_path(path)?.into_rule_book()?)
}

fn parse_bound(field: &str, raw: &BoundDef) -> Result<Bound, RuleError> {
    raw.to_bound().ok_or_else(|| unrecognized(field, raw))
}

fn parse_time_bound(field: &str, raw: &BoundDef) -> Result<DateTime<Utc>, RuleError> {
    raw.to_time().ok_or_else(|| unrecognized(field, raw))
}

fn unrecognized(field: &str, raw: &BoundDef) -> RuleError {
    RuleError::UnrecognizedBound {
        field: field.to_string(),
        found: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleKind;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_yaml_rule_book() {
        let file = RuleBookFile::from_yaml_str(
            r#"
fields:
  age:
    required: true
    min: 0
    max: 150
  role:
    in: [admin, member]
"#,
        )
        .unwrap();

        assert_eq!(
            file.fields["age"],
            RuleDef {
                required: true,
                min: Some(BoundDef::Number(0.0)),
                max: Some(BoundDef::Number(150.0)),
                ..Default::default()
            }
        );

        let book = file.into_rule_book().unwrap();
        let rules = book.finalize().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].key(), "age");
        assert_eq!(rules[0].min(), Some(Bound::Number(0.0)));
        assert_eq!(rules[1].allowed(), ["admin".to_string(), "member".to_string()]);
    }

    #[test]
    fn test_time_bounds_from_strings() {
        let file = RuleBookFile::from_json_str(
            r#"{"fields": {"at": {"min": "2020-01-01T00:00:00Z", "before": "2030-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();
        let rule = file.fields["at"].to_builder("at").unwrap().build().unwrap();

        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(rule.min(), Some(Bound::Time(start)));
        assert!(matches!(rule.kind(), RuleKind::Time(_)));
    }

    #[test]
    fn test_native_toml_datetimes() {
        let file = RuleBookFile::from_toml_str(
            r#"
[fields.since]
after = 2000-01-01T00:00:00Z

[fields.until]
min = 2000-01-01T00:00:00+02:00
before = 2030-06-01T12:00:00Z
"#,
        )
        .unwrap();

        let rules = file.into_rule_book().unwrap().finalize().unwrap();
        let since = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(rules[0].key(), "since");
        assert_eq!(rules[0].min(), Some(Bound::Time(since)));

        let shifted = Utc.with_ymd_and_hms(1999, 12, 31, 22, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(rules[1].min(), Some(Bound::Time(shifted)));
        assert_eq!(rules[1].max(), Some(Bound::Time(until)));
    }

    #[test]
    fn test_local_toml_date_is_unrecognized() {
        let file = RuleBookFile::from_toml_str("[fields.day]\nafter = 2000-01-01\n").unwrap();
        assert_eq!(
            file.into_rule_book().unwrap_err(),
            RuleError::UnrecognizedBound {
                field: "day".to_string(),
                found: "2000-01-01".to_string(),
            }
        );
    }

    #[test]
    fn test_unrecognized_bound() {
        let file = RuleBookFile::from_yaml_str("fields:\n  n:\n    min: yesterday\n").unwrap();
        let err = file.into_rule_book().unwrap_err();
        assert_eq!(
            err,
            RuleError::UnrecognizedBound {
                field: "n".to_string(),
                found: "\"yesterday\"".to_string(),
            }
        );

        let file = RuleBookFile::from_yaml_str("fields:\n  n:\n    before: 5\n").unwrap();
        assert!(matches!(
            file.into_rule_book(),
            Err(RuleError::UnrecognizedBound { .. })
        ));

        let err = RuleBookFile::from_yaml_str("fields:\n  n:\n    min: true\n").unwrap_err();
        assert!(matches!(err, BookError::Parse(_)));
    }

    #[test]
    fn test_conflicting_declaration() {
        let file = RuleBookFile::from_toml_str(
            r#"
[fields.x]
min = 1
regex = "^a"
"#,
        )
        .unwrap();
        assert!(matches!(
            file.into_rule_book(),
            Err(RuleError::ConflictingType { .. })
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = RuleBookFile::from_yaml_str("fields:\n  x:\n    minimum: 3\n").unwrap_err();
        assert!(matches!(err, BookError::Parse(_)));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(BookFormat::from_path(Path::new("a.YML")).unwrap(), BookFormat::Yaml);
        assert_eq!(BookFormat::from_path(Path::new("a.toml")).unwrap(), BookFormat::Toml);
        assert!(BookFormat::from_path(Path::new("rules")).is_err());
    }
}
