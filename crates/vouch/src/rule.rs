//! Finalized rules.
//!
//! A [`RuleSpec`] is produced by [`RuleBuilder::build`](crate::RuleBuilder::build)
//! and never changes afterwards. Evaluating it keeps no state, so one rule can
//! be shared and applied to any number of values.

use crate::coerce;
use crate::constraints;
use crate::errors::{ValidationError, ValidationErrors};
use crate::value::{Input, Value};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Predicate run against a coerced value; `false` fails the field.
pub type CustomCallback = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Transform applied to a value, see `prepare` and `alter` on the builder.
pub type TransformCallback = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// The type a rule coerces its field to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Unspecified,
    Number,
    String,
    #[serde(alias = "bool")]
    Boolean,
    Time,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Unspecified => "unspecified",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Time => "time",
        };
        f.write_str(name)
    }
}

/// A range bound passed to `min`, `max` or `between`.
///
/// The kind of the bound decides the type of the rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Number(f64),
    Time(DateTime<Utc>),
}

impl Bound {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Bound::Number(_) => "number",
            Bound::Time(_) => "time",
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Bound::Number(_) => FieldType::Number,
            Bound::Time(_) => FieldType::Time,
        }
    }
}

macro_rules! impl_numeric_bound {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Bound {
                fn from(v: $t) -> Self {
                    Bound::Number(f64::from(v))
                }
            }
        )*
    };
}

impl_numeric_bound!(i8, i16, i32, u8, u16, u32, f32, f64);

// i64 and u64 have no lossless f64 conversion; bounds that large are
// rounded to the nearest representable value.
impl From<i64> for Bound {
    fn from(v: i64) -> Self {
        Bound::Number(v as f64)
    }
}

impl From<u64> for Bound {
    fn from(v: u64) -> Self {
        Bound::Number(v as f64)
    }
}

impl From<usize> for Bound {
    fn from(v: usize) -> Self {
        Bound::Number(v as f64)
    }
}

impl From<DateTime<Utc>> for Bound {
    fn from(v: DateTime<Utc>) -> Self {
        Bound::Time(v)
    }
}

impl From<DateTime<FixedOffset>> for Bound {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Bound::Time(v.with_timezone(&Utc))
    }
}

/// Constraints of a number rule. `Some(0.0)` is a real bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Constraints of a string rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRule {
    pub pattern: Option<String>,
    /// Allowed values, compared exactly. Empty means any value.
    pub allowed: Vec<String>,
}

/// Constraints of a time rule, both inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeRule {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

/// The declared type of a rule together with the constraints for that type.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RuleKind {
    #[default]
    Unspecified,
    Number(NumberRule),
    String(StringRule),
    Boolean,
    Time(TimeRule),
}

impl RuleKind {
    /// An unconstrained rule of the given type.
    pub fn of(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Unspecified => RuleKind::Unspecified,
            FieldType::Number => RuleKind::Number(NumberRule::default()),
            FieldType::String => RuleKind::String(StringRule::default()),
            FieldType::Boolean => RuleKind::Boolean,
            FieldType::Time => RuleKind::Time(TimeRule::default()),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            RuleKind::Unspecified => FieldType::Unspecified,
            RuleKind::Number(_) => FieldType::Number,
            RuleKind::String(_) => FieldType::String,
            RuleKind::Boolean => FieldType::Boolean,
            RuleKind::Time(_) => FieldType::Time,
        }
    }

    /// Whether any type-specific constraint is set.
    pub fn has_constraints(&self) -> bool {
        match self {
            RuleKind::Unspecified | RuleKind::Boolean => false,
            RuleKind::Number(r) => r.min.is_some() || r.max.is_some(),
            RuleKind::String(r) => r.pattern.is_some() || !r.allowed.is_empty(),
            RuleKind::Time(r) => r.after.is_some() || r.before.is_some(),
        }
    }

    pub(crate) fn min_bound(&self) -> Option<Bound> {
        match self {
            RuleKind::Number(r) => r.min.map(Bound::Number),
            RuleKind::Time(r) => r.after.map(Bound::Time),
            _ => None,
        }
    }

    pub(crate) fn max_bound(&self) -> Option<Bound> {
        match self {
            RuleKind::Number(r) => r.max.map(Bound::Number),
            RuleKind::Time(r) => r.before.map(Bound::Time),
            _ => None,
        }
    }
}

/// The finalized validation requirements of one field.
#[derive(Clone, Default)]
pub struct RuleSpec {
    pub(crate) key: String,
    pub(crate) required: bool,
    pub(crate) message: Option<String>,
    pub(crate) kind: RuleKind,
    pub(crate) customs: Vec<CustomCallback>,
    pub(crate) prepares: Vec<TransformCallback>,
    pub(crate) alters: Vec<TransformCallback>,
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSpec")
            .field("key", &self.key)
            .field("required", &self.required)
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("customs", &self.customs.len())
            .field("prepares", &self.prepares.len())
            .field("alters", &self.alters.len())
            .finish()
    }
}

impl RuleSpec {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Lower bound: a number minimum or a time `after`.
    pub fn min(&self) -> Option<Bound> {
        self.kind.min_bound()
    }

    /// Upper bound: a number maximum or a time `before`.
    pub fn max(&self) -> Option<Bound> {
        self.kind.max_bound()
    }

    pub fn pattern(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::String(r) => r.pattern.as_deref(),
            _ => None,
        }
    }

    pub fn allowed(&self) -> &[String] {
        match &self.kind {
            RuleKind::String(r) => &r.allowed,
            _ => &[],
        }
    }

    /// Validate a single raw value.
    ///
    /// Runs prepare callbacks, coerces to the rule's type, checks every
    /// constraint and custom predicate, then applies alter callbacks to the
    /// passing value. A coercion failure is reported alone; otherwise all
    /// failures are returned together.
    pub fn process(&self, raw: &Value) -> Result<Value, ValidationErrors> {
        let prepared = self
            .prepares
            .iter()
            .fold(raw.clone(), |value, prepare| prepare(value));

        let value = match coerce::coerce(self.field_type(), prepared, &self.key) {
            Ok(value) => value,
            Err(error) => {
                trace!("{}: coercion failed: {}", self.key, error);
                return Err(self.finish(ValidationErrors::from_error(error)));
            }
        };

        let mut errors = constraints::evaluate(&self.kind, &value, &self.key);
        for (index, custom) in self.customs.iter().enumerate() {
            if !custom(&value) {
                errors.push(ValidationError::custom(&self.key, index));
            }
        }

        if errors.is_empty() {
            Ok(self.alters.iter().fold(value, |value, alter| alter(value)))
        } else {
            Err(self.finish(errors))
        }
    }

    /// Validate this rule's field within a whole input map.
    ///
    /// Returns `Ok(None)` when the field is absent and not required.
    pub fn process_with(&self, input: &Input) -> Result<Option<Value>, ValidationErrors> {
        match input.get(&self.key) {
            Some(raw) => self.process(raw).map(Some),
            None if self.required => {
                debug!("{}: required field missing", self.key);
                Err(self.finish(ValidationError::required(&self.key).into()))
            }
            None => {
                trace!("{}: absent, skipping", self.key);
                Ok(None)
            }
        }
    }

    fn finish(&self, errors: ValidationErrors) -> ValidationErrors {
        match &self.message {
            Some(message) => errors.with_message(message),
            None => errors,
        }
    }
}
