//! Fluent construction of [`RuleSpec`]s.
//!
//! Every setter consumes the builder and returns it with one change applied.
//! Builders are cheap to clone (callbacks are reference counted), so a
//! partially configured builder can seed any number of fields:
//!
//! ```rust
//! use vouch::RuleBuilder;
//!
//! let positive = RuleBuilder::new().required().min(0);
//! let age = positive.clone().max(150).build()?;
//! let count = positive.build()?;
//!
//! assert_eq!(age.field_type(), count.field_type());
//! # Ok::<(), vouch::RuleError>(())
//! ```
//!
//! Range and pattern setters infer the rule's type from their argument. A
//! setter that would contradict constraints already on the rule records a
//! [`RuleError`], which [`RuleBuilder::build`] returns.

use crate::errors::RuleError;
use crate::rule::{Bound, FieldType, RuleKind, RuleSpec};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Permissive email pattern used by [`RuleBuilder::email`].
pub const EMAIL_PATTERN: &str = r"(?i)[A-Z0-9._%+-]+@(?:[A-Z0-9-]+\.)+[A-Z]{2,6}";

/// Builder for a single field's rule.
#[derive(Clone, Default)]
pub struct RuleBuilder {
    spec: RuleSpec,
    error: Option<RuleError>,
}

impl fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("spec", &self.spec)
            .field("error", &self.error)
            .finish()
    }
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalize the rule.
    ///
    /// Fails with the first construction error recorded by any setter.
    pub fn build(self) -> Result<RuleSpec, RuleError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.spec),
        }
    }

    /// The first construction error recorded so far, if any.
    pub fn error(&self) -> Option<&RuleError> {
        self.error.as_ref()
    }

    pub fn required(mut self) -> Self {
        self.spec.required = true;
        self
    }

    /// Set the field name. Usually bound by the rule book instead.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.spec.key = key.into();
        self
    }

    /// Replace the message of every error this rule reports.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.spec.message = Some(message.into());
        self
    }

    // --- Type selectors ---

    pub fn number(self) -> Self {
        self.of_type(FieldType::Number)
    }

    pub fn string(self) -> Self {
        self.of_type(FieldType::String)
    }

    pub fn bool(self) -> Self {
        self.of_type(FieldType::Boolean)
    }

    pub fn time(self) -> Self {
        self.of_type(FieldType::Time)
    }

    /// Select the rule's type.
    ///
    /// Keeps existing constraints when the type is unchanged. Switching away
    /// from a type that already carries constraints is an error.
    pub fn of_type(mut self, field_type: FieldType) -> Self {
        let current = self.spec.kind.field_type();
        if current == field_type {
            return self;
        }
        if self.spec.kind.has_constraints() {
            return self.fail(RuleError::ConflictingType {
                current,
                requested: field_type,
            });
        }
        self.spec.kind = RuleKind::of(field_type);
        self
    }

    // --- Constraints ---

    /// Lower bound: a number minimum, or for a time the same as `after`.
    pub fn min(self, min: impl Into<Bound>) -> Self {
        let min = min.into();
        if let Some(max) = self.spec.kind.max_bound() {
            if max.field_type() != min.field_type() {
                return self.fail(RuleError::MismatchedBounds {
                    min: min.kind_name(),
                    max: max.kind_name(),
                });
            }
        }
        self.constrain(min.field_type(), |kind| match (kind, min) {
            (RuleKind::Number(rule), Bound::Number(n)) => rule.min = Some(n),
            (RuleKind::Time(rule), Bound::Time(t)) => rule.after = Some(t),
            _ => {}
        })
    }

    /// Upper bound: a number maximum, or for a time the same as `before`.
    pub fn max(self, max: impl Into<Bound>) -> Self {
        let max = max.into();
        if let Some(min) = self.spec.kind.min_bound() {
            if min.field_type() != max.field_type() {
                return self.fail(RuleError::MismatchedBounds {
                    min: min.kind_name(),
                    max: max.kind_name(),
                });
            }
        }
        self.constrain(max.field_type(), |kind| match (kind, max) {
            (RuleKind::Number(rule), Bound::Number(n)) => rule.max = Some(n),
            (RuleKind::Time(rule), Bound::Time(t)) => rule.before = Some(t),
            _ => {}
        })
    }

    /// Set both bounds. The operands must be of the same kind.
    pub fn between(self, min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        let (min, max) = (min.into(), max.into());
        if min.field_type() != max.field_type() {
            return self.fail(RuleError::MismatchedBetween {
                min: min.kind_name(),
                max: max.kind_name(),
            });
        }
        self.min(min).max(max)
    }

    /// The value must not be later than `time`.
    pub fn before(self, time: impl Into<DateTime<Utc>>) -> Self {
        self.max(Bound::Time(time.into()))
    }

    /// The value must not be earlier than `time`.
    pub fn after(self, time: impl Into<DateTime<Utc>>) -> Self {
        self.min(Bound::Time(time.into()))
    }

    pub fn regex(self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.constrain(FieldType::String, |kind| {
            if let RuleKind::String(rule) = kind {
                rule.pattern = Some(pattern);
            }
        })
    }

    pub fn email(self) -> Self {
        self.regex(EMAIL_PATTERN)
    }

    /// Restrict the value to an exact, case-sensitive allow-list.
    pub fn one_of<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: Vec<String> = values.into_iter().map(Into::into).collect();
        self.constrain(FieldType::String, |kind| {
            if let RuleKind::String(rule) = kind {
                rule.allowed = allowed;
            }
        })
    }

    // --- Callbacks ---

    /// Add a predicate checked against the coerced value.
    pub fn custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.spec.customs.push(Arc::new(predicate));
        self
    }

    /// Add a transform applied to a passing value before it is returned.
    pub fn alter<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.spec.alters.push(Arc::new(transform));
        self
    }

    /// Add a transform applied to the raw value before coercion.
    pub fn prepare<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.spec.prepares.push(Arc::new(transform));
        self
    }

    fn constrain(mut self, field_type: FieldType, apply: impl FnOnce(&mut RuleKind)) -> Self {
        self = self.of_type(field_type);
        if self.spec.kind.field_type() == field_type {
            apply(&mut self.spec.kind);
        }
        self
    }

    fn fail(mut self, error: RuleError) -> Self {
        self.error.get_or_insert(error);
        self
    }
}
