//! Applying a rule book to an input map.
//!
//! ```rust
//! use vouch::{rule, validate, RuleBook, Value};
//!
//! let book = RuleBook::new()
//!     .field("x", rule().min(1))
//!     .field("y", rule().regex("hi.*"));
//!
//! let outcome = validate([("x", "4"), ("y", "hi!")]).with(&book)?;
//!
//! assert!(outcome.is_valid());
//! assert_eq!(outcome.params["x"], Value::Float(4.0));
//! # Ok::<(), vouch::RuleError>(())
//! ```

use crate::builder::RuleBuilder;
use crate::errors::{RuleError, ValidationErrors};
use crate::rule::RuleSpec;
use crate::value::{Input, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Coerced values of the fields that passed, keyed by field name.
pub type Params = BTreeMap<String, Value>;

/// Errors of the fields that failed, keyed by field name.
pub type FieldErrors = BTreeMap<String, ValidationErrors>;

/// The validation contract of an input: field name to rule builder.
///
/// Builders are finalized, with their key bound to the entry name, only when
/// the book is applied.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: BTreeMap<String, RuleBuilder>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field's rule, replacing any previous rule for that name.
    pub fn field(mut self, name: impl Into<String>, builder: RuleBuilder) -> Self {
        self.rules.insert(name.into(), builder);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, builder: RuleBuilder) -> Option<RuleBuilder> {
        self.rules.insert(name.into(), builder)
    }

    pub fn get(&self, name: &str) -> Option<&RuleBuilder> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleBuilder)> {
        self.rules.iter().map(|(name, builder)| (name.as_str(), builder))
    }

    /// Build every rule with its key bound to its field name.
    ///
    /// Fails on the first rule with a construction error.
    pub fn finalize(&self) -> Result<Vec<RuleSpec>, RuleError> {
        self.rules
            .iter()
            .map(|(name, builder)| builder.clone().key(name.as_str()).build())
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, RuleBuilder)> for RuleBook {
    fn from_iter<T: IntoIterator<Item = (K, RuleBuilder)>>(iter: T) -> Self {
        Self {
            rules: iter
                .into_iter()
                .map(|(name, builder)| (name.into(), builder))
                .collect(),
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, RuleBuilder); N]> for RuleBook {
    fn from(rules: [(K, RuleBuilder); N]) -> Self {
        rules.into_iter().collect()
    }
}

/// Result of applying a rule book.
///
/// A field appears in at most one of the two maps. Absent optional fields
/// appear in neither.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outcome {
    pub params: Params,
    pub errors: FieldErrors,
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Params, FieldErrors) {
        (self.params, self.errors)
    }

    pub fn into_result(self) -> Result<Params, FieldErrors> {
        if self.errors.is_empty() {
            Ok(self.params)
        } else {
            Err(self.errors)
        }
    }
}

/// Input waiting for a rule book, see [`validate`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    input: Input,
}

impl Validator {
    pub fn new<I, K, V>(input: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            input: input
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Accept untyped data, which must be a map of fields.
    pub fn from_value(data: Value) -> Result<Self, RuleError> {
        match data {
            Value::Map(input) => Ok(Self { input }),
            Value::Null => Err(RuleError::MissingInput),
            other => Err(RuleError::UnrecognizedInput(other.kind_name())),
        }
    }

    /// Accept a decoded JSON document, which must be an object.
    pub fn from_json(data: serde_json::Value) -> Result<Self, RuleError> {
        Self::from_value(Value::from(data))
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Apply `book` to the input.
    pub fn with(&self, book: &RuleBook) -> Result<Outcome, RuleError> {
        map(&self.input, book)
    }
}

/// Start validating `input`; finish with [`Validator::with`].
pub fn validate<I, K, V>(input: I) -> Validator
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    Validator::new(input)
}

/// Apply every rule of `book` to `input`.
///
/// All rules are built before any field is looked at, so a construction
/// error aborts the call without partial results.
pub fn map(input: &Input, book: &RuleBook) -> Result<Outcome, RuleError> {
    let rules = book.finalize()?;
    debug!("Validating {} input fields against {} rules", input.len(), rules.len());

    let mut outcome = Outcome::default();
    for rule in &rules {
        trace!("Checking {:?}", rule.key());
        match rule.process_with(input) {
            Ok(Some(value)) => {
                outcome.params.insert(rule.key().to_string(), value);
            }
            Ok(None) => {}
            Err(errors) => {
                debug!("{} failed with {} error(s)", rule.key(), errors.len());
                outcome.errors.insert(rule.key().to_string(), errors);
            }
        }
    }

    Ok(outcome)
}
