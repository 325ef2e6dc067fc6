//! Vouch: declarative field validation
//!
//! This crate validates flat maps of untyped input, such as decoded form or
//! query parameters, against per-field rules:
//!
//! - **Rules**: an immutable fluent [`RuleBuilder`] that infers the field's
//!   type from its constraints
//! - **Coercion**: textual input is parsed into numbers, booleans and times
//! - **Constraints**: numeric ranges, patterns, allow-lists, time ranges and
//!   custom predicates, with every failure of a field reported together
//! - **Rule books**: per-field rules applied in one call, declared in code or
//!   loaded from YAML, TOML or JSON
//!
//! # Example
//!
//! ```rust
//! use vouch::{rule, validate, RuleBook, Value};
//!
//! let book = RuleBook::new()
//!     .field("age", rule().required().between(0, 150))
//!     .field("email", rule().email())
//!     .field("role", rule().one_of(["admin", "member"]));
//!
//! let outcome = validate([
//!     ("age", "42"),
//!     ("email", "not an email"),
//!     ("role", "admin"),
//! ])
//! .with(&book)?;
//!
//! assert_eq!(outcome.params["age"], Value::Float(42.0));
//! assert!(outcome.errors["email"].has_rule("pattern"));
//! # Ok::<(), vouch::RuleError>(())
//! ```
//!
//! Mistakes in the rules themselves, such as `between(5, some_time)`, are
//! returned as [`RuleError`] before any field is checked. Problems with the
//! input are collected per field in [`Outcome::errors`].

mod book;
mod builder;
mod coerce;
mod constraints;
mod errors;
mod rule;
mod validate;
mod value;

// Re-export public types
pub use book::{load_rule_book, BookFormat, BoundDef, RuleBookFile, RuleDef};
pub use builder::{RuleBuilder, EMAIL_PATTERN};
pub use errors::{BookError, RuleError, ValidationError, ValidationErrors};
pub use rule::{
    Bound, CustomCallback, FieldType, NumberRule, RuleKind, RuleSpec, StringRule, TimeRule,
    TransformCallback,
};
pub use validate::{map, validate, FieldErrors, Outcome, Params, RuleBook, Validator};
pub use value::{Input, Value};

// Coercion and constraint helpers
pub use coerce::{coerce, parse_bool, parse_number, parse_time};
pub use constraints::{
    evaluate, validate_after, validate_before, validate_enum, validate_maximum,
    validate_minimum, validate_pattern,
};

/// Start a new rule. Same as [`RuleBuilder::new`].
pub fn rule() -> RuleBuilder {
    RuleBuilder::new()
}
