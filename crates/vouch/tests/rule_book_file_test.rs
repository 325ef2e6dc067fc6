//! Tests for loading rule books from files
//!
//! The same rules written as YAML, TOML and JSON must validate input the
//! same way.

use std::fs;
use tempfile::TempDir;
use vouch::{load_rule_book, validate, BookError, RuleBook, RuleError, Value};

const YAML: &str = r#"
fields:
  age:
    required: true
    min: 0
    max: 150
  email:
    email: true
    message: please enter a valid email address
  role:
    in: [admin, member]
  since:
    type: time
    after: 2000-01-01T00:00:00Z
"#;

const TOML: &str = r#"
[fields.age]
required = true
min = 0
max = 150

[fields.email]
email = true
message = "please enter a valid email address"

[fields.role]
in = ["admin", "member"]

[fields.since]
type = "time"
after = 2000-01-01T00:00:00Z
"#;

const JSON: &str = r#"{
  "fields": {
    "age": {"required": true, "min": 0, "max": 150},
    "email": {"email": true, "message": "please enter a valid email address"},
    "role": {"in": ["admin", "member"]},
    "since": {"type": "time", "after": "2000-01-01T00:00:00Z"}
  }
}"#;

fn write_book(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write rule book");
    path
}

fn check(book: &RuleBook) -> Result<(), RuleError> {
    let outcome = validate([
        ("age", Value::from("200")),
        ("email", Value::from("someone@example.com")),
        ("role", Value::from("Admin")),
        ("since", Value::from("1999-12-31T00:00:00Z")),
    ])
    .with(book)?;

    assert_eq!(
        outcome.errors.keys().collect::<Vec<_>>(),
        ["age", "role", "since"]
    );
    assert!(outcome.errors["age"].has_rule("maximum"));
    assert!(outcome.errors["role"].has_rule("enum"));
    assert!(outcome.errors["since"].has_rule("after"));
    assert_eq!(outcome.params["email"], Value::from("someone@example.com"));

    let outcome = validate([("email", "nope")]).with(book)?;
    assert_eq!(
        outcome.errors["email"].errors[0].message,
        "please enter a valid email address"
    );
    assert!(outcome.errors["age"].has_rule("required"));
    Ok(())
}

#[test]
fn test_all_formats_agree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;

    for (name, contents) in [("rules.yaml", YAML), ("rules.toml", TOML), ("rules.json", JSON)] {
        let path = write_book(&dir, name, contents);
        let book = load_rule_book(&path)?;
        assert_eq!(book.len(), 4, "{}", name);
        check(&book)?;
    }
    Ok(())
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    let err = load_rule_book(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, BookError::Io { .. }));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_book(&dir, "rules.ini", "[fields]");
    assert!(matches!(
        load_rule_book(&path),
        Err(BookError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_construction_error_surfaces() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_book(
        &dir,
        "rules.yaml",
        "fields:\n  x:\n    min: 1\n    max: \"2020-01-01T00:00:00Z\"\n",
    );
    let err = load_rule_book(&path).unwrap_err();
    assert!(matches!(
        err,
        BookError::Rule(RuleError::MismatchedBounds { .. })
    ));
}
