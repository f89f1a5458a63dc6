// ABOUTME: Field-level validation of untyped JSON payloads into typed inputs
// ABOUTME: Collects every violation with its path instead of stopping at the first one

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Required,
    InvalidType,
    TooShort,
    TooLong,
    InvalidFormat,
    InvalidEnum,
    Mismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn single(path: &str, kind: ViolationKind, message: &str) -> Self {
        Self(vec![Violation {
            path: path.to_string(),
            kind,
            message: message.to_string(),
        }])
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    /// Kind of the first violation recorded against `path`, if any.
    pub fn kind_of(&self, path: &str) -> Option<ViolationKind> {
        self.0.iter().find(|v| v.path == path).map(|v| v.kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A typed input that can be parsed out of an untyped JSON value.
pub trait Schema: Sized {
    fn parse(input: &Value) -> Result<Self, ValidationErrors>;
}

pub fn validate<S: Schema>(input: &Value) -> Result<S, ValidationErrors> {
    S::parse(input)
}

/// Walks the fields of one JSON object, recording violations as rules are applied.
///
/// `null` is treated the same as an absent field. Keys no rule asks for are ignored,
/// so the typed value built after `finish` never carries them.
pub struct Validator<'a> {
    fields: &'a Map<String, Value>,
    violations: Vec<Violation>,
}

impl<'a> Validator<'a> {
    pub fn new(input: &'a Value) -> Result<Self, ValidationErrors> {
        match input.as_object() {
            Some(fields) => Ok(Self {
                fields,
                violations: Vec::new(),
            }),
            None => Err(ValidationErrors::single(
                "",
                ViolationKind::InvalidType,
                "Expected a JSON object",
            )),
        }
    }

    fn lookup(&self, field: &str) -> Option<&'a Value> {
        let fields: &'a Map<String, Value> = self.fields;
        fields.get(field).filter(|value| !value.is_null())
    }

    pub fn is_present(&self, field: &str) -> bool {
        self.lookup(field).is_some()
    }

    pub fn push(&mut self, field: &str, kind: ViolationKind, message: impl Into<String>) {
        self.violations.push(Violation {
            path: field.to_string(),
            kind,
            message: message.into(),
        });
    }

    pub fn missing(&mut self, field: &str) {
        self.push(field, ViolationKind::Required, "Required");
    }

    pub fn check(&mut self, ok: bool, field: &str, kind: ViolationKind, message: &str) {
        if !ok {
            self.push(field, kind, message);
        }
    }

    pub fn string(&mut self, field: &'static str) -> StringRule<'_, 'a> {
        let (value, failed) = match self.lookup(field) {
            None => (None, false),
            Some(Value::String(s)) => (Some(s.clone()), false),
            Some(_) => {
                self.push(field, ViolationKind::InvalidType, "Expected a string");
                (None, true)
            }
        };

        StringRule {
            validator: self,
            field,
            value,
            failed,
        }
    }

    pub fn integer(&mut self, field: &str) -> Option<i64> {
        let value = self.lookup(field)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                self.push(field, ViolationKind::InvalidType, "Expected an integer");
                None
            }
        }
    }

    /// String field restricted to `allowed`, then deserialized into its enum type.
    pub fn choice<T: DeserializeOwned>(&mut self, field: &str, allowed: &[&str]) -> Option<T> {
        let value = self.lookup(field)?;
        let Some(s) = value.as_str() else {
            self.push(field, ViolationKind::InvalidType, "Expected a string");
            return None;
        };

        if !allowed.contains(&s) {
            self.push(
                field,
                ViolationKind::InvalidEnum,
                format!("Expected one of: {}", allowed.join(", ")),
            );
            return None;
        }

        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                self.push(field, ViolationKind::InvalidEnum, err.to_string());
                None
            }
        }
    }

    /// Any structured value (bounding boxes, attribute lists, analysis results).
    pub fn structured<T: DeserializeOwned>(&mut self, field: &str, expected: &str) -> Option<T> {
        let value = self.lookup(field)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                self.push(
                    field,
                    ViolationKind::InvalidType,
                    format!("Expected {}: {}", expected, err),
                );
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.violations))
        }
    }
}

/// Rules applied to a single string field. Once a rule fails, later rules are skipped.
pub struct StringRule<'v, 'a> {
    validator: &'v mut Validator<'a>,
    field: &'static str,
    value: Option<String>,
    failed: bool,
}

impl StringRule<'_, '_> {
    fn fail(&mut self, kind: ViolationKind, message: &str) {
        self.validator.push(self.field, kind, message);
        self.failed = true;
    }

    pub fn required(mut self) -> Self {
        if !self.failed && self.value.is_none() {
            self.fail(ViolationKind::Required, "Required");
        }
        self
    }

    pub fn min_len(mut self, min: usize, message: &str) -> Self {
        let too_short = self
            .value
            .as_ref()
            .is_some_and(|v| v.chars().count() < min);
        if !self.failed && too_short {
            self.fail(ViolationKind::TooShort, message);
        }
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        let too_long = self
            .value
            .as_ref()
            .is_some_and(|v| v.chars().count() > max);
        if !self.failed && too_long {
            let message = format!("Must be at most {} characters", max);
            self.fail(ViolationKind::TooLong, &message);
        }
        self
    }

    pub fn email(mut self) -> Self {
        let malformed = self
            .value
            .as_ref()
            .is_some_and(|v| !email_regex().is_match(v));
        if !self.failed && malformed {
            self.fail(ViolationKind::InvalidFormat, "Invalid email address");
        }
        self
    }

    pub fn take(self) -> Option<String> {
        if self.failed { None } else { self.value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object_input() {
        let errors = Validator::new(&json!([1, 2])).err().unwrap();
        assert_eq!(errors.kind_of(""), Some(ViolationKind::InvalidType));
    }

    #[test]
    fn test_collects_every_violation() {
        let input = json!({ "email": "nope", "name": 42 });
        let mut v = Validator::new(&input).unwrap();

        let email = v.string("email").required().email().take();
        let name = v.string("name").take();
        let password = v.string("password").required().min_len(8, "Too short").take();

        assert!(email.is_none());
        assert!(name.is_none());
        assert!(password.is_none());

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.violations().len(), 3);
        assert_eq!(errors.kind_of("email"), Some(ViolationKind::InvalidFormat));
        assert_eq!(errors.kind_of("name"), Some(ViolationKind::InvalidType));
        assert_eq!(errors.kind_of("password"), Some(ViolationKind::Required));
    }

    #[test]
    fn test_null_counts_as_absent() {
        let input = json!({ "notes": null });
        let mut v = Validator::new(&input).unwrap();

        assert!(!v.is_present("notes"));
        assert_eq!(v.string("notes").take(), None);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_choice_reports_allowed_values() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        #[serde(rename_all = "lowercase")]
        enum Shade {
            Light,
            Dark,
        }

        let input = json!({ "a": "dark", "b": "grey" });
        let mut v = Validator::new(&input).unwrap();

        assert_eq!(v.choice::<Shade>("a", &["light", "dark"]), Some(Shade::Dark));
        assert_eq!(v.choice::<Shade>("b", &["light", "dark"]), None);

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.kind_of("b"), Some(ViolationKind::InvalidEnum));
        assert!(errors.violations()[0].message.contains("light, dark"));
    }

    #[test]
    fn test_min_len_counts_characters() {
        let input = json!({ "label": "é" });
        let mut v = Validator::new(&input).unwrap();
        assert_eq!(v.string("label").min_len(1, "Required").take(), Some("é".to_string()));
        assert!(v.finish().is_ok());
    }
}
