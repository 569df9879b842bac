//! Declarative request-body validation.
//!
//! Each payload is checked against a static [`Schema`] that lists, per field,
//! its type, whether it is required on creation and its bounds or allowed
//! choices. All field failures are collected into one [`FieldErrors`] so the
//! caller sees every problem in a single response.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::i18n::{Locale, Message};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    #[serde(skip)]
    locale: Locale,
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            fields: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, field: &str, message: Message) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.render(self.locale));
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Integer { min: i64, max: i64 },
    Choice(&'static [&'static str]),
    /// Names are trimmed. Free text (`allow_blank`) is kept verbatim, and a
    /// blank one reads as null.
    Text { max_len: usize, allow_blank: bool },
    Boolean,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true, nullable: false }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false, nullable: false }
    }

    pub const fn nullable(self) -> Self {
        Self { nullable: true, ..self }
    }
}

/// Create checks `required`; partial updates only validate what is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Partial,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Default)]
pub struct Validated {
    values: HashMap<&'static str, FieldValue>,
}

impl Validated {
    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(FieldValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(FieldValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// `None` when absent, `Some(None)` when explicitly null.
    pub fn nullable_text(&self, name: &str) -> Option<Option<&str>> {
        match self.values.get(name) {
            Some(FieldValue::Text(v)) => Some(Some(v.as_str())),
            Some(FieldValue::Null) => Some(None),
            _ => None,
        }
    }

    pub fn nullable_int(&self, name: &str) -> Option<Option<i64>> {
        match self.values.get(name) {
            Some(FieldValue::Int(v)) => Some(Some(*v)),
            Some(FieldValue::Null) => Some(None),
            _ => None,
        }
    }
}

pub struct Schema {
    rules: &'static [FieldRule],
}

impl Schema {
    pub const fn new(rules: &'static [FieldRule]) -> Self {
        Self { rules }
    }

    /// Fields not named by the schema are ignored. The returned error set may
    /// be extended by the caller (e.g. with lookups) before it is checked.
    pub fn validate(&self, payload: &Value, mode: Mode, locale: Locale) -> (Validated, FieldErrors) {
        let mut validated = Validated::default();
        let mut errors = FieldErrors::new(locale);

        let Some(object) = payload.as_object() else {
            errors.add(NON_FIELD_ERRORS, Message::ExpectedObject);
            return (validated, errors);
        };

        for rule in self.rules {
            match object.get(rule.name) {
                None => {
                    if rule.required && mode == Mode::Create {
                        errors.add(rule.name, Message::Required);
                    }
                }
                Some(Value::Null) => {
                    if rule.nullable {
                        validated.values.insert(rule.name, FieldValue::Null);
                    } else {
                        errors.add(rule.name, Message::NotNull);
                    }
                }
                Some(value) => match check(rule.kind, value) {
                    Ok(v) => {
                        validated.values.insert(rule.name, v);
                    }
                    Err(message) => errors.add(rule.name, message),
                },
            }
        }

        (validated, errors)
    }
}

fn check(kind: FieldKind, value: &Value) -> Result<FieldValue, Message> {
    match kind {
        FieldKind::Integer { min, max } => {
            let v = parse_integer(value).ok_or(Message::InvalidInteger)?;
            if v < min {
                return Err(Message::MinValue(min));
            }
            if v > max {
                return Err(Message::MaxValue(max));
            }
            Ok(FieldValue::Int(v))
        }
        FieldKind::Choice(choices) => match value.as_str() {
            Some(s) if choices.iter().any(|c| *c == s) => Ok(FieldValue::Text(s.to_string())),
            Some(s) => Err(Message::InvalidChoice(s.to_string())),
            None => Err(Message::InvalidChoice(value.to_string())),
        },
        FieldKind::Text { max_len, allow_blank } => {
            let raw = value.as_str().ok_or(Message::InvalidString)?;
            let trimmed = raw.trim();
            let kept = match (trimmed.is_empty(), allow_blank) {
                (true, false) => return Err(Message::Blank),
                (true, true) => return Ok(FieldValue::Null),
                (false, true) => raw,
                (false, false) => trimmed,
            };
            if kept.chars().count() > max_len {
                return Err(Message::MaxLength(max_len));
            }
            Ok(FieldValue::Text(kept.to_string()))
        }
        FieldKind::Boolean => parse_bool(value)
            .map(FieldValue::Bool)
            .ok_or(Message::InvalidBoolean),
    }
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static RULES: [FieldRule; 4] = [
        FieldRule::required("price", FieldKind::Integer { min: 0, max: 100 }),
        FieldRule::required("kind", FieldKind::Choice(&["room", "bed"])),
        FieldRule::optional("about", FieldKind::Text { max_len: 5, allow_blank: true }).nullable(),
        FieldRule::optional("is_visible", FieldKind::Boolean),
    ];
    static SCHEMA: Schema = Schema::new(&RULES);

    #[test]
    fn create_reports_every_missing_required_field() {
        let (_, errors) = SCHEMA.validate(&json!({"about": "hi"}), Mode::Create, Locale::En);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("price"), Some(&["This field is required.".to_string()][..]));
        assert!(errors.has("kind"));
    }

    #[test]
    fn partial_skips_missing_fields() {
        let (validated, errors) = SCHEMA.validate(&json!({"price": 50}), Mode::Partial, Locale::En);
        assert!(errors.is_empty());
        assert_eq!(validated.int("price"), Some(50));
        assert!(validated.get("kind").is_none());
    }

    #[test]
    fn integer_bounds_are_inclusive() {
        for (price, ok) in [(-1, false), (0, true), (100, true), (101, false)] {
            let (_, errors) = SCHEMA.validate(&json!({"price": price}), Mode::Partial, Locale::En);
            assert_eq!(errors.is_empty(), ok, "price {}", price);
        }
    }

    #[test]
    fn numeric_strings_and_floats() {
        let (validated, errors) = SCHEMA.validate(&json!({"price": " 42 "}), Mode::Partial, Locale::En);
        assert!(errors.is_empty());
        assert_eq!(validated.int("price"), Some(42));

        let (_, errors) = SCHEMA.validate(&json!({"price": 4.5}), Mode::Partial, Locale::En);
        assert_eq!(errors.get("price"), Some(&["A valid integer is required.".to_string()][..]));
    }

    #[test]
    fn choice_and_text_rules() {
        let (_, errors) = SCHEMA.validate(
            &json!({"kind": "castle", "about": "too long text"}),
            Mode::Partial,
            Locale::Ru,
        );
        assert_eq!(
            errors.get("kind"),
            Some(&["Значения \"castle\" нет среди допустимых вариантов.".to_string()][..])
        );
        assert!(errors.has("about"));
    }

    #[test]
    fn free_text_is_kept_verbatim() {
        let (validated, errors) = SCHEMA.validate(&json!({"about": " hi "}), Mode::Partial, Locale::En);
        assert!(errors.is_empty());
        assert_eq!(validated.nullable_text("about"), Some(Some(" hi ")));

        let (validated, errors) = SCHEMA.validate(&json!({"about": "   "}), Mode::Partial, Locale::En);
        assert!(errors.is_empty());
        assert_eq!(validated.get("about"), Some(&FieldValue::Null));
    }

    #[test]
    fn names_are_trimmed() {
        static NAME_RULES: [FieldRule; 1] =
            [FieldRule::required("name", FieldKind::Text { max_len: 10, allow_blank: false })];
        static NAME_SCHEMA: Schema = Schema::new(&NAME_RULES);

        let (validated, errors) = NAME_SCHEMA.validate(&json!({"name": "  Казань "}), Mode::Create, Locale::En);
        assert!(errors.is_empty());
        assert_eq!(validated.text("name"), Some("Казань"));

        let (_, errors) = NAME_SCHEMA.validate(&json!({"name": " "}), Mode::Create, Locale::En);
        assert_eq!(errors.get("name"), Some(&["This field may not be blank.".to_string()][..]));
    }

    #[test]
    fn null_only_where_nullable() {
        let (validated, errors) = SCHEMA.validate(
            &json!({"about": null, "price": null}),
            Mode::Partial,
            Locale::En,
        );
        assert_eq!(validated.nullable_text("about"), Some(None));
        assert_eq!(errors.get("price"), Some(&["This field may not be null.".to_string()][..]));
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let (validated, errors) = SCHEMA.validate(&json!({"is_visible": "false"}), Mode::Partial, Locale::En);
        assert!(errors.is_empty());
        assert_eq!(validated.bool("is_visible"), Some(false));

        let (_, errors) = SCHEMA.validate(&json!({"is_visible": "maybe"}), Mode::Partial, Locale::En);
        assert!(errors.has("is_visible"));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let (_, errors) = SCHEMA.validate(&json!([1, 2]), Mode::Partial, Locale::En);
        assert!(errors.has(NON_FIELD_ERRORS));
        assert!(errors.into_result().is_err());
    }
}
