//! Field descriptors.
//!
//! A [`Field`] is a stateless validator for one attribute of a request model.
//! Descriptors are declared once per model in a static field list and shared by
//! every instance; the validated values live on the instance.

use chrono::{Local, Months, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const DATE_FORMAT: &str = "%d.%m.%Y";
const MAX_CHAR_LENGTH: usize = 256;
const MAX_AGE_YEARS: u32 = 70;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z0-9-]+$")
        .expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^7[0-9]{10}$").expect("valid phone regex"));

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("this field is required")]
    Required,

    #[error("this field cannot be empty")]
    NotNullable,

    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0}")]
    Invalid(&'static str),

    #[error("unknown field")]
    Unknown,
}

/// A validated, non-empty field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Mapping(Map<String, Value>),
    Ids(Vec<i64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Char,
    Arguments,
    Email,
    Phone,
    Date,
    BirthDay,
    Gender,
    ClientIds,
}

impl FieldKind {
    fn expected_shape(self) -> &'static str {
        match self {
            FieldKind::Char | FieldKind::Email | FieldKind::Date | FieldKind::BirthDay => "string",
            FieldKind::Arguments => "object",
            FieldKind::Phone => "string or integer",
            FieldKind::Gender => "integer",
            FieldKind::ClientIds => "array",
        }
    }

    fn accepts_shape(self, value: &Value) -> bool {
        match self {
            FieldKind::Char | FieldKind::Email | FieldKind::Date | FieldKind::BirthDay => {
                value.is_string()
            }
            FieldKind::Arguments => value.is_object(),
            FieldKind::Phone => value.is_string() || as_integer(value).is_some(),
            FieldKind::Gender => as_integer(value).is_some(),
            FieldKind::ClientIds => value.is_array(),
        }
    }

    /// Runs the kind-specific content rule on a non-empty value of the right shape.
    fn check_content(self, value: &Value) -> Result<FieldValue, FieldError> {
        match (self, value) {
            (FieldKind::Char, Value::String(s)) => {
                if s.chars().count() > MAX_CHAR_LENGTH {
                    return Err(FieldError::Invalid("must be at most 256 characters long"));
                }
                Ok(FieldValue::Text(s.clone()))
            }
            (FieldKind::Arguments, Value::Object(map)) => Ok(FieldValue::Mapping(map.clone())),
            (FieldKind::Email, Value::String(s)) => {
                if !EMAIL_RE.is_match(s) {
                    return Err(FieldError::Invalid("must be a valid email address"));
                }
                Ok(FieldValue::Text(s.clone()))
            }
            (FieldKind::Phone, value) => {
                let phone = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if !PHONE_RE.is_match(&phone) {
                    return Err(FieldError::Invalid(
                        "must be 11 digits starting with 7",
                    ));
                }
                Ok(FieldValue::Text(phone))
            }
            (FieldKind::Date, Value::String(s)) => parse_date(s).map(FieldValue::Date),
            (FieldKind::BirthDay, Value::String(s)) => {
                let date = parse_date(s)?;
                let oldest = Local::now()
                    .date_naive()
                    .checked_sub_months(Months::new(MAX_AGE_YEARS * 12))
                    .unwrap_or(NaiveDate::MIN);
                if date < oldest {
                    return Err(FieldError::Invalid(
                        "must be no more than 70 years in the past",
                    ));
                }
                Ok(FieldValue::Date(date))
            }
            (FieldKind::Gender, value) => match as_integer(value) {
                Some(gender @ 0..=2) => Ok(FieldValue::Integer(gender)),
                _ => Err(FieldError::Invalid("must be one of 0, 1 or 2")),
            },
            (FieldKind::ClientIds, Value::Array(items)) => {
                let ids = items
                    .iter()
                    .map(as_integer)
                    .collect::<Option<Vec<_>>>()
                    .ok_or(FieldError::Invalid("every client id must be an integer"))?;
                if ids.is_empty() {
                    return Err(FieldError::Invalid("must contain at least one client id"));
                }
                Ok(FieldValue::Ids(ids))
            }
            (kind, value) => Err(FieldError::TypeMismatch {
                expected: kind.expected_shape(),
                actual: type_name(value),
            }),
        }
    }
}

/// Validator for a single model attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl Field {
    pub const fn new(kind: FieldKind) -> Self {
        Field {
            kind,
            required: false,
            nullable: false,
        }
    }

    pub const fn char() -> Self {
        Self::new(FieldKind::Char)
    }

    pub const fn arguments() -> Self {
        Self::new(FieldKind::Arguments)
    }

    pub const fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    pub const fn phone() -> Self {
        Self::new(FieldKind::Phone)
    }

    pub const fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub const fn birthday() -> Self {
        Self::new(FieldKind::BirthDay)
    }

    pub const fn gender() -> Self {
        Self::new(FieldKind::Gender)
    }

    pub const fn client_ids() -> Self {
        Self::new(FieldKind::ClientIds)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Validates a raw value. `None` means the key was absent from the payload.
    ///
    /// Returns `Ok(None)` for an empty value on a nullable field.
    pub fn validate(&self, raw: Option<&Value>) -> Result<Option<FieldValue>, FieldError> {
        let Some(value) = raw else {
            if self.required {
                return Err(FieldError::Required);
            }
            if !self.nullable {
                return Err(FieldError::NotNullable);
            }
            return Ok(None);
        };

        let empty = is_empty(value);
        if empty && !self.nullable {
            return Err(FieldError::NotNullable);
        }

        if !value.is_null() && !self.kind.accepts_shape(value) {
            return Err(FieldError::TypeMismatch {
                expected: self.kind.expected_shape(),
                actual: type_name(value),
            });
        }

        if empty {
            return Ok(None);
        }

        self.kind.check_content(value).map(Some)
    }
}

/// Null and zero-length strings, arrays and objects are empty. Numbers never are.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| FieldError::Invalid("must be a valid date in DD.MM.YYYY format"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_accepts(field: Field, values: &[Value]) {
        for value in values {
            assert!(
                field.validate(Some(value)).is_ok(),
                "{:?} should accept {value}",
                field.kind
            );
        }
    }

    fn assert_rejects(field: Field, values: &[Value]) {
        for value in values {
            assert!(
                field.validate(Some(value)).is_err(),
                "{:?} should reject {value}",
                field.kind
            );
        }
    }

    #[test]
    fn test_char_field() {
        let field = Field::char().nullable();
        assert_accepts(
            field,
            &[json!("abc~!@#$%^&*()_+=-"), json!("a".repeat(256)), json!("ааaa")],
        );
        assert_rejects(field, &[json!("a".repeat(257)), json!(123456798), json!({"a": 1})]);
    }

    #[test]
    fn test_arguments_field() {
        let field = Field::arguments().required().nullable();
        assert_accepts(
            field,
            &[
                json!({"arg1": 1, "arg2": 2}),
                json!({"arg2": [1, 2]}),
                json!({"arg1": "data"}),
            ],
        );
        assert_rejects(field, &[json!([]), json!(""), json!(123)]);
    }

    #[test]
    fn test_email_field() {
        let field = Field::email().nullable();
        assert_accepts(field, &[json!("ilya@m.ru"), json!("z@m.r"), json!("ilya.a@gmail.com")]);
        assert_rejects(field, &[json!("www.ya.ru"), json!("stupnikovotus.ru"), json!(123)]);
    }

    #[test]
    fn test_phone_field() {
        let field = Field::phone().nullable();
        assert_accepts(field, &[json!("76542589156"), json!(79876320478_i64), json!(79999999999_i64)]);
        assert_rejects(
            field,
            &[json!("88002004040"), json!(799966600441_i64), json!([1]), json!(7.5)],
        );
    }

    #[test]
    fn test_phone_integer_is_normalized_to_text() {
        let value = Field::phone().validate(Some(&json!(79175002040_i64)));
        assert_eq!(value, Ok(Some(FieldValue::Text("79175002040".into()))));
    }

    #[test]
    fn test_date_field() {
        let field = Field::date().nullable();
        assert_accepts(field, &[json!("10.04.1986"), json!("29.02.2016"), json!("01.01.1900")]);
        assert_rejects(field, &[json!("XXX"), json!(10041986), json!("29.02.2019")]);
    }

    #[test]
    fn test_birthday_field() {
        let field = Field::birthday().nullable();
        assert_accepts(field, &[json!("10.04.1986"), json!("01.01.2000")]);
        assert_rejects(field, &[json!("12.12.1880"), json!("01.01.1890"), json!("XXX")]);
    }

    #[test]
    fn test_gender_field() {
        let field = Field::gender().nullable();
        assert_accepts(field, &[json!(0), json!(1), json!(2)]);
        assert_rejects(field, &[json!("M"), json!("1"), json!(4), json!(-1)]);
    }

    #[test]
    fn test_client_ids_field() {
        let field = Field::client_ids().required();
        assert_accepts(field, &[json!([1, 2, 3]), json!([1, 2]), json!([0])]);
        assert_rejects(
            field,
            &[json!({"1": 2, "3": 4}), json!("1,2,3"), json!(123), json!(["1", "2"]), json!([])],
        );
    }

    #[test]
    fn test_gender_zero_is_not_empty() {
        let field = Field::gender();
        assert_eq!(field.validate(Some(&json!(0))), Ok(Some(FieldValue::Integer(0))));
    }

    #[test]
    fn test_rule_order() {
        let required = Field::char().required();
        assert_eq!(required.validate(None), Err(FieldError::Required));
        assert_eq!(required.validate(Some(&json!(""))), Err(FieldError::NotNullable));
        assert_eq!(required.validate(Some(&Value::Null)), Err(FieldError::NotNullable));

        let nullable = Field::char().required().nullable();
        assert_eq!(nullable.validate(Some(&Value::Null)), Ok(None));
        assert_eq!(nullable.validate(Some(&json!(""))), Ok(None));
    }

    #[test]
    fn test_type_mismatch_reports_names() {
        let err = Field::gender().nullable().validate(Some(&json!("1")));
        assert_eq!(
            err,
            Err(FieldError::TypeMismatch {
                expected: "integer",
                actual: "string",
            })
        );
        assert_eq!(err.unwrap_err().to_string(), "expected integer, got string");
    }

    #[test]
    fn test_shape_checked_before_emptiness_on_nullable_fields() {
        // An empty string is still the wrong shape for a mapping.
        let err = Field::arguments().nullable().validate(Some(&json!("")));
        assert!(matches!(err, Err(FieldError::TypeMismatch { .. })));
    }
}
