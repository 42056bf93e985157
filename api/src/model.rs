//! Declarative request models.
//!
//! A [`Schema`] is a static, ordered list of `(name, Field)` pairs. Building an
//! [`Instance`] from a JSON payload runs every declared field against the
//! payload once and records a value or an error per field.

use crate::fields::{Field, FieldError, FieldValue};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::{Map, Value};

#[derive(Debug, PartialEq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [(&'static str, Field)],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find_map(|(field_name, field)| (*field_name == name).then_some(field))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{model} expects a JSON object, got {actual}")]
    BadShape {
        model: &'static str,
        actual: &'static str,
    },
}

/// Field errors collected for one model, keyed by field name in declaration order.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("invalid {model}: {}", join_errors(errors))]
pub struct ValidationError {
    pub model: &'static str,
    pub errors: IndexMap<String, FieldError>,
}

fn join_errors(errors: &IndexMap<String, FieldError>) -> String {
    errors
        .iter()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    schema: &'static Schema,
    values: IndexMap<&'static str, Option<FieldValue>>,
    errors: IndexMap<String, FieldError>,
}

impl Instance {
    pub fn new(schema: &'static Schema, raw: &Value) -> Result<Self, ModelError> {
        let Value::Object(payload) = raw else {
            return Err(ModelError::BadShape {
                model: schema.name,
                actual: shape_name(raw),
            });
        };

        let mut values = IndexMap::new();
        let mut errors = IndexMap::new();

        for (name, field) in schema.fields {
            match payload.get(*name) {
                Some(value) => match field.validate(Some(value)) {
                    Ok(value) => {
                        values.insert(*name, value);
                    }
                    Err(err) => {
                        errors.insert(name.to_string(), err);
                    }
                },
                None if field.required => {
                    errors.insert(name.to_string(), FieldError::Required);
                }
                None => {}
            }
        }

        for key in payload.keys() {
            if schema.field(key).is_none() {
                errors.insert(key.clone(), FieldError::Unknown);
            }
        }

        Ok(Instance {
            schema,
            values,
            errors,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &IndexMap<String, FieldError> {
        &self.errors
    }

    /// Consumes the instance, returning its values only if every field validated.
    pub fn validated(self) -> Result<Valid, ValidationError> {
        if !self.is_valid() {
            return Err(ValidationError {
                model: self.schema.name,
                errors: self.errors,
            });
        }

        let values = self
            .values
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value)))
            .collect();
        Ok(Valid { values })
    }
}

/// Non-empty values of a model that passed validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Valid {
    values: IndexMap<&'static str, FieldValue>,
}

impl Valid {
    /// Names of the fields holding a non-empty value, in declaration order.
    pub fn filled_fields(&self) -> Vec<&'static str> {
        self.values.keys().copied().collect()
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(FieldValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.values.get(name) {
            Some(FieldValue::Date(date)) => Some(*date),
            _ => None,
        }
    }

    pub fn mapping(&self, name: &str) -> Option<Map<String, Value>> {
        match self.values.get(name) {
            Some(FieldValue::Mapping(map)) => Some(map.clone()),
            _ => None,
        }
    }

    pub fn ids(&self, name: &str) -> Option<Vec<i64>> {
        match self.values.get(name) {
            Some(FieldValue::Ids(ids)) => Some(ids.clone()),
            _ => None,
        }
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static PROFILE: Schema = Schema {
        name: "Profile",
        fields: &[
            ("name", Field::char().required()),
            ("email", Field::email().nullable()),
            ("phone", Field::phone().nullable()),
            ("gender", Field::gender().nullable()),
        ],
    };

    #[test]
    fn test_valid_payload() {
        let instance = Instance::new(
            &PROFILE,
            &json!({"name": "ivan", "email": "", "phone": 79175002040_i64, "gender": 0}),
        )
        .unwrap();
        assert!(instance.is_valid());

        let valid = instance.validated().unwrap();
        assert_eq!(valid.filled_fields(), vec!["name", "phone", "gender"]);
        assert_eq!(valid.text("phone").as_deref(), Some("79175002040"));
        assert_eq!(valid.integer("gender"), Some(0));
        assert_eq!(valid.text("email"), None);
    }

    #[test]
    fn test_every_failing_field_is_reported() {
        let instance = Instance::new(
            &PROFILE,
            &json!({"email": "not-an-email", "phone": "89175002040"}),
        )
        .unwrap();
        assert!(!instance.is_valid());

        let names: Vec<_> = instance.errors().keys().cloned().collect();
        assert_eq!(names, vec!["name", "email", "phone"]);
        assert_eq!(instance.errors()["name"], FieldError::Required);

        let err = instance.validated().unwrap_err();
        assert_eq!(err.model, "Profile");
        assert!(err.to_string().starts_with("invalid Profile: name: this field is required; email:"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let instance = Instance::new(&PROFILE, &json!({"name": "ivan", "age": 3})).unwrap();
        assert_eq!(instance.errors().get("age"), Some(&FieldError::Unknown));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let payload = json!({"name": "", "gender": 5, "extra": true});
        let first = Instance::new(&PROFILE, &payload).unwrap();
        let second = Instance::new(&PROFILE, &payload).unwrap();
        assert_eq!(first.errors(), second.errors());
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_object_payload() {
        assert_eq!(
            Instance::new(&PROFILE, &json!([1, 2])),
            Err(ModelError::BadShape {
                model: "Profile",
                actual: "array",
            })
        );
    }
}
