//! Typed access to control-plane response documents
//!
//! Responses are JSON objects with an optional `result` field. Lookups
//! distinguish a field that is absent from one that is present with the
//! wrong type, so shape problems surface as errors instead of empty values.

use serde_json::{Map, Value};
use thiserror::Error;

/// Response document shape problem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Body is not valid JSON
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Body is valid JSON but not an object
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// Field is present with an unexpected type
    #[error("field `{field}` should be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Name of a JSON value's type, for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decoded JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
}

/// Result of a value lookup. `null` counts as absent.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    path: &'a str,
    value: Option<&'a Value>,
}

impl Document {
    /// Decode a response body, which must be a JSON object
    pub fn parse(body: &[u8]) -> Result<Self, ShapeError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ShapeError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ShapeError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ShapeError::NotAnObject {
                found: type_name(&other),
            }),
        }
    }

    /// Whether a top-level field is present, including with a `null` value
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Walk nested objects, e.g. `["result", "checksum"]`.
    ///
    /// An absent or null intermediate yields an absent field; an intermediate
    /// that is not an object is a [`ShapeError::WrongType`].
    pub fn path<'a>(&'a self, segments: &[&'a str]) -> Result<Field<'a>, ShapeError> {
        let Some((last, parents)) = segments.split_last() else {
            return Ok(Field {
                path: "",
                value: None,
            });
        };

        let mut current = &self.fields;
        let mut walked = String::new();
        for segment in parents {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            match current.get(*segment) {
                None | Some(Value::Null) => {
                    return Ok(Field {
                        path: *last,
                        value: None,
                    })
                }
                Some(Value::Object(next)) => current = next,
                Some(other) => {
                    return Err(ShapeError::WrongType {
                        field: walked,
                        expected: "object",
                        found: type_name(other),
                    })
                }
            }
        }

        Ok(Field {
            path: *last,
            value: current.get(*last).filter(|v| !v.is_null()),
        })
    }

    /// Take an object-valued field as its own document
    pub fn into_field_document(mut self, name: &str) -> Result<Option<Document>, ShapeError> {
        match self.fields.remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(Document { fields })),
            Some(other) => Err(ShapeError::WrongType {
                field: name.to_string(),
                expected: "object",
                found: type_name(&other),
            }),
        }
    }

    /// Overwrite top-level fields; new fields are added, existing ones replaced
    /// wholesale.
    pub fn merge(&mut self, changes: Map<String, Value>) {
        for (field, value) in changes {
            self.fields.insert(field, value);
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.fields)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl<'a> Field<'a> {
    /// String value, or `None` when absent
    pub fn as_str(&self) -> Result<Option<&'a str>, ShapeError> {
        match self.value {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.wrong_type("string", other)),
        }
    }

    fn wrong_type(&self, expected: &'static str, found: &Value) -> ShapeError {
        ShapeError::WrongType {
            field: self.path.to_string(),
            expected,
            found: type_name(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(
            Document::parse(b"not json"),
            Err(ShapeError::Malformed(_))
        ));
        assert_eq!(
            Document::parse(b"[1, 2]"),
            Err(ShapeError::NotAnObject { found: "array" })
        );
    }

    #[test]
    fn test_contains_counts_null_fields() {
        let d = doc(json!({"result": null, "error": "boom"}));
        assert!(d.contains("result"));
        assert!(d.contains("error"));
        assert!(!d.contains("missing"));

        // A null value is present as a key but has no value to read
        assert_eq!(d.path(&["result"]).unwrap().as_str().unwrap(), None);
    }

    #[test]
    fn test_nested_checksum() {
        let d = doc(json!({"result": {"checksum": "f00d"}}));
        let checksum = d.path(&["result", "checksum"]).unwrap().as_str().unwrap();
        assert_eq!(checksum, Some("f00d"));
    }

    #[test]
    fn test_absent_vs_wrong_type() {
        let absent = doc(json!({"error": "boom"}));
        assert_eq!(
            absent.path(&["result", "checksum"]).unwrap().as_str().unwrap(),
            None
        );

        let wrong_leaf = doc(json!({"result": {"checksum": 42}}));
        let err = wrong_leaf
            .path(&["result", "checksum"])
            .unwrap()
            .as_str()
            .unwrap_err();
        assert_eq!(
            err,
            ShapeError::WrongType {
                field: "checksum".into(),
                expected: "string",
                found: "number",
            }
        );

        let wrong_parent = doc(json!({"result": "ok"}));
        assert!(matches!(
            wrong_parent.path(&["result", "checksum"]),
            Err(ShapeError::WrongType { expected: "object", found: "string", .. })
        ));
    }

    #[test]
    fn test_into_field_document() {
        let d = doc(json!({"result": {"a": 1}}));
        let result = d.into_field_document("result").unwrap().unwrap();
        assert_eq!(result.into_value(), json!({"a": 1}));

        let d = doc(json!({"result": [1]}));
        assert!(d.into_field_document("result").is_err());

        let d = doc(json!({}));
        assert!(d.into_field_document("result").unwrap().is_none());
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut d = doc(json!({"a": 1, "b": {"nested": true}, "c": 3}));
        let changes = json!({"b": {"other": false}, "d": 4});
        d.merge(changes.as_object().unwrap().clone());

        assert_eq!(
            d.into_value(),
            json!({"a": 1, "b": {"other": false}, "c": 3, "d": 4})
        );
    }
}
