//! Required Shape
//!
//! The minimal structural contract a caller declares for recovered output:
//! a top-level object, certain keys present, certain arrays non-empty.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One way a parsed value failed its declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeViolation {
    /// The top-level value is not an object.
    NotAnObject,
    MissingKey { key: String },
    NotAnArray { key: String },
    EmptyArray { key: String },
    /// The value did not deserialize into the caller's type.
    TypeMismatch { message: String },
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeViolation::NotAnObject => write!(f, "top-level value is not an object"),
            ShapeViolation::MissingKey { key } => write!(f, "missing required key '{}'", key),
            ShapeViolation::NotAnArray { key } => write!(f, "'{}' is not an array", key),
            ShapeViolation::EmptyArray { key } => write!(f, "'{}' must not be empty", key),
            ShapeViolation::TypeMismatch { message } => write!(f, "type mismatch: {}", message),
        }
    }
}

/// Declared top-level shape of a recovered object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredShape {
    #[serde(default)]
    pub required_keys: Vec<String>,
    #[serde(default)]
    pub non_empty_arrays: Vec<String>,
}

impl RequiredShape {
    /// Any JSON object.
    pub fn object() -> Self {
        Self::default()
    }

    /// Require a top-level key (any value, including null).
    pub fn require(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.required_keys.contains(&key) {
            self.required_keys.push(key);
        }
        self
    }

    /// Require a top-level key holding a non-empty array.
    pub fn non_empty_array(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.non_empty_arrays.contains(&key) {
            self.non_empty_arrays.push(key);
        }
        self
    }

    /// Check `value`, returning every violation found (empty when it conforms).
    pub fn check(&self, value: &Value) -> Vec<ShapeViolation> {
        let Some(object) = value.as_object() else {
            return vec![ShapeViolation::NotAnObject];
        };

        let mut violations = Vec::new();
        for key in &self.required_keys {
            if !object.contains_key(key) {
                violations.push(ShapeViolation::MissingKey { key: key.clone() });
            }
        }
        for key in &self.non_empty_arrays {
            match object.get(key) {
                None => {
                    if !self.required_keys.contains(key) {
                        violations.push(ShapeViolation::MissingKey { key: key.clone() });
                    }
                }
                Some(Value::Array(items)) if items.is_empty() => {
                    violations.push(ShapeViolation::EmptyArray { key: key.clone() });
                }
                Some(Value::Array(_)) => {}
                Some(_) => violations.push(ShapeViolation::NotAnArray { key: key.clone() }),
            }
        }
        violations
    }
}
