// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Input schemas and the validation gate every compile or execute call runs
//! before touching a task.
//!
//! The schema language is a small JSON-Schema subset: object, array, string,
//! number, integer and boolean. Object properties keep their declaration
//! order (`indexmap`), so the first violation reported is deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SchemaError;
use crate::expression::type_name;

/// Root path used when reporting violations.
pub const ROOT_PATH: &str = "input";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputSchema {
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default)]
        properties: IndexMap<String, InputSchema>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<InputSchema>>,
        #[serde(rename = "minItems", default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(rename = "maxItems", default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
        allowed: Option<Vec<String>>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl InputSchema {
    /// Check `value` against this schema, returning the first violation found
    /// by a depth-first walk in declaration order.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaError> {
        validate_at(self, value, ROOT_PATH)
    }

    fn expected(&self) -> &'static str {
        match self {
            InputSchema::Object { .. } => "object",
            InputSchema::Array { .. } => "array",
            InputSchema::String { .. } => "string",
            InputSchema::Number { .. } => "number",
            InputSchema::Integer { .. } => "integer",
            InputSchema::Boolean { .. } => "boolean",
        }
    }
}

fn validate_at(schema: &InputSchema, value: &Value, path: &str) -> Result<(), SchemaError> {
    let wrong_type = || {
        SchemaError::new(
            path,
            format!("expected {}, found {}", schema.expected(), type_name(value)),
        )
    };

    match schema {
        InputSchema::Object {
            properties,
            required,
            ..
        } => {
            let map = value.as_object().ok_or_else(wrong_type)?;
            for name in required {
                if !map.contains_key(name) {
                    return Err(SchemaError::new(
                        format!("{}.{}", path, name),
                        "required property is missing",
                    ));
                }
            }
            for (name, property) in properties {
                if let Some(child) = map.get(name) {
                    validate_at(property, child, &format!("{}.{}", path, name))?;
                }
            }
            Ok(())
        }
        InputSchema::Array {
            items,
            min_items,
            max_items,
            ..
        } => {
            let elements = value.as_array().ok_or_else(wrong_type)?;
            if let Some(min) = min_items {
                if elements.len() < *min {
                    return Err(SchemaError::new(
                        path,
                        format!("expected at least {} items, found {}", min, elements.len()),
                    ));
                }
            }
            if let Some(max) = max_items {
                if elements.len() > *max {
                    return Err(SchemaError::new(
                        path,
                        format!("expected at most {} items, found {}", max, elements.len()),
                    ));
                }
            }
            if let Some(item_schema) = items {
                for (index, element) in elements.iter().enumerate() {
                    validate_at(item_schema, element, &format!("{}[{}]", path, index))?;
                }
            }
            Ok(())
        }
        InputSchema::String { allowed, .. } => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            match allowed {
                Some(options) if !options.iter().any(|o| o == s) => Err(SchemaError::new(
                    path,
                    format!("'{}' is not one of [{}]", s, options.join(", ")),
                )),
                _ => Ok(()),
            }
        }
        InputSchema::Number { .. } => {
            if value.is_number() {
                Ok(())
            } else {
                Err(wrong_type())
            }
        }
        InputSchema::Integer { .. } => match value.as_f64() {
            Some(n) if value.is_i64() || value.is_u64() || n.fract() == 0.0 => Ok(()),
            _ => Err(wrong_type()),
        },
        InputSchema::Boolean { .. } => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(wrong_type())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_schema() -> InputSchema {
        serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "need": {"type": "string", "description": "The customer's need"},
                "products": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "description": {"type": "string"}
                        },
                        "required": ["name", "description"]
                    }
                }
            },
            "required": ["need", "products"]
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_input_passes() {
        let input = json!({
            "need": "laptop",
            "products": [{"name": "A", "description": "a"}]
        });
        assert!(product_schema().validate(&input).is_ok());
    }

    #[test]
    fn test_missing_required_property() {
        let err = product_schema()
            .validate(&json!({"products": [{"name": "A", "description": "a"}]}))
            .unwrap_err();
        assert_eq!(err.path, "input.need");
    }

    #[test]
    fn test_nested_path_reporting() {
        let input = json!({
            "need": "laptop",
            "products": [
                {"name": "A", "description": "a"},
                {"name": 7, "description": "b"}
            ]
        });
        let err = product_schema().validate(&input).unwrap_err();
        assert_eq!(err.path, "input.products[1].name");
        assert_eq!(err.reason, "expected string, found number");
    }

    #[test]
    fn test_min_items() {
        let err = product_schema()
            .validate(&json!({"need": "x", "products": []}))
            .unwrap_err();
        assert_eq!(err.path, "input.products");
        assert!(err.reason.contains("at least 1"));
    }

    #[test]
    fn test_declaration_order_decides_first_violation() {
        let input = json!({"need": 1, "products": "nope"});
        let err = product_schema().validate(&input).unwrap_err();
        assert_eq!(err.path, "input.need");
    }

    #[test]
    fn test_string_enum_and_scalars() {
        let schema: InputSchema =
            serde_json::from_value(json!({"type": "string", "enum": ["a", "b"]})).unwrap();
        assert!(schema.validate(&json!("a")).is_ok());
        assert!(schema.validate(&json!("c")).is_err());

        let integer = InputSchema::Integer { description: None };
        assert!(integer.validate(&json!(3)).is_ok());
        assert!(integer.validate(&json!(3.5)).is_err());

        let boolean = InputSchema::Boolean { description: None };
        assert!(boolean.validate(&json!(true)).is_ok());
        assert_eq!(
            boolean.validate(&json!("true")).unwrap_err().path,
            ROOT_PATH
        );
    }

    #[test]
    fn test_max_items() {
        let schema = InputSchema::Array {
            description: None,
            items: None,
            min_items: None,
            max_items: Some(2),
        };
        assert!(schema.validate(&json!([1, 2, 3])).is_err());
        assert!(schema.validate(&json!([1, 2])).is_ok());
    }
}
