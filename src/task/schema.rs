//! Structural contract for final answers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The shape an `ok` answer must take for a given task.
///
/// Conformance is purely structural; value comparison happens later, after
/// normalization, in the reward engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AnswerSchema {
    /// A single string.
    Text,
    /// A single number (integer or float).
    Number,
    /// A list of strings. Order sensitivity is a normalization concern.
    TextList,
    /// A string-to-string mapping.
    TextMap,
}

impl AnswerSchema {
    /// Checks that `value` conforms to this schema.
    ///
    /// Returns a short human-readable description of the first violation,
    /// used verbatim in the validator's `error` field.
    pub fn conforms(&self, value: &Value) -> Result<(), String> {
        match self {
            AnswerSchema::Text => match value {
                Value::String(_) => Ok(()),
                other => Err(format!("expected a string, got {}", type_name(other))),
            },
            AnswerSchema::Number => match value {
                Value::Number(_) => Ok(()),
                other => Err(format!("expected a number, got {}", type_name(other))),
            },
            AnswerSchema::TextList => match value {
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if !item.is_string() {
                            return Err(format!(
                                "expected a list of strings, item {} is {}",
                                i,
                                type_name(item)
                            ));
                        }
                    }
                    Ok(())
                }
                other => Err(format!("expected a list, got {}", type_name(other))),
            },
            AnswerSchema::TextMap => match value {
                Value::Object(map) => {
                    for (key, item) in map {
                        if !item.is_string() {
                            return Err(format!(
                                "expected a map of strings, value for '{}' is {}",
                                key,
                                type_name(item)
                            ));
                        }
                    }
                    Ok(())
                }
                other => Err(format!("expected a map, got {}", type_name(other))),
            },
        }
    }

    /// One-line description surfaced to the agent through the metadata
    /// accessor.
    pub fn describe(&self) -> &'static str {
        match self {
            AnswerSchema::Text => "a single string",
            AnswerSchema::Number => "a single number",
            AnswerSchema::TextList => "a list of strings",
            AnswerSchema::TextMap => "a map from string keys to string values",
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
