//! Values held in the state snapshot.

use crate::model::{AppState, Vec2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single value in the flat state snapshot.
///
/// The snapshot has no schema; readers use the typed accessors and treat a
/// mismatched variant the same as an absent key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// Boolean flag.
    Bool(bool),
    /// Any number. Geometry is stored as `f64` and narrowed on read.
    Number(f64),
    /// Text.
    Text(String),
    /// A content-space point.
    Vec2(Vec2),
    /// Ordered list.
    List(Vec<StateValue>),
    /// Nested record.
    Record(BTreeMap<String, StateValue>),
}

impl StateValue {
    /// Numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StateValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value narrowed to `f32`.
    pub fn as_f32(&self) -> Option<f32> {
        self.as_number().map(|n| n as f32)
    }

    /// Text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value, if this is a flag.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Point value, if this is a point.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            StateValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// List items, if this is a list.
    pub fn as_list(&self) -> Option<&[StateValue]> {
        match self {
            StateValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Record fields, if this is a record.
    pub fn as_record(&self) -> Option<&BTreeMap<String, StateValue>> {
        match self {
            StateValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Store any serializable value, e.g. a message record.
    ///
    /// # Errors
    ///
    /// Fails if `value` does not serialize to JSON, or serializes to `null`.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(value)?)
    }

    /// Decode this value into a typed structure.
    ///
    /// Integral numbers are presented as JSON integers, so integer fields
    /// decode from values that were stored as `f64`.
    ///
    /// # Errors
    ///
    /// Fails if the value does not have the shape `T` expects.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }

    /// JSON form of this value.
    pub fn to_json(&self) -> Value {
        match self {
            StateValue::Bool(b) => Value::Bool(*b),
            StateValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER => {
                if *n >= 0.0 {
                    Value::from(*n as u64)
                } else {
                    Value::from(*n as i64)
                }
            }
            StateValue::Number(n) => {
                serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number)
            }
            StateValue::Text(s) => Value::String(s.clone()),
            StateValue::Vec2(v) => serde_json::json!({ "x": v.x, "y": v.y }),
            StateValue::List(items) => {
                Value::Array(items.iter().map(StateValue::to_json).collect())
            }
            StateValue::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        StateValue::Number(n)
    }
}

impl From<f32> for StateValue {
    fn from(n: f32) -> Self {
        StateValue::Number(f64::from(n))
    }
}

impl From<u32> for StateValue {
    fn from(n: u32) -> Self {
        StateValue::Number(f64::from(n))
    }
}

impl From<usize> for StateValue {
    fn from(n: usize) -> Self {
        StateValue::Number(n as f64)
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Text(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Text(s)
    }
}

impl From<Vec2> for StateValue {
    fn from(v: Vec2) -> Self {
        StateValue::Vec2(v)
    }
}

impl From<AppState> for StateValue {
    fn from(state: AppState) -> Self {
        StateValue::Text(state.as_str().to_string())
    }
}

impl From<Vec<StateValue>> for StateValue {
    fn from(items: Vec<StateValue>) -> Self {
        StateValue::List(items)
    }
}
