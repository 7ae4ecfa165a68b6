//! Serializable actions.
//!
//! [`Action::Update`] carries a closure and cannot be written down. A
//! [`Command`] is its data-only counterpart: the update function is one of a
//! few named [`Transform`]s. Scripts of commands drive the CLI and are handy
//! for replaying traffic in tests.

use crate::{Action, Path, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A numeric operand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(v.into())
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

/// A named update function.
///
/// When the existing value has the wrong type the transform leaves it as is
/// and logs a warning. A missing value (`Null`) counts as `0`, `[]` or `{}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Add `by` to a number.
    Increment { by: Number },
    /// Push `value` onto an array.
    Append { value: Value },
    /// Copy the fields of `value` (an object) into an object.
    Merge { value: Value },
    /// Ignore the existing value.
    Replace { value: Value },
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Increment { .. } => "increment",
            Transform::Append { .. } => "append",
            Transform::Merge { .. } => "merge",
            Transform::Replace { .. } => "replace",
        }
    }

    /// Apply to `existing`, which the caller owns outright.
    pub fn apply(&self, existing: Value) -> Value {
        match (self, existing) {
            (Transform::Replace { value }, _) => value.clone(),
            (Transform::Increment { by }, existing) => increment(existing, by),
            (Transform::Append { value }, Value::Null) => Value::array(vec![value.clone()]),
            (Transform::Append { value }, Value::Array(mut items)) => {
                Arc::make_mut(&mut items).push(value.clone());
                Value::Array(items)
            }
            (Transform::Merge { value }, existing @ (Value::Null | Value::Object(_))) => {
                let Some(fields) = value.as_object() else {
                    tracing::warn!(found = value.type_name(), "merge operand is not an object");
                    return existing;
                };
                let mut map = match existing {
                    Value::Object(map) => map,
                    _ => Arc::default(),
                };
                let target = Arc::make_mut(&mut map);
                for (k, v) in fields {
                    target.insert(k.clone(), v.clone());
                }
                Value::Object(map)
            }
            (transform, existing) => {
                tracing::warn!(
                    transform = transform.name(),
                    found = existing.type_name(),
                    "transform does not apply; value kept"
                );
                existing
            }
        }
    }
}

fn increment(existing: Value, by: &Number) -> Value {
    let current = match &existing {
        Value::Null => Number::Int(0),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Number::Int(i),
            None => Number::Float(n.as_f64().unwrap_or(0.0)),
        },
        other => {
            tracing::warn!(found = other.type_name(), "increment on a non-number; value kept");
            return existing;
        }
    };
    match (current, by) {
        (Number::Int(a), Number::Int(b)) => match a.checked_add(*b) {
            Some(sum) => Value::from(sum),
            None => {
                tracing::warn!(value = a, by = b, "increment overflow; value kept");
                existing
            }
        },
        (a, b) => {
            let sum = a.as_f64() + b.as_f64();
            if sum.is_finite() {
                Value::from(sum)
            } else {
                tracing::warn!(value = a.as_f64(), by = b.as_f64(), "non-finite increment; value kept");
                existing
            }
        }
    }
}

/// One step of a script.
///
/// ```json
/// [
///   {"op": "store", "path": ["app", "section"], "value": "clusters"},
///   {"op": "update", "path": ["clusters", "polls"], "transform": {"kind": "increment", "by": 1}},
///   {"op": "clear", "path": ["notifications", "notifications", 0]},
///   {"op": "clear_all"}
/// ]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Store { path: Path, value: Value },
    Update { path: Path, transform: Transform },
    Clear { path: Path },
    ClearAll,
}

impl Command {
    pub fn into_action(self) -> Action {
        match self {
            Command::Store { path, value } => Action::Store { path, value },
            Command::Update { path, transform } => {
                Action::update(path, move |existing| transform.apply(existing))
            }
            Command::Clear { path } => Action::Clear { path },
            Command::ClearAll => Action::ClearAll,
        }
    }
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        command.into_action()
    }
}
