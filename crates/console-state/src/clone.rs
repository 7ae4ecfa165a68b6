//! Type-preserving deep copy of a subtree.
//!
//! Used once per `Update` action so the update function receives a private
//! snapshot it can rearrange freely without touching the shared tree.

use crate::Value;

/// Copy `value` so that the result shares no container with the input.
///
/// Dispatch, in order:
/// - arrays are copied element by element, recursively;
/// - timestamps copy their instant;
/// - sets get a new allocation holding the same members (members are not
///   copied themselves);
/// - patterns get a new, equivalent compiled expression;
/// - objects are copied field by field, recursively;
/// - `Null` passes through;
/// - tokens keep their identity, so a copied token still equals the original;
/// - remaining scalars are copied by value.
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::array(items.iter().map(deep_clone).collect()),
        Value::Timestamp(t) => Value::Timestamp(*t),
        Value::Set(set) => Value::Set(set.reallocate()),
        Value::Pattern(p) => Value::Pattern(p.reallocate()),
        Value::Object(map) => Value::from_map(
            map.iter()
                .map(|(k, v)| (k.clone(), deep_clone(v)))
                .collect(),
        ),
        Value::Null => Value::Null,
        Value::Token(t) => Value::Token(t.clone()),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
    }
}
