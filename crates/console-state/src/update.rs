//! Write primitives producing new trees with structural sharing.
//!
//! None of these functions mutate their input. Each returns a new root in
//! which every container on the spine from the root to the target is freshly
//! allocated and every other subtree is shared with the input.

use crate::clone::deep_clone;
use crate::resolve::child;
use crate::{Map, Seg, Value};

/// Rebind one slot of `container`.
///
/// - Array with a position: a new array with that position replaced. No other
///   element moves. A position at or past the end appends, so the new element
///   lands at `len`, not at the requested position.
/// - Array with a non-numeric key: the array is returned unchanged.
/// - Object: a shallow copy with the field rebound (existing fields keep
///   their order).
/// - Anything else counts as an empty object, so the result is a new object
///   holding just this field.
pub fn swap(container: &Value, seg: &Seg, value: Value) -> Value {
    match container {
        Value::Array(items) => match seg.as_array_index() {
            Some(i) if i < items.len() => {
                let mut next = Vec::with_capacity(items.len());
                next.extend_from_slice(&items[..i]);
                next.push(value);
                next.extend_from_slice(&items[i + 1..]);
                Value::array(next)
            }
            Some(i) => {
                if i > items.len() {
                    tracing::debug!(index = i, len = items.len(), "index past end of array; appended");
                }
                let mut next = Vec::with_capacity(items.len() + 1);
                next.extend_from_slice(items);
                next.push(value);
                Value::array(next)
            }
            None => {
                tracing::debug!(segment = %seg, "key segment on array; slot not written");
                container.clone()
            }
        },
        Value::Object(map) => {
            let mut next = map.as_ref().clone();
            next.insert(seg.as_object_key().into_owned(), value);
            Value::from_map(next)
        }
        _ => {
            let mut next = Map::with_capacity(1);
            next.insert(seg.as_object_key().into_owned(), value);
            Value::from_map(next)
        }
    }
}

/// Remove one slot of `container`.
///
/// Arrays splice the element out, so later elements shift down by one.
/// Objects drop the field entirely. Out-of-range positions and missing
/// fields leave the container as it was; a leaf becomes an empty object.
pub fn remove(container: &Value, seg: &Seg) -> Value {
    match container {
        Value::Array(items) => match seg.as_array_index() {
            Some(i) if i < items.len() => {
                let mut next = items.as_ref().clone();
                next.remove(i);
                Value::array(next)
            }
            _ => container.clone(),
        },
        Value::Object(map) => {
            let key = seg.as_object_key();
            if !map.contains_key(&*key) {
                return container.clone();
            }
            let mut next = map.as_ref().clone();
            next.shift_remove(&*key);
            Value::from_map(next)
        }
        _ => Value::object(),
    }
}

/// The child at `seg`, or an empty object when there is none.
pub(crate) fn child_or_default(container: &Value, seg: &Seg) -> Value {
    child(container, seg).cloned().unwrap_or_else(Value::object)
}

/// Descend along `path`, apply `leaf` to the parent of the target and the
/// final segment, then rebuild every ancestor with [`swap`].
///
/// Intermediate levels are never copied, only re-pointed. An empty path
/// returns `container` unchanged.
pub(crate) fn rebuild<F>(container: &Value, path: &[Seg], leaf: F) -> Value
where
    F: FnOnce(&Value, &Seg) -> Value,
{
    match path {
        [] => container.clone(),
        [seg] => leaf(container, seg),
        [seg, rest @ ..] => {
            let subtree = child_or_default(container, seg);
            let nested = rebuild(&subtree, rest, leaf);
            swap(container, seg, nested)
        }
    }
}

/// Write `value` at `path`, creating missing intermediate objects.
pub fn set_at(container: &Value, path: &[Seg], value: Value) -> Value {
    rebuild(container, path, |parent, seg| swap(parent, seg, value))
}

/// Replace the value at `path` with `f(copy)`.
///
/// `f` receives a deep copy of the current value, or `Null` when absent. Only
/// the target is copied; ancestors are rebuilt by [`swap`].
pub fn update_at<F>(container: &Value, path: &[Seg], f: F) -> Value
where
    F: FnOnce(Value) -> Value,
{
    rebuild(container, path, |parent, seg| {
        let existing = child(parent, seg).map(deep_clone).unwrap_or(Value::Null);
        swap(parent, seg, f(existing))
    })
}

/// Delete the value at `path`. See [`remove`] for the leaf-level rules.
pub fn remove_at(container: &Value, path: &[Seg]) -> Value {
    rebuild(container, path, remove)
}
