//! The state transition function.
//!
//! ```text
//! tree' = reduce(tree, action)
//! ```
//!
//! `reduce` is total: no action is rejected and missing intermediate nodes
//! are defaulted to empty objects. The caller replaces its tree with the
//! result wholesale.

use crate::config::{PreserveConfig, StoreConfig};
use crate::resolve::read;
use crate::update::{child_or_default, remove_at, set_at, swap, update_at};
use crate::{Action, Seg, Value};

/// Apply one action to `tree`, returning the new root.
///
/// Path actions rebuild only the spine from the root to the target; every
/// sibling subtree of the result is shared with `tree`. `ClearAll` rebuilds
/// the whole tree from `config` and keeps the allow-listed fields.
///
/// ```
/// use console_state::{path, reduce, Action, StoreConfig, Value};
///
/// let config = StoreConfig::default();
/// let tree = config.initial_tree();
/// let tree = reduce(&tree, Action::store(path!("app", "section"), "clusters"), &config);
/// assert_eq!(tree.at(&path!("app", "section")), Some(&Value::from("clusters")));
/// ```
pub fn reduce(tree: &Value, action: Action, config: &StoreConfig) -> Value {
    match action {
        Action::Store { path, value } => set_at(tree, path.segments(), value),
        Action::Update { path, update } => update_at(tree, path.segments(), update),
        Action::Clear { path } => remove_at(tree, path.segments()),
        Action::ClearAll => reset(tree, &config.preserve, config.initial_tree()),
    }
}

/// Rebuild from `initial`, copying the allow-listed fields of the preserved
/// branch over from `previous`. Fields absent in `previous` stay absent.
pub fn reset(previous: &Value, preserve: &PreserveConfig, initial: Value) -> Value {
    let branch = Seg::key(preserve.branch.as_str());
    let mut kept = child_or_default(&initial, &branch);
    for key in &preserve.keys {
        let field = Seg::key(key.as_str());
        if let Some(value) = read(previous, &[branch.clone(), field.clone()]) {
            kept = swap(&kept, &field, value.clone());
        }
    }
    swap(&initial, &branch, kept)
}
