//! Commands accepted by the reducer.

use crate::{Path, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Function applied by an `Update` action to a private copy of the target.
pub type UpdateFn = Box<dyn FnOnce(Value) -> Value + Send>;

/// A single state transition.
pub enum Action {
    /// Write `value` at `path` unconditionally.
    Store { path: Path, value: Value },
    /// Replace the value at `path` with `update(copy_of_existing)`.
    Update { path: Path, update: UpdateFn },
    /// Remove the value at `path`. Array elements after it shift down.
    Clear { path: Path },
    /// Reset to the initial tree, keeping the allow-listed fields.
    ClearAll,
}

impl Action {
    pub fn store(path: Path, value: impl Into<Value>) -> Self {
        Action::Store {
            path,
            value: value.into(),
        }
    }

    pub fn update<F>(path: Path, update: F) -> Self
    where
        F: FnOnce(Value) -> Value + Send + 'static,
    {
        Action::Update {
            path,
            update: Box::new(update),
        }
    }

    pub fn clear(path: Path) -> Self {
        Action::Clear { path }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Store { .. } => ActionKind::Store,
            Action::Update { .. } => ActionKind::Update,
            Action::Clear { .. } => ActionKind::Clear,
            Action::ClearAll => ActionKind::ClearAll,
        }
    }

    /// Target path; `None` for `ClearAll`.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Action::Store { path, .. } | Action::Update { path, .. } | Action::Clear { path } => {
                Some(path)
            }
            Action::ClearAll => None,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Store { path, value } => f
                .debug_struct("Store")
                .field("path", path)
                .field("value", value)
                .finish(),
            Action::Update { path, .. } => f
                .debug_struct("Update")
                .field("path", path)
                .finish_non_exhaustive(),
            Action::Clear { path } => f.debug_struct("Clear").field("path", path).finish(),
            Action::ClearAll => f.write_str("ClearAll"),
        }
    }
}

/// Discriminant of an [`Action`], used in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Store,
    Update,
    Clear,
    ClearAll,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Store => "store",
            ActionKind::Update => "update",
            ActionKind::Clear => "clear",
            ActionKind::ClearAll => "clear_all",
        })
    }
}
