//! Path-addressed immutable state tree with structural sharing.
//!
//! `console-state` holds the client-side state of a management console in a
//! single tree of objects, arrays and leaves. The tree is never modified in
//! place: every write produces a new root that shares all untouched subtrees
//! with the previous one, so "did this part change?" is a pointer comparison.
//!
//! # Core Concepts
//!
//! - **Value**: A node of the tree. Containers are reference counted; cloning
//!   a value is shallow
//! - **Path**: A list of key and index segments addressing a node
//! - **Action**: One state transition (`Store`, `Update`, `Clear`, `ClearAll`)
//! - **reduce**: The pure transition function `tree' = reduce(tree, action)`
//! - **Store**: A shared handle holding the current tree and its observers
//! - **Watch**: A per-path view that wakes up only when its subtree changes
//!
//! # Quick Start
//!
//! ```
//! use console_state::{path, Store, Value};
//!
//! let store = Store::default();
//! let status = store.watch(path!("clusters", "index", "demo", "status"));
//!
//! store.store(path!("clusters", "index", "demo", "status"), "CREATE_IN_PROGRESS");
//! assert!(status.has_changed());
//!
//! store.store(path!("users", "index"), Value::object());
//! assert_eq!(status.get(), Value::from("CREATE_IN_PROGRESS"));
//! ```
//!
//! # Pure Transitions
//!
//! ```
//! use console_state::{path, set_at, Value};
//! use serde_json::json;
//!
//! let tree = Value::from(json!({"a": {"x": 1}, "b": {"y": 2}}));
//! let next = set_at(&tree, path!("a", "x").segments(), Value::from(5));
//!
//! assert_eq!(tree.at(&path!("a", "x")), Some(&Value::from(1)));
//! assert!(next.at(&path!("b")).unwrap().same(tree.at(&path!("b")).unwrap()));
//! ```

mod action;
mod clone;
mod command;
mod config;
mod error;
mod path;
mod reducer;
mod resolve;
mod shape;
mod store;
mod update;
mod value;
mod watch;

// Tree primitives
pub use clone::deep_clone;
pub use path::{Path, Seg};
pub use resolve::{child, read};
pub use update::{remove, remove_at, set_at, swap, update_at};
pub use value::{Map, Pattern, Token, Value, ValueSet};

// Transitions
pub use action::{Action, ActionKind, UpdateFn};
pub use command::{Command, Number, Transform};
pub use reducer::{reduce, reset};

// Store
pub use config::{PreserveConfig, StoreConfig, CONSOLE_BRANCHES, CONSOLE_PRESERVED_KEYS};
pub use error::{StoreError, StoreResult};
pub use shape::Shape;
pub use store::Store;
pub use watch::{Subscription, Watch};
