//! The store handle: a state tree, its reducer and its observers.
//!
//! All mutations go through [`Store::dispatch`], which applies one action at
//! a time under a lock. Concurrent callers (typically network completions)
//! are served last-writer-wins in lock order; the store neither coalesces
//! nor sequences them. Callers that need ordering between, say, a poll and
//! an explicit refresh of the same path must serialize upstream.

use crate::reducer::reduce;
use crate::watch::{Observers, Subscription, Watch};
use crate::{Action, Path, Shape, StoreConfig, StoreResult, Value};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering from poisoning.
///
/// The guarded values are only ever replaced by a single assignment, so a
/// panic while the lock was held cannot leave them half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    config: StoreConfig,
    shape: Option<Shape>,
    tree: Mutex<Value>,
    observers: Arc<Mutex<Observers>>,
}

/// Shared handle to a state tree.
///
/// Cloning the handle shares the tree.
///
/// # Re-entrancy
///
/// Update functions run while the tree is locked and must not call back
/// into the same store. Callbacks registered with [`Store::subscribe`] may
/// read from the store but must not dispatch or drop subscriptions.
///
/// # Example
///
/// ```
/// use console_state::{path, Store, Value};
///
/// let store = Store::default();
/// store.store(path!("app", "selectedRegion"), "us-east-1");
/// store.update(path!("clusters", "count"), |n| Value::from(n.as_i64().unwrap_or(0) + 1));
///
/// assert_eq!(store.read(&path!("app", "selectedRegion")), Some(Value::from("us-east-1")));
/// assert_eq!(store.read(&path!("clusters", "count")), Some(Value::from(1)));
///
/// store.clear_all();
/// assert_eq!(store.read(&path!("app", "selectedRegion")), Some(Value::from("us-east-1")));
/// assert_eq!(store.read(&path!("clusters", "count")), None);
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Create a store holding `config`'s initial tree.
    pub fn new(config: StoreConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a store that checks mutation paths against `shape`.
    ///
    /// Paths that do not fit are still applied and logged at `warn`.
    pub fn with_shape(config: StoreConfig, shape: Shape) -> Self {
        Self::build(config, Some(shape))
    }

    fn build(config: StoreConfig, shape: Option<Shape>) -> Self {
        let tree = config.initial_tree();
        Self {
            inner: Arc::new(Inner {
                config,
                shape,
                tree: Mutex::new(tree),
                observers: Arc::new(Mutex::new(Observers::default())),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The current root. Cheap: containers are shared, not copied.
    pub fn snapshot(&self) -> Value {
        lock(&self.inner.tree).clone()
    }

    /// The value at `path`, or `None` if it does not resolve.
    pub fn read(&self, path: &Path) -> Option<Value> {
        lock(&self.inner.tree).at(path).cloned()
    }

    /// Decode the value at `path` into `T`.
    pub fn read_as<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<Option<T>> {
        match self.read(path) {
            Some(value) => Ok(Some(serde_json::from_value(value.to_json())?)),
            None => Ok(None),
        }
    }

    /// Validate `path` against the declared shape, if any.
    pub fn check(&self, path: &Path) -> StoreResult<()> {
        match &self.inner.shape {
            Some(shape) => shape.validate(path),
            None => Ok(()),
        }
    }

    /// Observe the subtree at `path`.
    pub fn watch(&self, path: Path) -> Watch {
        let mut observers = lock(&self.inner.observers);
        let tree = self.snapshot();
        observers.watch(path, &tree)
    }

    /// Call `callback` with the subtree at `path` every time its identity
    /// changes. The callback runs synchronously inside `dispatch`.
    pub fn subscribe<F>(&self, path: Path, callback: F) -> Subscription
    where
        F: FnMut(&Value) + Send + 'static,
    {
        let mut observers = lock(&self.inner.observers);
        let tree = self.snapshot();
        let id = observers.subscribe(path, &tree, Box::new(callback));
        Subscription::new(id, Arc::downgrade(&self.inner.observers))
    }

    /// Number of live watch slots and callback subscriptions.
    pub fn observer_count(&self) -> usize {
        lock(&self.inner.observers).len()
    }

    pub fn store(&self, path: Path, value: impl Into<Value>) {
        self.dispatch(Action::store(path, value));
    }

    pub fn update<F>(&self, path: Path, update: F)
    where
        F: FnOnce(Value) -> Value + Send + 'static,
    {
        self.dispatch(Action::update(path, update));
    }

    /// Remove the value at `path`.
    ///
    /// Clearing an array element shifts every later element down one index,
    /// so positions are not stable identities across a clear. Prefer objects
    /// keyed by id for collections that lose members.
    pub fn clear(&self, path: Path) {
        self.dispatch(Action::clear(path));
    }

    pub fn clear_all(&self) {
        self.dispatch(Action::ClearAll);
    }

    /// Clear up to `depth` ancestors of `path` that have become empty.
    ///
    /// Walks upwards from the parent of `path` and stops at the first
    /// ancestor that is missing or non-empty. The root is never cleared.
    pub fn clear_empty_nest(&self, path: &Path, depth: usize) {
        let mut current = path.clone();
        for _ in 0..depth {
            let Some(parent) = current.parent() else {
                break;
            };
            if parent.is_empty() {
                break;
            }
            let empty = self
                .read(&parent)
                .is_some_and(|value| value.is_empty_container());
            if !empty {
                break;
            }
            self.clear(parent.clone());
            current = parent;
        }
    }

    /// Apply one action and notify observers.
    ///
    /// Never fails. Actions with an empty path are ignored.
    pub fn dispatch(&self, action: Action) {
        let kind = action.kind();
        let target = action.path().cloned().unwrap_or_default();
        if action.path().is_some() {
            if target.is_empty() {
                tracing::warn!(kind = %kind, "ignoring action with empty path");
                return;
            }
            if let Err(err) = self.check(&target) {
                tracing::warn!(kind = %kind, error = %err, "path does not match declared shape");
            }
        }

        {
            let mut tree = lock(&self.inner.tree);
            let next = reduce(&tree, action, &self.inner.config);
            *tree = next;
        }
        tracing::debug!(kind = %kind, path = %target, "applied action");

        let mut observers = lock(&self.inner.observers);
        let tree = self.snapshot();
        observers.notify(&tree);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shape", &self.inner.shape.is_some())
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn starts_from_initial_tree() {
        let store = Store::default();
        assert_eq!(store.read(&path!("clusters")), Some(Value::object()));
        assert_eq!(store.read(&path!("clusters", "index")), None);
    }

    #[test]
    fn clones_share_the_tree() {
        let store = Store::default();
        let other = store.clone();
        store.store(path!("app", "section"), "users");
        assert_eq!(other.read(&path!("app", "section")), Some(Value::from("users")));
    }

    #[test]
    fn empty_path_is_ignored() {
        let store = Store::default();
        let before = store.snapshot();
        store.store(Path::root(), 1);
        store.clear(Path::root());
        assert!(store.snapshot().same(&before));
    }

    #[test]
    fn store_past_end_of_array_appends() {
        let store = Store::new(StoreConfig {
            initial: json!({"x": ["a"]}),
            ..StoreConfig::default()
        });
        store.store(path!("x", usize::MAX), "z");
        assert_eq!(store.read(&path!("x")), Some(Value::from(json!(["a", "z"]))));
    }

    #[test]
    fn parsed_path_reaches_zero_padded_key() {
        let store = Store::new(StoreConfig {
            initial: json!({"users": {"007": "bond", "7": "other"}}),
            ..StoreConfig::default()
        });
        assert_eq!(store.read(&Path::parse("users.007")), Some(Value::from("bond")));
        assert_eq!(store.read(&Path::parse("users.7")), Some(Value::from("other")));
    }

    #[test]
    fn clear_empty_nest_walks_up() {
        let store = Store::new(StoreConfig {
            initial: json!({"clusters": {"index": {"demo": {"nodes": {"n1": 1}}}, "keep": 1}}),
            ..StoreConfig::default()
        });
        store.clear(path!("clusters", "index", "demo", "nodes", "n1"));
        store.clear_empty_nest(&path!("clusters", "index", "demo", "nodes", "n1"), 5);
        assert_eq!(
            store.read(&path!("clusters")),
            Some(Value::from(json!({"keep": 1})))
        );
    }

    #[test]
    fn clear_empty_nest_respects_depth() {
        let store = Store::new(StoreConfig {
            initial: json!({"a": {"b": {"c": {}}}}),
            ..StoreConfig::default()
        });
        store.clear_empty_nest(&path!("a", "b", "c", "d"), 1);
        assert_eq!(store.read(&path!("a", "b")), Some(Value::object()));
    }

    #[test]
    fn read_as_decodes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Cluster {
            name: String,
            size: u32,
        }

        let store = Store::default();
        store.store(
            path!("clusters", "index", "demo"),
            Value::from(json!({"name": "demo", "size": 3})),
        );
        let cluster: Option<Cluster> = store.read_as(&path!("clusters", "index", "demo")).unwrap();
        assert_eq!(
            cluster,
            Some(Cluster {
                name: "demo".into(),
                size: 3
            })
        );
        assert!(store
            .read_as::<Cluster>(&path!("clusters", "index", "missing"))
            .unwrap()
            .is_none());
        assert!(store.read_as::<u32>(&path!("clusters", "index", "demo")).is_err());
    }

    #[test]
    fn shape_violations_still_apply() {
        let store = Store::with_shape(StoreConfig::default(), Shape::console());
        assert!(store.check(&path!("clustres", "x")).is_err());
        store.store(path!("clustres", "x"), 1);
        assert_eq!(store.read(&path!("clustres", "x")), Some(Value::from(1)));
    }
}
