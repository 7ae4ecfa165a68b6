//! Path-keyed observers with reference-equality change detection.
//!
//! After every action the store resolves each observed path once against the
//! new root and publishes only if the subtree found there is not
//! [`same`](crate::Value::same) as the one published before. Because writes
//! share untouched subtrees, observers of unrelated branches stay asleep.

use crate::resolve::read;
use crate::store::lock;
use crate::{Path, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, Weak};
use tokio::sync::watch;

type Callback = Box<dyn FnMut(&Value) + Send>;

struct CallbackEntry {
    id: u64,
    path: Path,
    last: Value,
    callback: Callback,
}

/// Observer registry owned by a store.
#[derive(Default)]
pub(crate) struct Observers {
    /// One channel per distinct path, shared by every [`Watch`] on it.
    slots: BTreeMap<Path, watch::Sender<Value>>,
    callbacks: Vec<CallbackEntry>,
    next_id: u64,
}

fn resolve(tree: &Value, path: &Path) -> Value {
    read(tree, path.segments()).cloned().unwrap_or(Value::Null)
}

impl Observers {
    pub(crate) fn watch(&mut self, path: Path, tree: &Value) -> Watch {
        let rx = match self.slots.get(&path) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(resolve(tree, &path));
                self.slots.insert(path.clone(), tx);
                rx
            }
        };
        Watch { path, rx }
    }

    pub(crate) fn subscribe(&mut self, path: Path, tree: &Value, callback: Callback) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let last = resolve(tree, &path);
        self.callbacks.push(CallbackEntry {
            id,
            path,
            last,
            callback,
        });
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: u64) {
        self.callbacks.retain(|entry| entry.id != id);
    }

    /// Publish changed subtrees and drop channels nobody listens to.
    pub(crate) fn notify(&mut self, tree: &Value) {
        self.slots.retain(|path, tx| {
            if tx.receiver_count() == 0 {
                tracing::trace!(path = %path, "dropping unobserved watch slot");
                return false;
            }
            let current = resolve(tree, path);
            tx.send_if_modified(|seen| {
                if seen.same(&current) {
                    false
                } else {
                    *seen = current;
                    true
                }
            });
            true
        });

        for entry in &mut self.callbacks {
            let current = resolve(tree, &entry.path);
            if !entry.last.same(&current) {
                entry.last = current;
                (entry.callback)(&entry.last);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() + self.callbacks.len()
    }
}

/// Reactive view of one path.
///
/// Holds the subtree published most recently for its path (`Null` when the
/// path does not resolve). Obtained from [`Store::watch`](crate::Store::watch).
#[derive(Debug, Clone)]
pub struct Watch {
    path: Path,
    rx: watch::Receiver<Value>,
}

impl Watch {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current subtree.
    pub fn get(&self) -> Value {
        self.rx.borrow().clone()
    }

    /// True when a new subtree was published since it was last marked seen.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Mark the current subtree as seen and return it.
    pub fn mark_seen(&mut self) -> Value {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next change of the subtree.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Value> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Registration of a callback observer. Dropping it unregisters the callback.
///
/// Must not be dropped from inside a callback of the same store.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    id: u64,
    observers: Weak<Mutex<Observers>>,
}

impl Subscription {
    pub(crate) fn new(id: u64, observers: Weak<Mutex<Observers>>) -> Self {
        Self { id, observers }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            lock(&observers).unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use crate::update::set_at;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn watches_on_one_path_share_a_slot() {
        let tree = Value::from(json!({"a": 1}));
        let mut observers = Observers::default();
        let _w1 = observers.watch(path!("a"), &tree);
        let _w2 = observers.watch(path!("a"), &tree);
        let _w3 = observers.watch(path!("b"), &tree);
        assert_eq!(observers.len(), 2);
    }

    #[test]
    fn publishes_only_on_identity_change() {
        let tree = Value::from(json!({"a": {"x": 1}, "b": {"y": 2}}));
        let mut observers = Observers::default();
        let mut watch_a = observers.watch(path!("a"), &tree);
        let watch_b = observers.watch(path!("b"), &tree);

        let next = set_at(&tree, path!("a", "x").segments(), Value::from(5));
        observers.notify(&next);

        assert!(watch_a.has_changed());
        assert!(!watch_b.has_changed());
        assert_eq!(watch_a.mark_seen(), Value::from(json!({"x": 5})));
        assert!(!watch_a.has_changed());
    }

    #[test]
    fn unobserved_slots_are_pruned() {
        let tree = Value::object();
        let mut observers = Observers::default();
        drop(observers.watch(path!("a"), &tree));
        assert_eq!(observers.len(), 1);
        observers.notify(&tree);
        assert_eq!(observers.len(), 0);
    }

    #[test]
    fn callbacks_fire_on_change_only() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&hits);
        let tree = Value::from(json!({"a": 1, "b": 1}));
        let mut observers = Observers::default();
        let id = observers.subscribe(
            path!("a"),
            &tree,
            Box::new(move |value| sink.lock().unwrap().push(value.clone())),
        );

        observers.notify(&set_at(&tree, path!("b").segments(), Value::from(2)));
        observers.notify(&set_at(&tree, path!("a").segments(), Value::from(3)));
        assert_eq!(*hits.lock().unwrap(), vec![Value::from(3)]);

        observers.unsubscribe(id);
        assert_eq!(observers.len(), 0);
    }
}
