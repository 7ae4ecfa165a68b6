//! Store configuration: the initial tree and the reset allow-list.

use crate::{StoreError, StoreResult, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path as FsPath;

/// Top-level branches of the console's state tree.
pub const CONSOLE_BRANCHES: &[&str] = &[
    "clusters",
    "customImages",
    "notifications",
    "officialImages",
    "wizard",
    "app",
    "users",
    "identity",
    "aws",
];

/// Fields of `app` that survive `clear_all`.
pub const CONSOLE_PRESERVED_KEYS: &[&str] = &["selectedRegion", "sidebar", "section"];

/// Configuration for a [`Store`](crate::Store).
///
/// Loaded from JSON; every field is optional and defaults to the console
/// layout.
///
/// ```json
/// {
///   "initial": {"app": {}, "clusters": {}},
///   "preserve": {"branch": "app", "keys": ["selectedRegion"]}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Tree the store starts from and is rebuilt from on `clear_all`.
    pub initial: serde_json::Value,
    pub preserve: PreserveConfig,
}

/// The allow-list applied by `clear_all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreserveConfig {
    /// Top-level branch holding the preserved fields.
    pub branch: String,
    /// Fields of `branch` copied from the old tree into the reset tree.
    pub keys: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let mut initial = serde_json::Map::new();
        for branch in CONSOLE_BRANCHES {
            initial.insert((*branch).to_owned(), json!({}));
        }
        initial.insert("notifications".to_owned(), json!({"notifications": []}));
        Self {
            initial: serde_json::Value::Object(initial),
            preserve: PreserveConfig::default(),
        }
    }
}

impl Default for PreserveConfig {
    fn default() -> Self {
        Self {
            branch: "app".to_owned(),
            keys: CONSOLE_PRESERVED_KEYS
                .iter()
                .map(|k| (*k).to_owned())
                .collect(),
        }
    }
}

impl StoreConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<FsPath>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if !self.initial.is_object() {
            return Err(StoreError::invalid_config("`initial` must be an object"));
        }
        if self.preserve.branch.is_empty() {
            return Err(StoreError::invalid_config("`preserve.branch` must not be empty"));
        }
        Ok(())
    }

    /// A freshly allocated initial tree.
    pub fn initial_tree(&self) -> Value {
        Value::from(self.initial.clone())
    }
}
