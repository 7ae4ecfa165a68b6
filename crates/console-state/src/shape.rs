//! Declared tree shapes for validating paths.
//!
//! Paths are untyped key lists, so a typo silently reads `None` or writes a
//! new branch. A [`Shape`] describes which paths are meaningful and lets
//! callers catch such paths before (or while) dispatching.

use crate::config::CONSOLE_BRANCHES;
use crate::{Path, StoreError, StoreResult};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Anything below this point is accepted.
    Any,
    /// A value that paths may not descend into.
    Leaf,
    /// An object with a fixed set of fields.
    Object(IndexMap<String, Shape>),
    /// An object keyed by arbitrary names (ids), all sharing one shape.
    Map(Box<Shape>),
    /// An array whose elements share one shape.
    List(Box<Shape>),
}

impl Shape {
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Shape)>) -> Self {
        Shape::Object(fields.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    pub fn map(values: Shape) -> Self {
        Shape::Map(Box::new(values))
    }

    pub fn list(items: Shape) -> Self {
        Shape::List(Box::new(items))
    }

    /// The console's top-level layout.
    ///
    /// Every branch is an object with free-form fields, except
    /// `notifications`, whose single field is a list.
    pub fn console() -> Self {
        Shape::object(CONSOLE_BRANCHES.iter().map(|branch| {
            let shape = match *branch {
                "notifications" => Shape::object([("notifications", Shape::list(Shape::Any))]),
                _ => Shape::map(Shape::Any),
            };
            (*branch, shape)
        }))
    }

    /// Check that `path` is meaningful for this shape.
    ///
    /// The error carries the path up to the first offending segment.
    pub fn validate(&self, path: &Path) -> StoreResult<()> {
        let segments = path.segments();
        let mut shape = self;
        for (depth, seg) in segments.iter().enumerate() {
            let at = || Path::from(&segments[..=depth]);
            shape = match shape {
                Shape::Any => return Ok(()),
                Shape::Leaf => return Err(StoreError::below_leaf(at())),
                // Index segments name the field spelled by their decimal form.
                Shape::Object(fields) => {
                    let key = seg.as_object_key();
                    fields
                        .get(&*key)
                        .ok_or_else(|| StoreError::unknown_field(at(), &*key))?
                }
                Shape::Map(values) => values.as_ref(),
                Shape::List(items) => match seg.as_array_index() {
                    Some(_) => items.as_ref(),
                    None => return Err(StoreError::type_mismatch(at(), "index", "key")),
                },
            };
        }
        Ok(())
    }
}
