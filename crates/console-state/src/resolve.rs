//! Pure reads at a key path.

use crate::{Seg, Value};

/// Look up one segment below `node`.
///
/// Arrays accept in-bounds positions (index segments, or key segments that
/// are canonical decimal integers). Objects accept own fields only; an index
/// segment names the field spelled by its decimal form. Leaves have no
/// children.
pub fn child<'a>(node: &'a Value, seg: &Seg) -> Option<&'a Value> {
    match node {
        Value::Array(items) => seg.as_array_index().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(&*seg.as_object_key()),
        _ => None,
    }
}

/// Follow `path` from `node`.
///
/// Returns `None` as soon as a segment is missing or a leaf is reached
/// before the path ends. An empty path resolves to `node` itself.
///
/// ```
/// use console_state::{read, path, Value};
/// use serde_json::json;
///
/// let tree = Value::from(json!({"clusters": {"list": [{"name": "demo"}]}}));
/// let name = read(&tree, path!("clusters", "list", 0, "name").segments());
/// assert_eq!(name, Some(&Value::from("demo")));
/// assert_eq!(read(&tree, path!("clusters", "missing", "x").segments()), None);
/// ```
pub fn read<'a>(node: &'a Value, path: &[Seg]) -> Option<&'a Value> {
    match path {
        [] => Some(node),
        [seg] => child(node, seg),
        [seg, rest @ ..] => read(child(node, seg)?, rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    fn tree() -> Value {
        Value::from(json!({
            "app": {"selectedRegion": "us-east-1"},
            "clusters": {"list": ["a", "b", "c"]},
            "counts": {"0": "zero"},
            "flag": null
        }))
    }

    #[test]
    fn reads_nested_values() {
        let tree = tree();
        assert_eq!(
            read(&tree, path!("app", "selectedRegion").segments()),
            Some(&Value::from("us-east-1"))
        );
        assert_eq!(
            read(&tree, path!("clusters", "list", 2).segments()),
            Some(&Value::from("c"))
        );
    }

    #[test]
    fn missing_keys_resolve_to_none() {
        let tree = tree();
        assert_eq!(read(&tree, path!("nope").segments()), None);
        assert_eq!(read(&tree, path!("nope", "deeper", "still").segments()), None);
        assert_eq!(read(&tree, path!("app", "selectedRegion", "x").segments()), None);
    }

    #[test]
    fn array_bounds_and_keys() {
        let tree = tree();
        assert_eq!(read(&tree, path!("clusters", "list", 3).segments()), None);
        assert_eq!(read(&tree, path!("clusters", "list", "length").segments()), None);
        assert_eq!(
            read(&tree, path!("clusters", "list", "1").segments()),
            Some(&Value::from("b"))
        );
    }

    #[test]
    fn index_segment_on_object_uses_decimal_key() {
        let tree = tree();
        assert_eq!(
            read(&tree, path!("counts", 0).segments()),
            Some(&Value::from("zero"))
        );
    }

    #[test]
    fn explicit_null_is_present() {
        let tree = tree();
        assert_eq!(read(&tree, path!("flag").segments()), Some(&Value::Null));
        assert_eq!(read(&tree, path!("flag", "x").segments()), None);
    }

    #[test]
    fn empty_path_and_empty_tree() {
        let tree = tree();
        assert!(read(&tree, &[]).unwrap().same(&tree));
        assert_eq!(read(&Value::Null, path!("a", "b").segments()), None);
        assert_eq!(read(&Value::object(), path!("a").segments()), None);
    }
}
