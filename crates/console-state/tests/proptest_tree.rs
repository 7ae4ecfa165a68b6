use console_state::{child, deep_clone, read, remove_at, set_at, Path, Seg, Value};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::array),
            prop::collection::vec(("[a-d]", inner), 0..6)
                .prop_map(|fields| fields.into_iter().collect::<Value>()),
        ]
    })
}

fn path() -> impl Strategy<Value = Path> {
    prop::collection::vec(
        prop_oneof![
            "[a-d]".prop_map(Seg::key),
            (0_usize..6).prop_map(Seg::index),
        ],
        1..5,
    )
    .prop_map(Path::from)
}

/// Where a write along `path` ends up.
#[derive(Debug, PartialEq)]
enum Landing {
    /// Readable back at `path`.
    Exact,
    /// An index past the end of an array; the write lands at its `len`.
    Appended,
    /// A key segment met an array; nothing changes.
    Ignored,
}

fn landing(root: &Value, path: &[Seg]) -> Landing {
    let mut node = Some(root);
    for seg in path {
        let Some(current) = node else {
            return Landing::Exact;
        };
        if let Some(items) = current.as_array() {
            match seg.as_array_index() {
                None => return Landing::Ignored,
                Some(i) if i > items.len() => return Landing::Appended,
                Some(_) => {}
            }
        }
        node = child(current, seg);
    }
    Landing::Exact
}

/// Any container that is not on the spine of `path` in `after` is the same
/// allocation it was in `before`.
fn assert_siblings_shared(before: &Value, after: &Value, path: &[Seg]) {
    let [head, rest @ ..] = path else {
        return;
    };
    let (Some(old), Some(new)) = (before.as_object(), after.as_object()) else {
        return;
    };
    let key = head.as_object_key();
    for (k, v) in old {
        if *k != *key {
            assert!(v.same(&new[k]), "sibling {k} was reallocated");
        }
    }
    if let (Some(b), Some(a)) = (old.get(&*key), new.get(&*key)) {
        assert_siblings_shared(b, a, rest);
    }
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn set_then_read_round_trips(root in tree(), path in path(), value in leaf()) {
        let next = set_at(&root, path.segments(), value.clone());
        match landing(&root, path.segments()) {
            Landing::Exact => {
                prop_assert_eq!(read(&next, path.segments()), Some(&value));
            }
            Landing::Appended => {
                prop_assert_ne!(next, root);
            }
            Landing::Ignored => {
                prop_assert_eq!(next, root);
            }
        }
    }

    #[test]
    fn set_never_mutates_input(root in tree(), path in path(), value in leaf()) {
        let snapshot = deep_clone(&root);
        let _ = set_at(&root, path.segments(), value);
        let _ = remove_at(&root, path.segments());
        prop_assert_eq!(root, snapshot);
    }

    #[test]
    fn set_shares_every_sibling(root in tree(), path in path(), value in leaf()) {
        let next = set_at(&root, path.segments(), value);
        assert_siblings_shared(&root, &next, path.segments());
    }

    #[test]
    fn deep_clone_is_equal_and_unshared(root in tree()) {
        let cloned = deep_clone(&root);
        prop_assert_eq!(&cloned, &root);
        if root.is_container() {
            prop_assert!(!cloned.same(&root));
        }
    }

    #[test]
    fn json_conversion_round_trips(root in tree()) {
        let json = root.to_json();
        prop_assert_eq!(&serde_json::to_value(&root).unwrap(), &json);
        prop_assert_eq!(Value::from(json), root);
    }
}
