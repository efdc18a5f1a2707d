#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{indexed_tree, plain_tree};
use yangtree_core::types::ScalarValue;
use yangtree_core::{Resolution, YangError};

#[test]
fn test_list_key_leafref_writes_through() {
    let mut tree = indexed_tree();
    let root = tree.root();

    let entry = tree.list(root, "a").unwrap().add("x").unwrap();
    let config = tree.child(entry.node, "config").unwrap();

    assert_eq!(tree.get_leaf(config, "foo").unwrap(), Some(ScalarValue::from("x")));
    assert_eq!(tree.get_leaf(entry.node, "foo").unwrap(), Some(ScalarValue::from("x")));
    let reference = tree.leaf_reference(entry.node, "foo").unwrap().unwrap();
    assert!(reference.is_bound());
    assert_eq!(reference.caller(), "/a[foo='x']/foo");

    // reads follow the target
    tree.set_leaf(config, "foo", "y").unwrap();
    assert_eq!(tree.get_leaf(entry.node, "foo").unwrap(), Some(ScalarValue::from("y")));
}

#[test]
fn test_reloaded_key_leafref_follows_moved_entry() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let entry = tree.list(root, "a").unwrap().add("x").unwrap();

    tree.load_leaf(entry.node, "foo", "y").unwrap();

    let config = tree.child(entry.node, "config").unwrap();
    assert_eq!(tree.get_leaf(config, "foo").unwrap(), Some(ScalarValue::from("y")));
    assert_eq!(tree.get_leaf(entry.node, "foo").unwrap(), Some(ScalarValue::from("y")));
    let reference = tree.leaf_reference(entry.node, "foo").unwrap().unwrap();
    assert_eq!(reference.caller(), "/a[foo='y']/foo");
    assert_eq!(tree.find("/a[foo='y']/config/foo").len(), 1);
}

#[test]
fn test_appended_item_binds_its_key() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let item = tree.list(root, "a").unwrap().new_item().unwrap();
    tree.set_leaf(item, "foo", "z").unwrap();
    let item_config = tree.child(item, "config").unwrap();
    tree.set_leaf(item_config, "bar", "b").unwrap();

    // a detached entry does not bind to attached siblings
    assert!(!tree.leaf_reference(item, "foo").unwrap().unwrap().is_bound());

    let entry = tree.list(root, "a").unwrap().append(item).unwrap();
    let config = tree.child(entry.node, "config").unwrap();

    assert_eq!(entry.key, "z");
    assert_eq!(tree.get_leaf(config, "foo").unwrap(), Some(ScalarValue::from("z")));
    assert_eq!(tree.get_leaf(config, "bar").unwrap(), Some(ScalarValue::from("b")));
    assert!(tree.leaf_reference(entry.node, "foo").unwrap().unwrap().is_bound());
}

#[test]
fn test_require_instance_rejects_dangling_value() {
    let mut tree = indexed_tree();
    let root = tree.root();

    let result = tree.set_leaf(root, "primary", "eth0");
    assert!(matches!(result, Err(YangError::DanglingReference { .. })));
    assert_eq!(tree.get_leaf(root, "primary").unwrap(), None);
}

#[test]
fn test_require_instance_snapshots_matching_key() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let interfaces = tree.child(root, "interfaces").unwrap();
    let mut list = tree.list(interfaces, "interface").unwrap();
    list.add("eth0").unwrap();
    let eth1 = list.add("eth1").unwrap();

    tree.set_leaf(root, "primary", "eth1").unwrap();

    assert_eq!(tree.get_leaf(root, "primary").unwrap(), Some(ScalarValue::from("eth1")));
    let reference = tree.leaf_reference(root, "primary").unwrap().unwrap();
    let name = tree.child(eth1.node, "name").unwrap();
    assert_eq!(
        reference.resolution(),
        &Resolution::Snapshot {
            value: Some(ScalarValue::from("eth1")),
            target: Some(name),
        }
    );
    assert!(matches!(
        tree.set_leaf(root, "primary", "eth9"),
        Err(YangError::DanglingReference { .. })
    ));
}

#[test]
fn test_single_key_match_is_not_bound() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let interfaces = tree.child(root, "interfaces").unwrap();
    tree.list(interfaces, "interface").unwrap().add("eth0").unwrap();

    tree.set_leaf(root, "primary", "eth0").unwrap();
    assert!(!tree.leaf_reference(root, "primary").unwrap().unwrap().is_bound());
}

#[test]
fn test_optional_reference_binds_single_leaf() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let interfaces = tree.child(root, "interfaces").unwrap();

    // nothing to point at yet
    tree.set_leaf(root, "loose", "free text").unwrap();
    assert!(!tree.leaf_reference(root, "loose").unwrap().unwrap().is_bound());

    let entry = tree.list(interfaces, "interface").unwrap().add("eth0").unwrap();
    tree.set_leaf(root, "loose", "uplink").unwrap();
    assert!(tree.leaf_reference(root, "loose").unwrap().unwrap().is_bound());
    assert_eq!(
        tree.get_leaf(entry.node, "description").unwrap(),
        Some(ScalarValue::from("uplink"))
    );

    tree.list(interfaces, "interface").unwrap().delete("eth0").unwrap();
    let result = tree.get_leaf(root, "loose");
    assert!(matches!(result, Err(YangError::InvalidPointer { matches: 0, .. })));
}

#[test]
fn test_bind_without_value() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let interfaces = tree.child(root, "interfaces").unwrap();
    let entry = tree.list(interfaces, "interface").unwrap().add("eth0").unwrap();
    tree.set_leaf(entry.node, "description", "core").unwrap();

    tree.bind_leaf(root, "loose").unwrap();
    assert_eq!(tree.get_leaf(root, "loose").unwrap(), Some(ScalarValue::from("core")));

    assert!(matches!(
        tree.bind_leaf(root, "hostname"),
        Err(YangError::WrongNodeKind { .. })
    ));
}

#[test]
fn test_tree_without_index_keeps_snapshots() {
    let mut tree = plain_tree();
    let root = tree.root();
    tree.set_leaf(root, "primary", "anything").unwrap();

    let reference = tree.leaf_reference(root, "primary").unwrap().unwrap();
    assert!(!reference.is_bound());
    assert!(reference.require_instance());
    assert_eq!(reference.referenced_path(), "/interfaces/interface/name");
    assert_eq!(
        tree.get_leaf(root, "primary").unwrap(),
        Some(ScalarValue::from("anything"))
    );
}

#[test]
fn test_references_compare_by_path() {
    let mut tree = plain_tree();
    let root = tree.root();
    tree.set_leaf(root, "primary", "a").unwrap();
    let first = tree.leaf_reference(root, "primary").unwrap().unwrap();
    tree.set_leaf(root, "primary", "b").unwrap();
    let second = tree.leaf_reference(root, "primary").unwrap().unwrap();
    let loose = {
        tree.set_leaf(root, "loose", "a").unwrap();
        tree.leaf_reference(root, "loose").unwrap().unwrap()
    };

    assert_eq!(first, second);
    assert_ne!(first, loose);
}
