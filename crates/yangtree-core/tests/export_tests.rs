#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{indexed_tree, plain_tree};
use serde_json::json;
use yangtree_core::{ExportValue, KeyArg};

#[test]
fn test_filtered_export_of_untouched_tree_is_empty() {
    let tree = plain_tree();
    assert_eq!(tree.get(tree.root(), true).unwrap(), ExportValue::Empty);
    assert!(tree.to_json(true).unwrap().is_null());
}

#[test]
fn test_unfiltered_export_uses_defaults() {
    let mut tree = plain_tree();
    let interfaces = tree.child(tree.root(), "interfaces").unwrap();
    let entry = tree.list(interfaces, "interface").unwrap().add("eth0").unwrap();

    let exported = tree.get(entry.node, false).unwrap();
    assert_eq!(exported.get("enabled").unwrap().to_json().unwrap(), json!(true));
    assert_eq!(exported.get("mtu"), Some(&ExportValue::Empty));
    assert_eq!(exported.get("tags").unwrap().to_json().unwrap(), json!([]));

    let filtered = tree.get(entry.node, true).unwrap();
    assert!(filtered.get("enabled").is_none());
}

#[test]
fn test_filtered_export_keeps_changed_paths() {
    let mut tree = indexed_tree();
    let root = tree.root();
    tree.set_leaf(root, "hostname", "edge1").unwrap();
    tree.set_leaf(root, "ratio", "0.5").unwrap();
    let interfaces = tree.child(root, "interfaces").unwrap();
    let entry = tree.list(interfaces, "interface").unwrap().add("eth0").unwrap();
    tree.set_leaf(entry.node, "admin-status", "up").unwrap();
    let routing = tree.child(root, "routing").unwrap();
    tree.set_leaf(routing, "asn", 64512).unwrap();

    let json = tree.to_json(true).unwrap();
    assert_eq!(
        json,
        json!({
            "hostname": "edge1",
            "ratio": "0.50",
            "interfaces": {
                "interface": {
                    "eth0": {"name": "eth0", "admin-status": "up"}
                }
            },
            "routing": {"asn": 64512}
        })
    );
}

#[test]
fn test_mapping_preserves_declaration_order() {
    let mut tree = plain_tree();
    let root = tree.root();
    tree.set_leaf(root, "ratio", 1).unwrap();
    tree.set_leaf(root, "hostname", "edge1").unwrap();

    match tree.get(root, true).unwrap() {
        ExportValue::Mapping(entries) => {
            let names: Vec<&str> = entries.keys().map(String::as_str).collect();
            assert_eq!(names, vec!["hostname", "ratio"]);
        }
        other => panic!("expected a mapping, got {:?}", other),
    }
}

#[test]
fn test_active_presence_container_exports_without_content() {
    let mut tree = plain_tree();
    let root = tree.root();
    let logging = tree.child(root, "logging").unwrap();
    tree.set_present(logging, true).unwrap();

    assert_eq!(tree.to_json(true).unwrap(), json!({"logging": {}}));
}

#[test]
fn test_keyless_entries_export_under_generated_keys() {
    let mut tree = plain_tree();
    let root = tree.root();
    let entry = tree.list(root, "events").unwrap().add(KeyArg::Generated).unwrap();
    tree.set_leaf(entry.node, "message", "boot").unwrap();

    let json = tree.to_json(true).unwrap();
    assert_eq!(json["events"][entry.key.as_str()], json!({"message": "boot"}));
}

#[test]
fn test_export_reads_bound_references() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let entry = tree.list(root, "a").unwrap().add("x").unwrap();

    let exported = tree.get(entry.node, true).unwrap().to_json().unwrap();
    assert_eq!(exported, json!({"foo": "x", "config": {"foo": "x"}}));
}
