#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{indexed_tree, plain_tree};
use yangtree_core::types::ScalarValue;
use yangtree_core::YangError;

#[test]
fn test_unique_sequence_skips_duplicates() {
    let mut tree = plain_tree();
    let root = tree.root();
    let mut servers = tree.leaf_list(root, "dns-servers").unwrap();

    assert!(servers.append("8.8.8.8").unwrap());
    assert!(!servers.append("8.8.8.8").unwrap());
    assert_eq!(servers.len(), 1);

    let result = servers.insert(0, "8.8.8.8");
    assert!(matches!(result, Err(YangError::DuplicateMember { .. })));
}

#[test]
fn test_rejected_value_reports_candidates() {
    let mut tree = plain_tree();
    let root = tree.root();
    let result = tree.leaf_list(root, "dns-servers").unwrap().append("not-an-address");
    match result {
        Err(YangError::InvalidMember { accepted, .. }) => assert_eq!(accepted, vec!["ipv4"]),
        other => panic!("expected InvalidMember, got {:?}", other),
    }
    assert!(!tree.is_changed(root).unwrap());
}

#[test]
fn test_union_members_use_first_fit() {
    let mut tree = plain_tree();
    let root = tree.root();
    let mut mixed = tree.leaf_list(root, "mixed").unwrap();

    mixed.append(7).unwrap();
    mixed.append("7").unwrap();
    mixed.append("seven").unwrap();
    mixed.append("700").unwrap();

    assert_eq!(
        mixed.values().unwrap(),
        vec![
            ScalarValue::Integer(7),
            ScalarValue::Integer(7),
            ScalarValue::from("seven"),
            ScalarValue::from("700"),
        ]
    );
}

#[test]
fn test_insert_clamps_index() {
    let mut tree = plain_tree();
    let root = tree.root();
    let mut mixed = tree.leaf_list(root, "mixed").unwrap();
    mixed.append("b").unwrap();
    mixed.insert(0, "a").unwrap();
    mixed.insert(99, "c").unwrap();
    assert_eq!(
        mixed.values().unwrap(),
        vec![ScalarValue::from("a"), ScalarValue::from("b"), ScalarValue::from("c")]
    );
}

#[test]
fn test_extend_is_all_or_nothing() {
    let mut tree = plain_tree();
    let root = tree.root();
    let mut servers = tree.leaf_list(root, "dns-servers").unwrap();
    servers.append("1.1.1.1").unwrap();

    let result = servers.extend(["9.9.9.9", "bogus"]);
    assert!(matches!(result, Err(YangError::InvalidMember { .. })));
    assert_eq!(servers.len(), 1);

    assert_eq!(servers.extend(["9.9.9.9", "1.1.1.1"]).unwrap(), 1);
    assert_eq!(servers.len(), 2);
}

#[test]
fn test_remove_and_pop() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let mut mixed = tree.leaf_list(root, "mixed").unwrap();
    mixed.extend(["1", "2", "3", "4"]).unwrap();

    mixed.remove(2).unwrap();
    assert!(matches!(mixed.remove(9), Err(YangError::ElementNotFound { .. })));
    assert_eq!(mixed.pop(None).unwrap(), ScalarValue::Integer(4));
    assert_eq!(mixed.pop(Some(0)).unwrap(), ScalarValue::Integer(1));
    assert_eq!(mixed.values().unwrap(), vec![ScalarValue::Integer(3)]);
    assert!(matches!(mixed.pop(Some(5)), Err(YangError::ElementNotFound { .. })));

    assert!(tree.find("/mixed[.='2']").is_empty());
    assert_eq!(tree.find("/mixed[.='3']").len(), 1);
}

#[test]
fn test_remove_matches_coerced_value() {
    let mut tree = plain_tree();
    let root = tree.root();
    let mut mixed = tree.leaf_list(root, "mixed").unwrap();
    mixed.append(5).unwrap();
    mixed.remove("5").unwrap();
    assert!(mixed.is_empty());
}

#[test]
fn test_replace_validates_first() {
    let mut tree = plain_tree();
    let root = tree.root();
    let mut servers = tree.leaf_list(root, "dns-servers").unwrap();
    servers.append("1.1.1.1").unwrap();

    assert!(servers.replace(["2.2.2.2", "x"]).is_err());
    assert_eq!(servers.values().unwrap(), vec![ScalarValue::from("1.1.1.1")]);

    assert_eq!(servers.replace(["2.2.2.2", "3.3.3.3"]).unwrap(), 2);
    assert_eq!(
        servers.values().unwrap(),
        vec![ScalarValue::from("2.2.2.2"), ScalarValue::from("3.3.3.3")]
    );
}

#[test]
fn test_mutation_marks_changed_and_exports() {
    let mut tree = plain_tree();
    let root = tree.root();
    tree.leaf_list(root, "dns-servers").unwrap().append("8.8.4.4").unwrap();

    let servers = tree.child(root, "dns-servers").unwrap();
    assert!(tree.is_changed(servers).unwrap());
    let json = tree.to_json(true).unwrap();
    assert_eq!(json, serde_json::json!({"dns-servers": ["8.8.4.4"]}));
}

#[test]
fn test_equal_values_keep_their_shared_path() {
    let mut tree = indexed_tree();
    let root = tree.root();
    let mut mixed = tree.leaf_list(root, "mixed").unwrap();
    assert!(mixed.append(5u8).unwrap());
    assert!(mixed.append(5u8).unwrap());
    mixed.append(7u8).unwrap();

    assert_eq!(mixed.pop(Some(1)).unwrap(), ScalarValue::Integer(5));
    let sequence = tree.child(root, "mixed").unwrap();
    let survivor = tree.children(sequence).unwrap()[0];
    assert_eq!(tree.find("/mixed[.='5']"), vec![survivor]);

    tree.leaf_list(root, "mixed").unwrap().append(5u8).unwrap();
    tree.leaf_list(root, "mixed").unwrap().remove(5u8).unwrap();
    let remaining = tree.children(sequence).unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(tree.find("/mixed[.='5']"), vec![remaining[1]]);

    tree.leaf_list(root, "mixed").unwrap().pop(None).unwrap();
    assert!(tree.find("/mixed[.='5']").is_empty());
    assert_eq!(tree.find("/mixed[.='7']").len(), 1);
}

#[test]
fn test_failed_bulk_updates_keep_choice_state() {
    let mut tree = plain_tree();
    let root = tree.root();
    let routing = tree.child(root, "routing").unwrap();
    tree.set_leaf(routing, "asn", 65001).unwrap();
    tree.leaf_list(root, "dns-servers").unwrap().append("1.1.1.1").unwrap();

    let mut servers = tree.leaf_list(root, "dns-servers").unwrap();
    assert!(servers.extend(["8.8.8.8", "bogus"]).is_err());
    assert!(servers.replace(["8.8.8.8", "bogus"]).is_err());
    assert_eq!(servers.values().unwrap(), vec![ScalarValue::from("1.1.1.1")]);

    assert_eq!(tree.get_leaf(routing, "asn").unwrap(), Some(ScalarValue::Integer(65001)));
    let asn = tree.child(routing, "asn").unwrap();
    assert!(tree.is_changed(asn).unwrap());
}
