#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::indexed_tree;
use yangtree_core::errors::{ExErrorKind, YangError};
use yangtree_core::logging_facility::test_capture::init_test_capture;
use yangtree_core::{log_op_end, log_op_error, log_op_start};
use yangtree_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_CHOICE, FIELD_ERR_CODE, FIELD_ERR_PATH,
    FIELD_LIST_KEY,
};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let start_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_START))
        .collect();
    assert_eq!(start_events.len(), 1, "Should have exactly one start event");
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = YangError::KeyNotFound {
        path: "/interfaces/interface".to_string(),
        key: "eth9".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
    let events = capture.events_for_op(op_name);
    assert_eq!(events[0].field(FIELD_ERR_CODE), Some("ERR_KEY_NOT_FOUND"));
}

#[test]
fn test_log_op_error_accepts_reference() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_ref_unique_4";

    let err = YangError::UnmappedChoice {
        container: "/routing".to_string(),
        field: "bogus".to_string(),
    };
    log_op_error!(op_name, &err, duration_ms = 1, container = "/routing");

    let events = capture.events_for_op(op_name);
    assert_eq!(events[0].field(FIELD_ERR_CODE), Some("ERR_UNMAPPED_CHOICE"));
    assert_eq!(events[0].field("container"), Some("/routing"));
    assert_eq!(err.kind(), ExErrorKind::UnmappedChoice);
}

#[test]
fn test_log_op_error_records_node_path() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_path_unique_7";
    let mut tree = indexed_tree();
    let interfaces = tree.child(tree.root(), "interfaces").unwrap();

    let err = tree
        .list(interfaces, "interface")
        .unwrap()
        .delete("eth-missing")
        .unwrap_err();
    log_op_error!(op_name, err, duration_ms = 2);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field(FIELD_ERR_PATH), Some("/interfaces/interface"));
    assert!(events[0].field("error").unwrap().contains("eth-missing"));
}

#[test]
fn test_boundary_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_unique_5";

    log_op_start!(op_name, path = "/interfaces");
    log_op_end!(op_name, duration_ms = 3);

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END)
    });
    assert_eq!(starts, 1);
    assert_eq!(ends, 1);
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_assert_event_exists_fails_for_missing_event() {
    let capture = init_test_capture();
    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}

#[test]
fn test_list_entries_are_logged_with_key() {
    let capture = init_test_capture();
    let mut tree = indexed_tree();
    let interfaces = tree.child(tree.root(), "interfaces").unwrap();
    let key = "logged-eth-unique-6";

    tree.list(interfaces, "interface").unwrap().add(key).unwrap();

    let stored = capture.count_events(|e| {
        e.field(FIELD_LIST_KEY) == Some(key) && e.message.as_deref() == Some("stored list entry")
    });
    assert_eq!(stored, 1);

    let registered = capture.events_for_path(&format!("/interfaces/interface[name='{}']/mtu", key));
    assert!(registered
        .iter()
        .any(|e| e.message.as_deref() == Some("registered path")));
}

#[test]
fn test_choice_eviction_is_logged() {
    let capture = init_test_capture();
    let mut tree = indexed_tree();
    let routing = tree.child(tree.root(), "routing").unwrap();

    tree.set_leaf(routing, "next-hop", "192.0.2.7").unwrap();
    tree.set_leaf(routing, "asn", 65007).unwrap();

    let evicted = capture.count_events(|e| {
        e.path.as_deref() == Some("/routing/next-hop") && e.field(FIELD_CHOICE) == Some("protocol")
    });
    assert!(evicted >= 1);
}
