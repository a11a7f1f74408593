use super::*;
use serde_json::json;

fn frame() -> NodeFrame {
    NodeFrame::new(0.0, 0.0, 100.0, 50.0)
}

#[test]
fn first_snapshot_adds_everything_in_order() {
    let mut data = KeyedData::new("id").unwrap();
    let changes = data
        .update(&[json!({"id": "b"}), json!({"id": "a"})], frame())
        .unwrap();
    let keys: Vec<_> = changes.updates.iter().map(|u| u.key.as_str()).collect();
    assert_eq!(keys, vec!["b", "a"]);
    assert!(changes.removed.is_empty());
    assert_eq!(data.len(), 2);
}

#[test]
fn unchanged_items_are_neither_updated_nor_removed() {
    let mut data = KeyedData::new("id").unwrap();
    data.update(&[json!({"id": 1, "v": 1}), json!({"id": 2, "v": 2})], frame())
        .unwrap();

    let changes = data
        .update(&[json!({"id": 1, "v": 1}), json!({"id": 3, "v": 3})], frame())
        .unwrap();
    let updated: Vec<_> = changes.updates.iter().map(|u| u.key.as_str()).collect();
    assert_eq!(updated, vec!["3"]);
    assert_eq!(changes.removed, vec![NodeKey::from("2")]);
    changes.validate().unwrap();
}

#[test]
fn changed_content_or_frame_produces_updates() {
    let mut data = KeyedData::new("id").unwrap();
    data.update(&[json!({"id": "a", "v": 1})], frame()).unwrap();

    let changes = data.update(&[json!({"id": "a", "v": 2})], frame()).unwrap();
    assert_eq!(changes.updates.len(), 1);

    let moved = NodeFrame::new(0.0, 0.0, 200.0, 50.0);
    let changes = data.update(&[json!({"id": "a", "v": 2})], moved).unwrap();
    assert_eq!(changes.updates.len(), 1);
    assert_eq!(changes.updates[0].frame, moved);
}

#[test]
fn bad_keys_are_reported() {
    let mut data = KeyedData::new("meta.id").unwrap();
    let err = data
        .update(&[json!({"meta": {"id": "a"}}), json!({"meta": {"id": "a"}})], frame())
        .unwrap_err();
    assert!(matches!(err, ApertureError::Configuration(_)));

    let err = data.update(&[json!({"meta": {}})], frame()).unwrap_err();
    assert!(matches!(err, ApertureError::Evaluation(_)));

    assert!(KeyedData::new("bad..path").is_err());
}

#[test]
fn diff_leaves_the_previous_snapshot_until_committed() {
    let mut data = KeyedData::new("id").unwrap();
    let items = [json!({"id": "a"}), json!({"id": "b"})];

    let (changes, snapshot) = data.diff(&items, frame()).unwrap();
    assert_eq!(changes.updates.len(), 2);
    assert!(data.is_empty());
    assert_eq!(snapshot.keys(), &[NodeKey::from("a"), NodeKey::from("b")]);

    let (again, _) = data.diff(&items, frame()).unwrap();
    assert_eq!(again.updates.len(), 2);

    data.commit(snapshot);
    assert_eq!(data.len(), 2);
    assert!(data.update(&items, frame()).unwrap().is_empty());
}
