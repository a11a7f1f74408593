use super::*;
use serde_json::json;

#[test]
fn parses_nested_fields_and_placeholders() {
    let p = FieldPath::parse("series[].points[][].value").unwrap();
    assert_eq!(
        p.steps(),
        &[
            PathStep {
                field: "series".to_string(),
                array_slots: 1
            },
            PathStep {
                field: "points".to_string(),
                array_slots: 2
            },
            PathStep {
                field: "value".to_string(),
                array_slots: 0
            },
        ]
    );
    assert_eq!(p.index_count(), 3);
    assert_eq!(p.to_string(), "series[].points[][].value");
}

#[test]
fn rejects_malformed_paths() {
    for bad in ["", ".a", "a.", "a..b", "a[", "a[0]", "1abc", "a b", "a-b", "a.[]"] {
        let err = FieldPath::parse(bad).unwrap_err();
        assert!(
            matches!(err, ApertureError::Configuration(ref m) if m.contains("invalid field path")),
            "{bad:?} -> {err}"
        );
    }
    assert!("$meta._x1".parse::<FieldPath>().is_ok());
}

#[test]
fn resolves_nested_fields() {
    let data = json!({"a": {"b": {"c": 4}}, "name": "x"});
    let p = FieldPath::parse("a.b.c").unwrap();
    assert_eq!(p.resolve(&data, &[]).unwrap(), Value::Number(4.0));
    assert_eq!(
        FieldPath::parse("name").unwrap().resolve(&data, &[]).unwrap(),
        Value::from("x")
    );
}

#[test]
fn placeholders_consume_indices_left_to_right() {
    let data = json!({"rows": [[1, 2], [3, 4]], "items": [{"v": 10}, {"v": 20}]});
    let rows = FieldPath::parse("rows[][]").unwrap();
    assert_eq!(rows.resolve(&data, &[1, 0]).unwrap(), Value::Number(3.0));
    assert_eq!(rows.resolve(&data, &[0, 1]).unwrap(), Value::Number(2.0));

    let items = FieldPath::parse("items[].v").unwrap();
    assert_eq!(items.resolve(&data, &[1]).unwrap(), Value::Number(20.0));
}

#[test]
fn array_length_is_readable() {
    let data = json!({"values": [1, 2, 3]});
    let p = FieldPath::parse("values.length").unwrap();
    assert_eq!(p.resolve(&data, &[]).unwrap(), Value::Number(3.0));
}

#[test]
fn missing_terminal_values_are_undefined() {
    let data = json!({"a": {"b": 1}, "list": [1]});
    assert_eq!(
        FieldPath::parse("a.z").unwrap().resolve(&data, &[]).unwrap(),
        Value::Undefined
    );
    assert_eq!(
        FieldPath::parse("list[]").unwrap().resolve(&data, &[5]).unwrap(),
        Value::Undefined
    );
}

#[test]
fn dereferencing_through_null_or_missing_is_an_evaluation_error() {
    let data = json!({"a": null, "list": [{"v": 1}]});
    let err = FieldPath::parse("a.b").unwrap().resolve(&data, &[]).unwrap_err();
    assert!(matches!(err, ApertureError::Evaluation(_)));

    let err = FieldPath::parse("z.b").unwrap().resolve(&data, &[]).unwrap_err();
    assert!(matches!(err, ApertureError::Evaluation(_)));

    let err = FieldPath::parse("list[].v")
        .unwrap()
        .resolve(&data, &[3])
        .unwrap_err();
    assert!(matches!(err, ApertureError::Evaluation(_)));
}

#[test]
fn too_few_indices_is_an_evaluation_error() {
    let data = json!({"list": [1]});
    let err = FieldPath::parse("list[]").unwrap().resolve(&data, &[]).unwrap_err();
    assert!(matches!(err, ApertureError::Evaluation(ref m) if m.contains("expects 1")));
}
