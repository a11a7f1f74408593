use super::*;
use serde_json::json;

fn base() -> serde_json::Value {
    json!({
        "width": 400,
        "height": 300,
        "ranges": {
            "values": {"kind": "scalar", "expand_from": "value", "view": {"banded": 5}},
            "groups": {"kind": "ordinal", "domain": ["a", "b"]}
        },
        "layers": [{
            "id": "bars",
            "mark": {"type": "bar", "orientation": "horizontal"},
            "key": "id",
            "mappings": {
                "x": {"field": "value", "range": "values", "to": [0, 1], "tween": "out-cubic"},
                "fill": {"field": "group", "range": "groups", "to": ["red"]},
                "stroke": {"value": "#336699"}
            }
        }],
        "transition": {"duration_ms": 250, "easing": "out-cubic"}
    })
}

fn parse(v: &serde_json::Value) -> ApertureResult<ChartDef> {
    ChartDef::from_json_str(&v.to_string())
}

#[test]
fn well_formed_chart_parses() {
    let def = parse(&base()).unwrap();
    assert_eq!(def.layers.len(), 1);
    assert_eq!(
        def.layers[0].mark,
        MarkDef::Bar {
            orientation: Orientation::Horizontal
        }
    );
    assert_eq!(def.layers[0].data_key(), "bars");
    assert_eq!(def.ranges["values"].view, Some(ScalarView::Banded(5)));
    assert_eq!(def.transition.unwrap().duration_ms, 250);
    assert_eq!(def.frame(), NodeFrame::new(0.0, 0.0, 400.0, 300.0));

    let again = ChartDef::from_json_str(&def.to_json_string().unwrap()).unwrap();
    assert_eq!(again.layers[0].mappings.len(), 3);
}

#[test]
fn mapping_needs_exactly_one_accessor() {
    let mut v = base();
    v["layers"][0]["mappings"]["stroke"] = json!({"value": "red", "field": "c"});
    assert!(parse(&v).is_err());

    v["layers"][0]["mappings"]["stroke"] = json!({"range": "groups", "to": ["red"]});
    let err = parse(&v).unwrap_err();
    assert!(err.to_string().contains("missing accessor"));
}

#[test]
fn range_references_are_checked() {
    let mut v = base();
    v["layers"][0]["mappings"]["x"] = json!({"field": "value", "range": "nope", "to": [0, 1]});
    assert!(parse(&v).unwrap_err().to_string().contains("unknown range 'nope'"));

    v["layers"][0]["mappings"]["x"] = json!({"field": "value", "range": "values"});
    assert!(parse(&v).is_err());

    v["layers"][0]["mappings"]["x"] = json!({"field": "value", "range": "values", "to": [0]});
    assert!(parse(&v).is_err());

    v["layers"][0]["mappings"]["x"] = json!({"field": "value", "tween": "area"});
    assert!(parse(&v).is_err());
}

#[test]
fn bad_paths_and_tweens_are_configuration_errors() {
    let mut v = base();
    v["layers"][0]["key"] = json!("id..x");
    assert!(matches!(parse(&v), Err(ApertureError::Configuration(_))));

    let mut v = base();
    v["layers"][0]["mappings"]["x"]["tween"] = json!("bouncy");
    assert!(matches!(parse(&v), Err(ApertureError::Configuration(_))));

    let mut v = base();
    v["ranges"]["groups"]["view"] = json!("symmetric");
    assert!(parse(&v).is_err());
}

#[test]
fn layers_and_dimensions_are_checked() {
    let mut v = base();
    v["width"] = json!(0);
    assert!(parse(&v).is_err());

    let mut v = base();
    let layer = v["layers"][0].clone();
    v["layers"] = json!([layer.clone(), layer]);
    assert!(parse(&v).unwrap_err().to_string().contains("duplicate layer id"));

    let mut v = base();
    v["layers"] = json!([]);
    assert!(parse(&v).is_err());
}

#[test]
fn malformed_json_is_a_serde_error() {
    assert!(matches!(
        ChartDef::from_json_str("{not json"),
        Err(ApertureError::Serde(_))
    ));
    let mut v = base();
    v["colour"] = json!("red");
    assert!(matches!(parse(&v), Err(ApertureError::Serde(_))));
}
