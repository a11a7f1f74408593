use super::*;
use crate::scale::range::{OrdinalRange, ScalarRange};
use serde_json::json;

fn add(n: f64) -> Filter {
    Filter::new(move |v, _| Value::Number(v.as_f64().unwrap_or(0.0) + n))
}

fn times(n: f64) -> Filter {
    Filter::new(move |v, _| Value::Number(v.as_f64().unwrap_or(0.0) * n))
}

#[test]
fn field_accessor_then_transformation() {
    let r = ScalarRange::new();
    r.expand_all([0.0, 10.0]);
    let m = Mapping::new("x");
    m.from_field("value")
        .unwrap()
        .using(Some(MapKey::Scalar(r.mapped_to(vec![0.0.into(), 1.0.into()]).unwrap())));
    assert_eq!(
        m.value_for(&json!({"value": 5}), &[]).unwrap(),
        Value::Number(0.5)
    );
}

#[test]
fn evaluation_is_idempotent() {
    let m = Mapping::new("y");
    m.from_field("rows[].v").unwrap().filter(add(1.0));
    let data = json!({"rows": [{"v": 1}, {"v": 2}]});
    let a = m.value_for(&data, &[1]).unwrap();
    let b = m.value_for(&data, &[1]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, Value::Number(3.0));
}

#[test]
fn filters_apply_in_registration_order() {
    let m = Mapping::new("size");
    m.as_value(2.0).filter(add(1.0)).filter(times(10.0));
    assert_eq!(m.value_for(&json!({}), &[]).unwrap(), Value::Number(30.0));
}

#[test]
fn filter_without_removes_by_identity_and_keeps_order() {
    let a = add(1.0);
    let b = times(10.0);
    let c = add(5.0);
    let m = Mapping::new("size");
    m.as_value(0.0).filter(a.clone()).filter(b.clone()).filter(c.clone());

    m.filter_without(&add(1.0));
    assert_eq!(m.filters().len(), 3);

    m.filter_without(&b);
    let remaining = m.filters();
    assert_eq!(remaining.len(), 2);
    assert!(remaining[0].ptr_eq(&a));
    assert!(remaining[1].ptr_eq(&c));
    assert_eq!(m.value_for(&json!({}), &[]).unwrap(), Value::Number(6.0));

    m.clear_filters();
    assert!(m.filters().is_empty());
}

#[test]
fn filters_see_indices_and_context() {
    let m = Mapping::new("label");
    m.as_value("row").filter(Filter::new(|v, ctx| {
        let name = ctx.this.get("name").and_then(|n| n.as_str()).unwrap_or("?");
        Value::from(format!("{v}-{name}-{}", ctx.index(0).unwrap_or(99)))
    }));
    let data = json!({"name": "data"});
    let ctx = json!({"name": "ctx"});
    assert_eq!(
        m.value_for(&data, &[3]).unwrap(),
        Value::from("row-data-3")
    );
    assert_eq!(
        m.value_for_in(&data, &[4], &ctx).unwrap(),
        Value::from("row-ctx-4")
    );
}

#[test]
fn no_accessor_filters_the_transformed_undefined() {
    let m = Mapping::new("fill");
    assert!(!m.has_accessor());
    assert_eq!(m.value_for(&json!({}), &[]).unwrap(), Value::Undefined);

    m.filter(Filter::new(|v, _| {
        if v.is_undefined() {
            Value::from("default")
        } else {
            v
        }
    }));
    assert_eq!(m.value_for(&json!({}), &[]).unwrap(), Value::from("default"));
}

#[test]
fn invalid_sources_fail_at_setup() {
    let m = Mapping::new("x");
    assert!(matches!(
        m.from_field("a..b"),
        Err(ApertureError::Configuration(_))
    ));
    assert!(matches!(
        Source::from_json(&json!(42)),
        Err(ApertureError::Configuration(_))
    ));
    assert!(!m.has_accessor());
}

#[test]
fn function_accessor_errors_are_annotated_evaluation_errors() {
    let m = Mapping::new("x");
    m.from_fn(|_| Err(ApertureError::evaluation("boom")));
    let err = m.value_for(&json!({}), &[]).unwrap_err();
    assert!(matches!(err, ApertureError::Evaluation(ref msg) if msg.contains("mapping 'x'")));
}

#[test]
fn children_follow_later_parent_changes_until_overridden() {
    let parent = Mapping::new("fill");
    let child = Mapping::inheriting("fill", &parent);
    parent.as_value("red");
    assert_eq!(child.value_for(&json!({}), &[]).unwrap(), Value::from("red"));

    parent.as_value("blue");
    assert_eq!(child.value_for(&json!({}), &[]).unwrap(), Value::from("blue"));

    child.as_value("green");
    parent.as_value("black");
    assert_eq!(child.value_for(&json!({}), &[]).unwrap(), Value::from("green"));
}

#[test]
fn local_filter_copies_the_inherited_chain() {
    let parent = Mapping::new("size");
    parent.as_value(1.0).filter(add(1.0));
    let child = Mapping::inheriting("size", &parent);
    child.filter(times(10.0));
    assert_eq!(child.value_for(&json!({}), &[]).unwrap(), Value::Number(20.0));

    parent.filter(add(100.0));
    assert_eq!(parent.value_for(&json!({}), &[]).unwrap(), Value::Number(102.0));
    assert_eq!(child.value_for(&json!({}), &[]).unwrap(), Value::Number(20.0));
}

#[test]
fn only_detaches_from_the_parent() {
    let r = OrdinalRange::new();
    r.expand_all(["a"]);
    let parent = Mapping::new("fill");
    parent
        .from_field("cat")
        .unwrap()
        .using(Some(MapKey::Ordinal(r.mapped_to(vec!["red".into()]).unwrap())));

    let child = Mapping::inheriting("fill", &parent);
    assert_eq!(
        child.value_for(&json!({"cat": "a"}), &[]).unwrap(),
        Value::from("red")
    );

    child.as_value("a");
    child.only();
    assert!(child.is_only());
    assert!(child.transformation().is_none());
    assert!(child.filters().is_empty());

    parent.filter(Filter::new(|_, _| Value::from("changed")));
    parent.using(None);
    assert_eq!(child.value_for(&json!({}), &[]).unwrap(), Value::from("a"));
}
