use super::*;

#[test]
fn scalar_endpoints_map_to_unit_interval() {
    let r = ScalarRange::new();
    r.expand(-4.0);
    r.expand(12.0);
    assert_eq!(r.map(-4.0), 0.0);
    assert_eq!(r.map(12.0), 1.0);
    assert_eq!(r.map(4.0), 0.5);
    assert_eq!(r.bounds(), (-4.0, 12.0));
}

#[test]
fn scalar_min_never_exceeds_max() {
    let r = ScalarRange::new();
    for v in [5.0, -1.0, 3.0, f64::NAN, 9.0, f64::INFINITY] {
        r.expand(v);
        let (lo, hi) = r.bounds();
        assert!(lo <= hi);
    }
    assert_eq!(r.bounds(), (-1.0, 9.0));
}

#[test]
fn degenerate_and_empty_domains_do_not_divide_by_zero() {
    let r = ScalarRange::new();
    assert!(r.is_empty());
    assert_eq!(r.bounds(), DEFAULT_SCALAR_BOUNDS);
    assert_eq!(r.map(0.25), 0.25);

    r.expand(7.0);
    assert_eq!(r.map(7.0), 0.0);
    assert_eq!(r.map(100.0), 0.0);
}

#[test]
fn out_of_domain_values_clamp() {
    let r = ScalarRange::new();
    r.expand_all([0.0, 10.0]);
    assert_eq!(r.map(-5.0), 0.0);
    assert_eq!(r.map(15.0), 1.0);
}

#[test]
fn views_share_bounds_with_the_base_range() {
    let base = ScalarRange::new();
    base.expand(0.0);
    base.expand(10.0);
    let sym = base.symmetric();
    assert!(sym.shares_bounds_with(&base));
    assert_eq!(sym.start(), -10.0);

    base.expand(-20.0);
    assert_eq!(sym.start(), -20.0);
    assert_eq!(sym.end(), 20.0);
    assert_eq!(sym.map(0.0), 0.5);
    assert_eq!(base.view(), ScalarView::Linear);
}

#[test]
fn banded_view_rounds_bounds_outward() {
    let r = ScalarRange::new();
    r.expand_all([3.0, 97.0]);
    let banded = r.banded(5).unwrap();
    assert_eq!((banded.start(), banded.end()), (0.0, 100.0));
    assert_eq!(banded.map(50.0), 0.5);

    let bands = banded.bands();
    assert_eq!(bands.len(), 5);
    assert_eq!(bands[0], Band { min: 0.0, max: 20.0 });
    assert_eq!(bands[4].max, 100.0);

    assert!(r.banded(0).is_err());
}

#[test]
fn logarithmic_view_normalizes_by_log() {
    let r = ScalarRange::new();
    r.expand_all([1.0, 1000.0]);
    let log = r.logarithmic(10.0).unwrap();
    assert_eq!(log.map(1.0), 0.0);
    assert_eq!(log.map(1000.0), 1.0);
    assert!((log.map(10.0) - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(log.map(-3.0), 0.0);
    assert_eq!(log.bands().len(), 3);

    assert!(r.logarithmic(1.0).is_err());
}

#[test]
fn absolute_view_maps_magnitudes() {
    let r = ScalarRange::new();
    r.expand_all([-10.0, 5.0]);
    let abs = r.absolute();
    assert_eq!((abs.start(), abs.end()), (0.0, 10.0));
    assert_eq!(abs.map(-10.0), 1.0);
    assert_eq!(abs.map(5.0), 0.5);

    let positive = ScalarRange::new();
    positive.expand_all([2.0, 6.0]);
    assert_eq!(positive.absolute().start(), 2.0);
}

#[test]
fn ordinal_preserves_first_seen_order_and_uniqueness() {
    let r = OrdinalRange::new();
    r.expand_all(["b", "a", "b", "c", "a"]);
    assert_eq!(r.len(), 3);
    assert_eq!(r.map(&Value::from("b")), Some(0));
    assert_eq!(r.map(&Value::from("a")), Some(1));
    assert_eq!(r.map(&Value::from("c")), Some(2));
    assert_eq!(r.map(&Value::from("zzz")), None);
}

#[test]
fn ordinal_ignores_nullish_values() {
    let r = OrdinalRange::new();
    r.expand(Value::Undefined);
    r.expand(Value::Null);
    assert!(r.is_empty());
}

#[test]
fn dynamic_range_expand_and_map() {
    let scalar = Range::scalar();
    scalar.expand(&Value::Number(0.0)).unwrap();
    scalar.expand(&Value::Number(4.0)).unwrap();
    scalar.expand(&Value::Undefined).unwrap();
    assert!(scalar.expand(&Value::from("x")).is_err());
    assert_eq!(
        scalar.map(&Value::Number(1.0)),
        RangePosition::Scalar(Some(0.25))
    );
    assert_eq!(scalar.map(&Value::from("x")), RangePosition::Scalar(None));

    let ordinal = Range::new(RangeKind::Ordinal);
    ordinal.expand(&Value::from("x")).unwrap();
    assert_eq!(ordinal.kind(), RangeKind::Ordinal);
    assert_eq!(
        ordinal.map(&Value::from("x")),
        RangePosition::Ordinal(Some(0))
    );

    ordinal.reset();
    assert!(ordinal.is_empty());
}

#[test]
fn labels_are_shared_between_handles() {
    let r = ScalarRange::new();
    let view = r.symmetric();
    r.set_label("Revenue");
    assert_eq!(view.label().as_deref(), Some("Revenue"));
}
