use super::*;

#[test]
fn every_curve_is_pinned_at_the_ends() {
    for e in Ease::ALL {
        assert_eq!(e.apply(0.0), 0.0, "{e:?} at 0");
        assert!((e.apply(1.0) - 1.0).abs() < 1e-12, "{e:?} at 1");
    }
}

#[test]
fn apply_clamps_input() {
    assert_eq!(Ease::InQuad.apply(-1.0), 0.0);
    assert_eq!(Ease::OutCubic.apply(2.0), 1.0);
    assert_eq!(Ease::InQuad.apply(0.5), 0.25);
}

#[test]
fn names_round_trip() {
    for e in Ease::ALL {
        assert_eq!(Ease::from_name(e.name()).unwrap(), e);
    }
    assert!(Ease::from_name("bouncy").is_err());
}

#[test]
fn serde_uses_kebab_names() {
    let json = serde_json::to_string(&Ease::InOutCubic).unwrap();
    assert_eq!(json, "\"in-out-cubic\"");
    let e: Ease = serde_json::from_str("\"out-quad\"").unwrap();
    assert_eq!(e, Ease::OutQuad);
}
