use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ApertureError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        ApertureError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        ApertureError::surface("x")
            .to_string()
            .contains("surface error:")
    );
    assert!(
        ApertureError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn only_evaluation_errors_are_contained() {
    assert!(ApertureError::evaluation("x").is_evaluation());
    assert!(!ApertureError::configuration("x").is_evaluation());
    assert!(!ApertureError::surface("x").is_evaluation());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ApertureError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
