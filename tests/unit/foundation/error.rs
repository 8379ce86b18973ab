use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MixviewError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MixviewError::snapshot("x")
            .to_string()
            .contains("snapshot error:")
    );
    assert!(
        MixviewError::config("x")
            .to_string()
            .contains("config error:")
    );
    assert!(
        MixviewError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        MixviewError::source("x")
            .to_string()
            .contains("source error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MixviewError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde_variant() {
    let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = MixviewError::from(e);
    assert!(matches!(err, MixviewError::Serde(_)));
}
