use vgc_core::{ConfigError, History, VgcConfig};

#[test]
fn test_config_drives_history_retention() {
    let config = VgcConfig::from_toml_str(
        r#"
        [history]
        max_levels = 7

        [complex]
        diff_enabled = true
        "#,
    )
    .unwrap();
    assert!(config.complex.diff_enabled);

    let history: History<()> = History::with_config(&config.history);
    assert_eq!(history.max_levels(), 7);
}

#[test]
fn test_unknown_value_type_is_parse_error() {
    let err = VgcConfig::from_toml_str("[history]\nmax_levels = \"many\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_serializes_to_json() {
    let json = serde_json::to_value(VgcConfig::default()).unwrap();
    assert_eq!(json["history"]["max_levels"], 100);
    assert_eq!(json["complex"]["diff_enabled"], false);
}
