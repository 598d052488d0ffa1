use specgraph_core::config::{
    DEFAULT_ASSIGNMENT_WEIGHT, DEFAULT_DB_PATH, DEFAULT_NARRATIVE_FILE, DEFAULT_SPEC_ROOT,
    PROJECT_CONFIG_FILE,
};
use specgraph_core::{Config, ConfigError, Workspace};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.spec.root_dir, DEFAULT_SPEC_ROOT);
    assert_eq!(config.spec.narrative_file, DEFAULT_NARRATIVE_FILE);
    assert_eq!(config.database.path, DEFAULT_DB_PATH);
    assert_eq!(config.report.assignment_weight, DEFAULT_ASSIGNMENT_WEIGHT);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_to_toml() {
    let toml_str = Config::default_config_string();
    assert!(toml_str.contains("[spec]"));
    assert!(toml_str.contains("[database]"));
    assert!(toml_str.contains("[report]"));
    assert!(toml_str.contains("[logging]"));
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
[spec]
root_dir = "specs"
narrative_file = "docs/PRD.md"

[report]
schema_weight = 20
sync_weight = 20
assignment_weight = 60
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.spec.root_dir, "specs");
    assert_eq!(config.spec.product_file, "product.yaml");
    assert_eq!(config.report.assignment_weight, 60);
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_weights_must_sum_to_100() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(PROJECT_CONFIG_FILE);
    std::fs::write(&path, "[report]\nschema_weight = 50\n").unwrap();

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_overflowing_weights_are_invalid() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(PROJECT_CONFIG_FILE),
        "[report]\nschema_weight = 4294967295\nsync_weight = 101\nassignment_weight = 0\n",
    )
    .unwrap();

    let err = Config::load(tmp.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_workspace_paths() {
    let tmp = TempDir::new().unwrap();
    let toml_str = "[spec]\nroot_dir = \"specs\"\nnarrative_file = \"docs/PRD.md\"\n";
    let config: Config = toml::from_str(toml_str).unwrap();
    let ws = Workspace::new(tmp.path(), config);

    assert_eq!(ws.spec_dir(), tmp.path().join("specs"));
    assert_eq!(ws.product_file(), tmp.path().join("specs/product.yaml"));
    assert_eq!(ws.narrative_name(), "PRD.md");
    assert_eq!(ws.relative(&tmp.path().join("specs/features/f.yaml")), "specs/features/f.yaml");
}
