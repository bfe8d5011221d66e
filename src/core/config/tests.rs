use super::data::{path_display, Config, StoreKind};
use super::io::ConfigError;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.model_base_url(), "https://ai.izdrail.com/api");
    assert_eq!(config.store_base_url(), "http://localhost:4321/api");
    assert_eq!(config.default_model(), "llama3.2:1b");
    assert_eq!(config.store_kind(), StoreKind::Http);
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config
        .set_value("default-model", "qwen2.5:7b")
        .expect("set failed");
    config.set_value("store", "Memory").expect("set failed");
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.default_model(), "qwen2.5:7b");
    assert_eq!(loaded.store_kind(), StoreKind::Memory);

    let mut config = loaded;
    config.unset_value("default_model").expect("unset failed");
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let reloaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(reloaded.default_model, None);
    assert_eq!(reloaded.store, Some(StoreKind::Memory));

    let leftovers: Vec<_> = std::fs::read_dir(config_path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(leftovers.len(), 1, "temp files should not be left behind");
}

#[test]
fn parse_errors_name_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "store = \"carrier-pigeon\"\n").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn toml_keys_use_snake_case() {
    let config: Config = toml::from_str(
        r#"
model_base_url = "http://gpu-box:11434/api"
store = "memory"
"#,
    )
    .unwrap();
    assert_eq!(config.model_base_url(), "http://gpu-box:11434/api");
    assert_eq!(config.store_kind(), StoreKind::Memory);
    assert_eq!(config.store_base_url, None);
}

#[test]
fn unknown_keys_and_bad_values_are_rejected() {
    let mut config = Config::default();
    assert!(matches!(
        config.set_value("theme", "dark"),
        Err(ConfigError::UnknownKey(_))
    ));
    assert!(matches!(
        config.set_value("store", "s3"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.set_value("default-model", "   "),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.unset_value("nope"),
        Err(ConfigError::UnknownKey(_))
    ));
    assert_eq!(config, Config::default());
}

#[test]
fn describe_marks_defaults() {
    let mut config = Config::default();
    config
        .set_value("store-base-url", "http://store:4321/api")
        .unwrap();
    let text = config.describe();
    assert!(text.contains("store-base-url: http://store:4321/api\n"));
    assert!(text.contains("default-model: llama3.2:1b (default)"));
    assert!(text.contains("store: http (default)"));
}

#[cfg(unix)]
#[test]
fn path_display_abbreviates_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config/ollachat/config.toml");
        assert_eq!(path_display(&path), "~/.config/ollachat/config.toml");
    }
}
