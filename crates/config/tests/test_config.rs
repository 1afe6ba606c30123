//! Tests for config serialization and file handling

use opencoder_config::{Config, ConfigError};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_config_serializes_to_stable_json() {
    let config = Config::default();
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["defaults"]["provider"], "openai");
    assert_eq!(json["defaults"]["max_tokens"], 4096);
    assert!(json["providers"]["openai"]["api_key"]
        .as_str()
        .unwrap()
        .is_empty());
    // unset optionals are omitted from the file
    assert!(json["providers"]["openai"].get("api_base").is_none());
}

#[test]
fn test_empty_object_deserializes_to_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.defaults.provider, "openai");
    assert_eq!(config.defaults.temperature, 0.7);
    assert!(config.providers.anthropic.api_key.is_empty());
}

#[test]
fn test_unknown_fields_are_tolerated() {
    let json = r#"{ "defaults": { "provider": "ollama" }, "future_section": { "x": 1 } }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.defaults.provider, "ollama");
}

#[tokio::test]
async fn test_round_trip_preserves_provider_settings() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");

    let mut config = Config::default();
    config.providers.ollama.api_base = Some("http://gpu-box:11434".to_string());
    config.providers.ollama.model = Some("codellama".to_string());
    config.defaults.max_followup_rounds = 5;

    config.save_to(&path).await.unwrap();
    let loaded = Config::load_from(&path).await.unwrap();

    assert_eq!(
        loaded.providers.ollama.api_base.as_deref(),
        Some("http://gpu-box:11434")
    );
    assert_eq!(loaded.providers.ollama.model.as_deref(), Some("codellama"));
    assert_eq!(loaded.defaults.max_followup_rounds, 5);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let dir = temp_dir();
    let path = dir.path().join("a").join("b").join("config.json");

    Config::default().save_to(&path).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_corrupt_file_is_a_json_error() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "{ broken").await.unwrap();

    let result = Config::load_from(&path).await;
    assert!(matches!(result, Err(ConfigError::Json(_))));
}
