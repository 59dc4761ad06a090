//! Tests for Config serialization and file handling

use std::time::Duration;
use tooluse_config::{init_at, AgentDefaults, Config, ConfigError, ProviderConfig};
use tempfile::TempDir;

/// Helper to create a temporary directory for tests
fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

// ========== Defaults ==========

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.agent.model, "gemini-2.5-flash");
    assert_eq!(config.agent.max_tokens, 4096);
    assert_eq!(config.agent.temperature, 0.0);
    assert_eq!(config.agent.model_timeout_secs, 60);
    assert!(config.agent.system_prompt.is_none());

    assert!(config.provider.api_key.is_empty());
    assert!(config.provider.api_base.is_none());
}

#[test]
fn test_partial_json_fills_defaults() {
    let config: Config =
        serde_json::from_str(r#"{"agent": {"model": "gpt-4o-mini"}}"#).unwrap();

    assert_eq!(config.model(), "gpt-4o-mini");
    assert_eq!(config.agent.max_tokens, 4096);
    assert_eq!(config.model_timeout(), Some(Duration::from_secs(60)));
    assert!(config.provider.api_key.is_empty());
}

#[test]
fn test_empty_json_is_default() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.agent.model, AgentDefaults::default().model);
}

#[test]
fn test_serialization_skips_unset_optionals() {
    let json = serde_json::to_string(&Config::default()).unwrap();
    assert!(!json.contains("api_base"));
    assert!(!json.contains("system_prompt"));
    assert!(json.contains("\"model\":\"gemini-2.5-flash\""));
}

// ========== load / save ==========

#[tokio::test]
async fn test_load_missing_file_returns_defaults() {
    let dir = temp_dir();
    let config = Config::load_from(&dir.path().join("absent.json"))
        .await
        .unwrap();
    assert_eq!(config.agent.model, "gemini-2.5-flash");
}

#[tokio::test]
async fn test_save_then_load_preserves_values() {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        provider: ProviderConfig {
            api_key: "AIza-test".to_string(),
            api_base: Some("http://localhost:9000/v1".to_string()),
        },
        agent: AgentDefaults {
            model: "custom".to_string(),
            max_tokens: 512,
            temperature: 0.3,
            model_timeout_secs: 5,
            system_prompt: Some("Be brief.".to_string()),
        },
    };
    config.save_to(&path).await.unwrap();

    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.provider.api_key, "AIza-test");
    assert_eq!(loaded.api_base().as_deref(), Some("http://localhost:9000/v1"));
    assert_eq!(loaded.agent.max_tokens, 512);
    assert_eq!(loaded.agent.system_prompt.as_deref(), Some("Be brief."));
    assert_eq!(loaded.model_timeout(), Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn test_load_invalid_json_is_parse_error() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = Config::load_from(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(err.to_string().starts_with("config parse error"));
}

// ========== init ==========

#[tokio::test]
async fn test_init_creates_default_file() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");

    let config = init_at(&path).await.unwrap();
    assert!(path.exists());
    assert_eq!(config.agent.model, "gemini-2.5-flash");
}

#[tokio::test]
async fn test_init_keeps_existing_file() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");

    let mut existing = Config::default();
    existing.agent.model = "existing-model".to_string();
    existing.save_to(&path).await.unwrap();

    let config = init_at(&path).await.unwrap();
    assert_eq!(config.agent.model, "existing-model");
}
