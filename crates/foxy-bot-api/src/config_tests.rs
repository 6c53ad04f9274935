//! Tests for [`ServiceConfig`] loading, validation and redaction.

use super::*;
use std::io::Write;

fn valid_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.telegram.bot_token = "123456:ABC-DEF".to_string();
    config
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_defaults() {
    let config = ServiceConfig::default();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.timeout_seconds, 9);
    assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
    assert_eq!(config.webhook.endpoint_path, "/api");
    assert_eq!(config.webhook.chat_id_query_param, "chat_id");
    assert_eq!(config.webhook.secret_token, None);
    assert_eq!(config.logging.level, "info");
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_valid_config_passes() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_missing_bot_token_fails() {
    let result = ServiceConfig::default().validate();
    assert!(
        matches!(result, Err(ConfigError::Missing { ref key }) if key == "telegram.bot_token"),
        "unexpected result: {result:?}"
    );
}

#[test]
fn test_endpoint_path_must_be_absolute() {
    let mut config = valid_config();
    config.webhook.endpoint_path = "api".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_endpoint_path_must_not_shadow_health() {
    let mut config = valid_config();
    config.webhook.endpoint_path = "/health".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_zero_port_fails() {
    let mut config = valid_config();
    config.server.port = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_empty_secret_token_fails() {
    let mut config = valid_config();
    config.webhook.secret_token = Some(String::new());
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

    config.webhook.secret_token = Some("s3cret".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_api_base_url_fails() {
    let mut config = valid_config();
    config.telegram.api_base_url = "not a url".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

// ============================================================================
// Redaction
// ============================================================================

#[test]
fn test_debug_redacts_secrets() {
    let mut config = valid_config();
    config.webhook.secret_token = Some("gitlab-secret".to_string());

    let debug_str = format!("{:?}", config);
    assert!(
        !debug_str.contains("123456:ABC-DEF"),
        "debug output must not leak the bot token: {debug_str}"
    );
    assert!(
        !debug_str.contains("gitlab-secret"),
        "debug output must not leak the webhook secret: {debug_str}"
    );
    assert!(debug_str.contains("REDACTED"));
}

#[test]
fn test_redacted_copy_hides_secrets() {
    let mut config = valid_config();
    config.webhook.secret_token = Some("gitlab-secret".to_string());

    let redacted = config.redacted();
    let json = serde_json::to_string(&redacted).expect("serialize");

    assert!(!json.contains("123456:ABC-DEF"));
    assert!(!json.contains("gitlab-secret"));
    assert_eq!(redacted.server.port, config.server.port);
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_from_nothing_yields_defaults() {
    let config = ServiceConfig::load_from(&[], None, &HashMap::new()).expect("load");
    assert_eq!(config.server.port, 8080);
    assert!(config.telegram.bot_token.is_empty());
}

#[test]
fn test_load_skips_missing_optional_files() {
    let config = ServiceConfig::load_from(
        &[Path::new("/nonexistent/foxy-bot/service.yaml")],
        None,
        &HashMap::new(),
    )
    .expect("missing optional files are skipped");
    assert_eq!(config.webhook.endpoint_path, "/api");
}

#[test]
fn test_load_missing_required_file_fails() {
    let result = ServiceConfig::load_from(
        &[],
        Some(Path::new("/nonexistent/foxy-bot/explicit.yaml")),
        &HashMap::new(),
    );
    assert!(matches!(result, Err(ConfigError::Missing { .. })));
}

#[test]
fn test_load_yaml_file() {
    let file = write_file(
        ".yaml",
        "server:\n  port: 9090\ntelegram:\n  bot_token: \"42:XYZ\"\n  default_chat_id: \"-100200\"\nwebhook:\n  endpoint_path: /gitlab\n",
    );

    let config =
        ServiceConfig::load_from(&[], Some(file.path()), &HashMap::new()).expect("load yaml");

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.telegram.bot_token, "42:XYZ");
    assert_eq!(config.telegram.default_chat_id.as_deref(), Some("-100200"));
    assert_eq!(config.webhook.endpoint_path, "/gitlab");
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_toml_file() {
    let file = write_file(".toml", "[logging]\nlevel = \"debug\"\njson_format = true\n");

    let config =
        ServiceConfig::load_from(&[], Some(file.path()), &HashMap::new()).expect("load toml");

    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);
}

#[test]
fn test_structured_env_overrides_file() {
    let file = write_file(".yaml", "server:\n  port: 9090\n");
    let env = env(&[
        ("FOXY__SERVER__PORT", "7070"),
        ("FOXY__TELEGRAM__DEFAULT_CHAT_ID", "-42"),
    ]);

    let config = ServiceConfig::load_from(&[], Some(file.path()), &env).expect("load");

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.telegram.default_chat_id.as_deref(), Some("-42"));
}

#[test]
fn test_legacy_env_vars() {
    let env = env(&[
        ("FOXY_BOT_TOKEN", "legacy-token"),
        ("USE_GITLAB_TOKEN", "legacy-secret"),
        ("USE_GITLAB_CHAT_ID", "-1001"),
    ]);

    let config = ServiceConfig::load_from(&[], None, &env).expect("load");

    assert_eq!(config.telegram.bot_token, "legacy-token");
    assert_eq!(config.webhook.secret_token.as_deref(), Some("legacy-secret"));
    assert_eq!(config.telegram.default_chat_id.as_deref(), Some("-1001"));
}

#[test]
fn test_empty_legacy_env_vars_are_ignored() {
    let env = env(&[("USE_GITLAB_TOKEN", "")]);

    let config = ServiceConfig::load_from(&[], None, &env).expect("load");

    assert_eq!(config.webhook.secret_token, None);
}
