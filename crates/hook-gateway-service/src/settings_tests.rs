use super::*;
use std::io::Write;

fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[test]
fn test_defaults_without_sources() {
    let config = load_config(None, env(&[])).unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.retry.max_elapsed_seconds, 30);
}

#[test]
fn test_explicit_file_overrides_defaults() {
    let file = yaml_file(
        "server:\n  port: 9000\nretry:\n  max_elapsed_seconds: 12\nwebhooks:\n  secret: abc\n",
    );

    let config = load_config(Some(file.path()), env(&[])).unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.retry.max_elapsed_seconds, 12);
    assert_eq!(config.webhooks.secret, "abc");
}

#[test]
fn test_environment_overrides_file() {
    let file = yaml_file("server:\n  port: 9000\n");

    let config = load_config(
        Some(file.path()),
        env(&[
            ("HG__SERVER__PORT", "9191"),
            ("HG__LOGGING__JSON_FORMAT", "true"),
        ]),
    )
    .unwrap();

    assert_eq!(config.server.port, 9191);
    assert!(config.logging.json_format);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let result = load_config(Some(Path::new("/definitely/not/here.yaml")), env(&[]));

    assert!(matches!(result, Err(ConfigError::Load { .. })));
}

#[test]
fn test_invalid_values_fail_validation() {
    let file = yaml_file("retry:\n  randomization_factor: 3.0\n");

    let result = load_config(Some(file.path()), env(&[]));

    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_wrongly_typed_value_is_a_load_error() {
    let result = load_config(None, env(&[("HG__SERVER__PORT", "not-a-port")]));

    assert!(matches!(result, Err(ConfigError::Load { .. })));
}

#[test]
fn test_numeric_looking_secret_from_environment_is_kept_verbatim() {
    for secret in ["0123456789", "1e3", "true"] {
        let config = load_config(None, env(&[("HG__WEBHOOKS__SECRET", secret)])).unwrap();

        assert_eq!(config.webhooks.secret, secret);
    }
}
