use almacen_relay::config::Config;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_defaults_match_the_original_deployment() {
    let config = Config::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 4000);
    assert_eq!(config.channel_capacity, 128);
    assert!(!config.tls.enabled);
    assert!(!config.metrics.enabled);
}

#[test]
fn test_from_file_applies_defaults_for_missing_keys() {
    let file = write_config("port = 4100\n");
    let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.port, 4100);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.max_clients, 512);
}

#[test]
fn test_from_file_parses_sections() {
    let file = write_config(
        r#"
host = "0.0.0.0"
port = 4000
log_level = "debug"
channel_capacity = 256

[metrics]
enabled = true
port = 9200
"#,
    );
    let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.channel_capacity, 256);
    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.port, 9200);
}

#[test]
fn test_from_file_rejects_invalid_toml() {
    let file = write_config("port = [not toml");
    let err = Config::from_file(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_missing_file_is_an_error() {
    let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_validate_rejects_port_zero() {
    let file = write_config("port = 0\n");
    assert!(Config::from_file(file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_validate_rejects_metrics_port_collision() {
    let file = write_config(
        r#"
port = 4000

[metrics]
enabled = true
port = 4000
"#,
    );
    let err = Config::from_file(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("metrics.port"));
}

#[test]
fn test_validate_rejects_tls_without_paths() {
    let mut config = Config::default();
    config.tls.enabled = true;
    config.tls.cert_path = String::new();
    assert!(config.validate().is_err());
}
