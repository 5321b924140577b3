// tests/config_load.rs
use serial_test::serial;
use std::io::Write;

use ipagrab::config::{AppConfig, ENV_CONFIG_PATH, ENV_PASSWORD};
use ipagrab::retry::Backoff;

fn write_toml(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[test]
#[serial]
fn env_path_wins() {
    let f = write_toml(
        r#"
        timeout_secs = 4
        history_dir = "reports"
        [credentials]
        apple_id = "user@example.com"
        [retry]
        backoff = "exponential"
        "#,
    );
    std::env::set_var(ENV_CONFIG_PATH, f.path());
    let cfg = AppConfig::load_default().unwrap();
    std::env::remove_var(ENV_CONFIG_PATH);

    assert_eq!(cfg.timeout_secs, 4);
    assert_eq!(cfg.history_dir, std::path::PathBuf::from("reports"));
    assert_eq!(cfg.credentials.apple_id, "user@example.com");
    assert_eq!(cfg.store.storefronts.len(), 5);
    assert_eq!(cfg.retry.login_policy().backoff, Backoff::Exponential);
}

#[test]
#[serial]
fn env_path_to_missing_file_is_an_error() {
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let res = AppConfig::load_default();
    std::env::remove_var(ENV_CONFIG_PATH);
    assert!(res.is_err());
}

#[test]
#[serial]
fn password_env_indirection_appends_code() {
    let f = write_toml(
        r#"
        [credentials]
        password = "ENV"
        code = "123456"
        "#,
    );
    let cfg = AppConfig::load_from_file(f.path()).unwrap();

    std::env::set_var(ENV_PASSWORD, "secret");
    assert_eq!(cfg.resolved_password().unwrap(), "secret123456");
    std::env::remove_var(ENV_PASSWORD);
    assert!(cfg.resolved_password().is_err());
}
