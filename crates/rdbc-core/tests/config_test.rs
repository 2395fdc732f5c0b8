//! Unit tests for rdbc-core config module

use rdbc_core::config::{DriverManagerConfig, DRIVERS_ENV, LOGIN_TIMEOUT_ENV};
use rdbc_core::error::ErrorCategory;
use serial_test::serial;

fn clear_env() {
    std::env::remove_var(DRIVERS_ENV);
    std::env::remove_var(LOGIN_TIMEOUT_ENV);
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();

    let config = DriverManagerConfig::from_env().unwrap();
    assert_eq!(config, DriverManagerConfig::default());
}

#[test]
#[serial]
fn test_from_env_reads_driver_list() {
    clear_env();
    std::env::set_var(DRIVERS_ENV, "acme_pg::PgDriver:acme_mysql::MySqlDriver");
    std::env::set_var(LOGIN_TIMEOUT_ENV, " 15 ");

    let config = DriverManagerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(
        config.drivers,
        vec!["acme_pg::PgDriver", "acme_mysql::MySqlDriver"]
    );
    assert_eq!(config.login_timeout_secs, 15);
    assert!(config.discover_providers);
}

#[test]
#[serial]
fn test_from_env_rejects_bad_timeout() {
    clear_env();
    std::env::set_var(LOGIN_TIMEOUT_ENV, "soon");

    let err = DriverManagerConfig::from_env().unwrap_err();
    clear_env();

    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains(LOGIN_TIMEOUT_ENV));
}

#[test]
fn test_config_serde() {
    let config = DriverManagerConfig::new()
        .with_drivers(["acme_pg::PgDriver"])
        .with_login_timeout(30);

    let json = serde_json::to_string(&config).unwrap();
    let back: DriverManagerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
