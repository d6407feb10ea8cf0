mod common;

use std::fs;

use common::temp_base;
use site_ledger::config::{Config, ConfigManager};

#[test]
fn missing_config_yields_defaults() {
    let manager = ConfigManager::with_base_dir(&temp_base()).unwrap();
    let config = manager.load().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.read_attempts, 3);
    assert_eq!(config.read_backoff_ms, 1000);
    assert_eq!(config.labor_default_amount, 400.0);
}

#[test]
fn saved_config_is_loaded_back() {
    let base = temp_base();
    let manager = ConfigManager::with_base_dir(&base).unwrap();
    let config = Config {
        track_stages: true,
        store_path: Some("obra/ledger.json".into()),
        ..Config::default()
    };
    manager.save(&config).unwrap();

    assert_eq!(manager.load().unwrap(), config);
    assert_eq!(
        config.resolve_store_path(&base),
        base.join("obra").join("ledger.json")
    );
}

#[test]
fn partial_config_fills_in_defaults() {
    let base = temp_base();
    let manager = ConfigManager::with_base_dir(&base).unwrap();
    fs::write(manager.path(), r#"{ "currency_symbol": "€" }"#).unwrap();

    let config = manager.load().unwrap();
    assert_eq!(config.currency_symbol, "€");
    assert!(!config.track_stages);
    assert_eq!(config.resolve_store_path(&base), base.join("ledger.json"));
}

#[test]
fn malformed_config_is_an_error() {
    let manager = ConfigManager::with_base_dir(&temp_base()).unwrap();
    fs::write(manager.path(), "track_stages = true").unwrap();
    assert!(manager.load().is_err());
}
