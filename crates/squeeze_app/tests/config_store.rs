use std::fs;
use std::time::Duration;

use squeeze_app::ConfigStore;
use squeeze_core::{Config, Statistics};
use tempfile::TempDir;

fn init_logging() {
    engine_logging::initialize_for_tests();
}

const STATE_FILE: &str = "squeeze_state.ron";

#[test]
fn fresh_directory_yields_defaults() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::open(dir.path());
    assert_eq!(store.config(), &Config::default());
}

#[test]
fn missing_keys_take_their_defaults() {
    init_logging();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(STATE_FILE), "(enabled: false)").unwrap();

    let store = ConfigStore::open(dir.path());
    assert!(!store.config().enabled);
    assert_eq!(store.config().compression_level, 40);
    assert!(store.config().proxy_url.is_empty());
}

#[test]
fn malformed_document_degrades_to_defaults() {
    init_logging();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(STATE_FILE), "not ron at all {{{").unwrap();

    let store = ConfigStore::open(dir.path());
    assert_eq!(store.config(), &Config::default());
}

#[test]
fn set_persists_and_reports_changed_keys() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(dir.path());

    let changes = store.set(Config {
        proxy_url: "https://proxy.example/compress".to_string(),
        compression_level: 70,
        ..Config::default()
    });
    assert!(changes.proxy_url.is_some());
    assert!(changes.compression_level.is_some());
    assert!(changes.enabled.is_none());

    let reopened = ConfigStore::open(dir.path());
    assert_eq!(reopened.config().proxy_url, "https://proxy.example/compress");
    assert_eq!(reopened.config().compression_level, 70);

    // Writing the same configuration again changes nothing.
    let changes = ConfigStore::open(dir.path()).set(reopened.config().clone());
    assert!(changes.is_empty());
}

#[test]
fn retired_proxy_endpoint_is_reset_on_open() {
    init_logging();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(STATE_FILE),
        "(proxy_url: \"https://Compressor.SqueezeImg.com/api\")",
    )
    .unwrap();

    let store = ConfigStore::open(dir.path());
    assert!(store.config().proxy_url.is_empty());

    // The reset was written back, not just applied in memory.
    let reopened = ConfigStore::open(dir.path());
    assert!(reopened.config().proxy_url.is_empty());
}

#[test]
fn burst_statistics_writes_are_deferred_until_flush() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(dir.path());

    let first = Statistics {
        files_processed: 1,
        bytes_processed: 1500,
        bytes_saved: 500,
    };
    store.set_statistics(first);
    assert_eq!(ConfigStore::open(dir.path()).config().statistics, first);

    // A follower inside the write window stays in memory.
    let second = Statistics {
        files_processed: 2,
        bytes_processed: 3000,
        bytes_saved: 1000,
    };
    store.set_statistics(second);
    assert_eq!(ConfigStore::open(dir.path()).config().statistics, first);
    assert_eq!(store.config().statistics, second);

    store.flush();
    assert_eq!(ConfigStore::open(dir.path()).config().statistics, second);
}

#[test]
fn spaced_statistics_writes_go_straight_to_disk() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(dir.path());

    store.set_statistics(Statistics {
        files_processed: 1,
        bytes_processed: 100,
        bytes_saved: 10,
    });
    std::thread::sleep(Duration::from_millis(600));

    let later = Statistics {
        files_processed: 2,
        bytes_processed: 200,
        bytes_saved: 20,
    };
    store.set_statistics(later);
    assert_eq!(ConfigStore::open(dir.path()).config().statistics, later);
}
