use std::sync::{Arc, Mutex};
use std::time::Duration;

use squeeze_app::{ConfigStore, Indicator, LogIndicator, RedirectDecision, Session};
use squeeze_core::{Config, Header, RedirectCapability, ResourceType, SessionState, Statistics};
use squeeze_engine::{EngineHandle, ImageProber, ProbeError, ProbeVerdict};
use tempfile::TempDir;

fn init_logging() {
    engine_logging::initialize_for_tests();
}

const PROXY: &str = "https://proxy.example/compress";
const IMAGE: &str = "https://images.example/pic.png";
const PAGE: &str = "https://news.example/article";

fn proxied_config() -> Config {
    Config {
        proxy_url: PROXY.to_string(),
        ..Config::default()
    }
}

fn open_session(dir: &TempDir, config: Config, capability: RedirectCapability) -> Session {
    let mut store = ConfigStore::open(dir.path());
    store.set(config);
    Session::new(store, capability)
}

fn expect_redirect(decision: RedirectDecision) -> String {
    match decision {
        RedirectDecision::Redirect(target) => target,
        RedirectDecision::None => panic!("expected a redirect, request passed unmodified"),
        RedirectDecision::Deferred(_) => panic!("expected a synchronous redirect"),
    }
}

#[test]
fn immediate_session_redirects_once_per_page() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let session = open_session(&dir, proxied_config(), RedirectCapability::Immediate);

    let target = expect_redirect(session.on_before_request(IMAGE, PAGE, ResourceType::Image));
    assert!(target.starts_with(PROXY));
    assert!(target.contains("url=https%3A%2F%2Fimages.example%2Fpic.png"));

    // Dedup-blocked within the same page view.
    assert!(matches!(
        session.on_before_request(IMAGE, PAGE, ResourceType::Image),
        RedirectDecision::None
    ));

    // Eligible again after an in-tab update.
    session.on_tab_updated();
    expect_redirect(session.on_before_request(IMAGE, PAGE, ResourceType::Image));
}

#[test]
fn detached_session_drops_hook_traffic_until_enabled() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let config = Config {
        enabled: false,
        ..proxied_config()
    };
    let session = open_session(&dir, config.clone(), RedirectCapability::Immediate);
    assert_eq!(session.view().session, SessionState::Detached);

    assert!(matches!(
        session.on_before_request(IMAGE, PAGE, ResourceType::Image),
        RedirectDecision::None
    ));

    // A settings edit flows back in as a change notification and attaches.
    session.apply_settings(Config {
        enabled: true,
        ..config
    });
    assert_eq!(session.view().session, SessionState::Attached);
    expect_redirect(session.on_before_request(IMAGE, PAGE, ResourceType::Image));
}

#[test]
fn statistics_survive_a_store_reopen() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let session = open_session(&dir, proxied_config(), RedirectCapability::Immediate);

    session.on_response_completed(
        vec![
            Header::new("x-bytes-saved", "500"),
            Header::new("x-original-size", "1500"),
        ],
        false,
    );
    // Cached completions must not double-count.
    session.on_response_completed(
        vec![
            Header::new("x-bytes-saved", "500"),
            Header::new("x-original-size", "1500"),
        ],
        true,
    );

    let expected = Statistics {
        files_processed: 1,
        bytes_processed: 1500,
        bytes_saved: 500,
    };
    assert_eq!(session.view().statistics, expected);

    session.flush();
    drop(session);
    assert_eq!(ConfigStore::open(dir.path()).config().statistics, expected);
}

struct StaticProber(Result<ProbeVerdict, ProbeError>);

#[async_trait::async_trait]
impl ImageProber for StaticProber {
    async fn probe(&self, _url: &str) -> Result<ProbeVerdict, ProbeError> {
        self.0.clone()
    }
}

fn deferred_session(dir: &TempDir, verdict: ProbeVerdict) -> Session {
    let mut store = ConfigStore::open(dir.path());
    store.set(proxied_config());
    Session::with_parts(
        store,
        RedirectCapability::Deferred,
        EngineHandle::with_prober(Arc::new(StaticProber(Ok(verdict)))),
        Box::new(LogIndicator::default()),
    )
}

#[test]
fn deferred_session_commits_after_probe_confirmation() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let session = deferred_session(&dir, ProbeVerdict::Redirect);

    let decision = session.on_before_request(IMAGE, PAGE, ResourceType::Image);
    let RedirectDecision::Deferred(deferred) = decision else {
        panic!("expected a deferred decision");
    };
    let target = deferred.wait(Duration::from_secs(5)).expect("redirect");
    assert!(target.starts_with(PROXY));
}

#[test]
fn deferred_session_backs_off_when_probe_disqualifies() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let session = deferred_session(&dir, ProbeVerdict::NoRedirect);

    let decision = session.on_before_request(IMAGE, PAGE, ResourceType::Image);
    let RedirectDecision::Deferred(deferred) = decision else {
        panic!("expected a deferred decision");
    };
    assert_eq!(deferred.wait(Duration::from_secs(5)), None);
}

#[test]
fn headers_received_admits_the_proxy_origin() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let session = open_session(&dir, proxied_config(), RedirectCapability::Immediate);

    let patched = session.on_headers_received(vec![Header::new(
        "content-security-policy",
        "img-src 'self'",
    )]);
    assert_eq!(patched[0].value, "img-src 'self' https://proxy.example");
}

#[test]
fn startup_without_a_proxy_requests_the_setup_surface() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let session = open_session(&dir, Config::default(), RedirectCapability::Immediate);
    assert!(!session.setup_requested());

    session.on_install_startup();
    assert!(session.setup_requested());
}

struct RecordingIndicator(Arc<Mutex<Vec<bool>>>);

impl Indicator for RecordingIndicator {
    fn set_enabled(&mut self, enabled: bool) {
        self.0.lock().unwrap().push(enabled);
    }
}

#[test]
fn activating_an_opted_out_tab_reports_a_disabled_indicator() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(dir.path());
    store.set(Config {
        disabled_hosts: vec!["blocked.example".to_string()],
        ..proxied_config()
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let session = Session::with_parts(
        store,
        RedirectCapability::Immediate,
        EngineHandle::with_prober(Arc::new(StaticProber(Ok(ProbeVerdict::NoRedirect)))),
        Box::new(RecordingIndicator(seen.clone())),
    );

    session.on_tab_activated("https://blocked.example/story");
    assert_eq!(seen.lock().unwrap().last(), Some(&false));

    session.on_tab_activated("https://news.example/article");
    assert_eq!(seen.lock().unwrap().last(), Some(&true));
}
