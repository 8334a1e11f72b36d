use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use squeeze_engine::{
    EngineEvent, EngineHandle, ImageProber, ProbeError, ProbeFailure, ProbeSettings,
    ProbeVerdict, ReqwestProber,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prober() -> ReqwestProber {
    ReqwestProber::new(ProbeSettings::default())
}

#[tokio::test]
async fn large_image_response_earns_a_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/pic"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 2048], "image/png"))
        .mount(&server)
        .await;

    let url = format!("{}/pic", server.uri());
    let verdict = prober().probe(&url).await.expect("probe ok");
    assert_eq!(verdict, ProbeVerdict::Redirect);
}

#[tokio::test]
async fn missing_target_is_not_redirected() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let verdict = prober().probe(&url).await.expect("probe ok");
    assert_eq!(verdict, ProbeVerdict::NoRedirect);
}

#[tokio::test]
async fn method_not_allowed_redirects_anyway() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    let url = format!("{}/no-head", server.uri());
    let verdict = prober().probe(&url).await.expect("probe ok");
    assert_eq!(verdict, ProbeVerdict::Redirect);
}

#[tokio::test]
async fn small_images_stay_on_the_direct_path() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/tiny"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 500], "image/png"))
        .mount(&server)
        .await;

    let url = format!("{}/tiny", server.uri());
    let verdict = prober().probe(&url).await.expect("probe ok");
    assert_eq!(verdict, ProbeVerdict::NoRedirect);
}

#[tokio::test]
async fn threshold_size_is_exclusive() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/edge"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 1024], "image/png"))
        .mount(&server)
        .await;

    let url = format!("{}/edge", server.uri());
    let verdict = prober().probe(&url).await.expect("probe ok");
    assert_eq!(verdict, ProbeVerdict::NoRedirect);
}

#[tokio::test]
async fn non_image_content_type_is_not_redirected() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 2048], "text/html"))
        .mount(&server)
        .await;

    let url = format!("{}/page", server.uri());
    let verdict = prober().probe(&url).await.expect("probe ok");
    assert_eq!(verdict, ProbeVerdict::NoRedirect);
}

#[tokio::test]
async fn headerless_success_is_not_redirected() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/bare", server.uri());
    let verdict = prober().probe(&url).await.expect("probe ok");
    assert_eq!(verdict, ProbeVerdict::NoRedirect);
}

#[tokio::test]
async fn slow_probe_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw(vec![0u8; 2048], "image/png"),
        )
        .mount(&server)
        .await;

    let settings = ProbeSettings {
        request_timeout: Duration::from_millis(50),
        ..ProbeSettings::default()
    };
    let url = format!("{}/slow", server.uri());
    let err = ReqwestProber::new(settings).probe(&url).await.unwrap_err();
    assert_eq!(err.kind, ProbeFailure::Timeout);
}

#[tokio::test]
async fn unparsable_url_fails_without_a_request() {
    let err = prober().probe("not a url").await.unwrap_err();
    assert_eq!(err.kind, ProbeFailure::InvalidUrl);
}

struct StaticProber(Result<ProbeVerdict, ProbeError>);

#[async_trait::async_trait]
impl ImageProber for StaticProber {
    async fn probe(&self, _url: &str) -> Result<ProbeVerdict, ProbeError> {
        self.0.clone()
    }
}

#[test]
fn engine_handle_round_trips_probe_events() {
    let engine = EngineHandle::with_prober(Arc::new(StaticProber(Ok(ProbeVerdict::Redirect))));
    engine.probe(7, 3, "https://images.example/pic.png");

    let mut event = None;
    for _ in 0..200 {
        if let Some(received) = engine.try_recv() {
            event = Some(received);
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(
        event,
        Some(EngineEvent::ProbeResolved {
            request_id: 7,
            epoch: 3,
            result: Ok(ProbeVerdict::Redirect),
        })
    );
}
