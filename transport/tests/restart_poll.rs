//! Integration tests for restart readiness polling.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wharf_transport::{
    DigestClient, RequestParams, RestartPoller, StaticCredentials, TransportError,
};

/// Interval short enough to keep the 10-attempt bound test quick.
const TICK: Duration = Duration::from_millis(5);

fn poller(server_uri: &str) -> RestartPoller {
    let client = DigestClient::new(Arc::new(StaticCredentials::new("admin", "hunter2")));
    let admin = RequestParams::new(server_uri).unwrap();
    RestartPoller::new(client, admin).with_interval(TICK)
}

fn timestamp(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body, "text/plain")
}

#[tokio::test]
async fn test_restart_completes_once_the_timestamp_advances() {
    let server = MockServer::start().await;
    // First poll sees the server still down, second sees the fresh timestamp.
    Mock::given(method("GET"))
        .and(path("/timestamp"))
        .respond_with(timestamp(503, ""))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/timestamp"))
        .respond_with(timestamp(200, "2026-08-23T10:00:05+00:00"))
        .mount(&server)
        .await;

    let previous = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
    let now = poller(&server.uri()).wait_for_restart(previous).await.unwrap();

    assert_eq!(now, Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 5).unwrap());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_stale_timestamp_fails_verification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/timestamp"))
        .respond_with(timestamp(503, ""))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    // Back up, but the timestamp never moved: the restart did not happen.
    Mock::given(method("GET"))
        .and(path("/timestamp"))
        .respond_with(timestamp(200, "2026-08-23T10:00:00+00:00"))
        .mount(&server)
        .await;

    let previous = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
    let err = poller(&server.uri()).wait_for_restart(previous).await.unwrap_err();

    assert!(matches!(err, TransportError::RestartVerification(_)), "got: {err}");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_polling_gives_up_after_ten_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/timestamp"))
        .respond_with(timestamp(503, ""))
        .mount(&server)
        .await;

    let previous = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
    let err = poller(&server.uri()).wait_for_restart(previous).await.unwrap_err();

    assert!(matches!(err, TransportError::RestartTimeout { attempts: 10 }), "got: {err}");
    assert_eq!(server.received_requests().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_unexpected_status_is_fatal_on_first_sight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/timestamp"))
        .respond_with(timestamp(404, "no such endpoint"))
        .mount(&server)
        .await;

    let previous = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
    let err = poller(&server.uri()).wait_for_restart(previous).await.unwrap_err();

    assert!(matches!(err, TransportError::RestartVerification(_)), "got: {err}");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unparseable_timestamp_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/timestamp"))
        .respond_with(timestamp(200, "tomorrow, probably"))
        .mount(&server)
        .await;

    let previous = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
    let err = poller(&server.uri()).wait_for_restart(previous).await.unwrap_err();

    assert!(matches!(err, TransportError::RestartVerification(_)), "got: {err}");
}

#[tokio::test]
async fn test_connection_refused_counts_as_still_restarting() {
    // Grab a port with no listener behind it.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let previous = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
    let err = poller(&format!("http://127.0.0.1:{port}"))
        .with_max_attempts(3)
        .wait_for_restart(previous)
        .await
        .unwrap_err();

    // Refused connections are retried until the bound, not surfaced raw.
    assert!(matches!(err, TransportError::RestartTimeout { attempts: 3 }), "got: {err}");
}
