//! Request pipeline tests: resolution, headers, timeouts and backoff.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CountingAuth, FakeTransport, NOW, Step, config, json, refused, seed_session, token};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use lemon_core::error::{HttpError, NetworkError};
use lemon_core::{Error, MemoryStore, RequestOptions, SessionManager, TestClock, TokenType};

fn manager(transport: Arc<FakeTransport>, storage: Arc<MemoryStore>) -> SessionManager {
    SessionManager::with_clock(
        config(),
        storage,
        transport,
        CountingAuth::new(),
        Arc::new(TestClock::new(NOW)),
    )
}

fn assert_close(actual: Duration, expected: Duration) {
    let tolerance = Duration::from_millis(5);
    assert!(
        actual >= expected && actual <= expected + tolerance,
        "expected ~{expected:?}, waited {actual:?}"
    );
}

fn signed_in_storage() -> (Arc<MemoryStore>, String) {
    let storage = Arc::new(MemoryStore::new());
    let access = token(TokenType::Access, NOW, NOW + 3600, "a");
    let refresh = token(TokenType::Refresh, NOW, NOW + 604_800, "r");
    seed_session(&storage, &access, &refresh);
    (storage, access)
}

#[tokio::test(start_paused = true)]
async fn test_transport_failures_back_off_exponentially() {
    let transport = FakeTransport::new(|n, _| match n {
        0 | 1 => Step::Reply(Err(refused())),
        _ => Step::Reply(Ok(json(StatusCode::OK, r#"{"ok":true}"#))),
    });
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));

    let response = manager.client().get("/menu/items").await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let times = transport.call_times();
    assert_eq!(times.len(), 3);
    assert_close(times[1] - times[0], Duration::from_millis(1000));
    assert_close(times[2] - times[1], Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_bounded() {
    let transport = FakeTransport::new(|_, _| Step::Reply(Err(refused())));
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));

    let err = manager.client().get("/menu/items").await.unwrap_err();

    assert!(matches!(
        err,
        Error::Network(NetworkError::Connection { .. })
    ));
    // First attempt plus three retries.
    assert_eq!(transport.call_count(), 4);
    assert_eq!(
        err.user_message(),
        "Network error. Please check your connection."
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_are_retried() {
    let transport = FakeTransport::new(|n, _| match n {
        0 => Step::After(
            Duration::from_secs(30),
            Ok(json(StatusCode::OK, r#"{"late":true}"#)),
        ),
        _ => Step::Reply(Ok(json(StatusCode::OK, r#"{"late":false}"#))),
    });
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));

    let body: serde_json::Value = manager.client().get_json("/restaurant/info").await.unwrap();

    assert_eq!(body["late"], false);
    let times = transport.call_times();
    assert_eq!(times.len(), 2);
    // 10s timeout, then a 1s backoff.
    assert_close(times[1] - times[0], Duration::from_secs(11));
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_timing_out_surfaces_timeout() {
    let transport = FakeTransport::new(|_, _| {
        Step::After(Duration::from_secs(60), Ok(json(StatusCode::OK, "{}")))
    });
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));

    let err = manager.client().get("/menu/items").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "network error: request timed out after 10000ms"
    );
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_error_statuses_are_not_retried() {
    let transport = FakeTransport::new(|_, _| {
        Step::Reply(Ok(json(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message":"Kitchen on fire"}"#,
        )))
    });
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));

    let err = manager.client().get("/menu/items").await.unwrap_err();

    match &err {
        Error::Http(HttpError { status, message }) => {
            assert_eq!(*status, 500);
            assert_eq!(message.as_deref(), Some("Kitchen on fire"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "Kitchen on fire");
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_status_without_body_maps_to_category() {
    let transport =
        FakeTransport::new(|_, _| Step::Reply(Ok(json(StatusCode::SERVICE_UNAVAILABLE, ""))));
    let manager = manager(transport, Arc::new(MemoryStore::new()));

    let err = manager.client().get("/menu/items").await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "Service temporarily unavailable. Please try again later."
    );
}

#[tokio::test]
async fn test_headers_are_merged_and_bearer_attached() {
    let (storage, access) = signed_in_storage();
    let transport = FakeTransport::ok();
    let manager = manager(transport.clone(), storage);

    let options = RequestOptions::new(Method::POST)
        .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .header(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="))
        .with_body("hello");
    manager.client().request("/feedback/submit", options).await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    assert_eq!(request.headers.get(ACCEPT).unwrap(), "application/json");
    assert_eq!(
        request.headers.get(AUTHORIZATION).unwrap().to_str().unwrap(),
        format!("Bearer {access}")
    );
    assert_eq!(request.body.as_deref(), Some(b"hello".as_slice()));
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_bearer() {
    let transport = FakeTransport::ok();
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));

    manager.client().get("/menu/items").await.unwrap();

    let request = &transport.requests()[0];
    assert!(request.headers.get(AUTHORIZATION).is_none());
    assert_eq!(
        request.headers.get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_targets_resolve_against_base() {
    let transport = FakeTransport::ok();
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));

    manager.client().get("/menu/items").await.unwrap();
    manager.client().get("menu/items").await.unwrap();
    manager
        .client()
        .get("https://cdn.littlelemon.example/logo.json")
        .await
        .unwrap();

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        [
            "http://localhost:3000/api/menu/items",
            "http://localhost:3000/api/menu/items",
            "https://cdn.littlelemon.example/logo.json",
        ]
    );
}

#[tokio::test]
async fn test_401_without_token_is_plain_http_error() {
    let transport =
        FakeTransport::new(|_, _| Step::Reply(Ok(json(StatusCode::UNAUTHORIZED, "{}"))));
    let auth = CountingAuth::new();
    let manager = SessionManager::with_clock(
        config(),
        Arc::new(MemoryStore::new()),
        transport.clone(),
        auth.clone(),
        Arc::new(TestClock::new(NOW)),
    );

    let err = manager.client().get("/user/profile").await.unwrap_err();

    assert!(matches!(err, Error::Http(HttpError { status: 401, .. })));
    assert_eq!(auth.refresh_count(), 0);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_typed_endpoints_use_configured_paths() {
    let transport = FakeTransport::new(|_, request| {
        let body = if request.url.ends_with("/menu/items") {
            r#"[{"title":"Mains","data":[{"name":"Kofta Burger","price":"$5.99"}]}]"#
        } else {
            r#"{"id":1,"email":"demo@example.com","name":"Little Lemon User"}"#
        };
        Step::Reply(Ok(json(StatusCode::OK, body)))
    });
    let manager = manager(transport.clone(), Arc::new(MemoryStore::new()));
    let api = manager.api();

    let menu = api.get_menu_items().await.unwrap();
    let profile = api.get_user_profile().await.unwrap();

    assert_eq!(menu[0].items[0].name, "Kofta Burger");
    assert_eq!(profile.name, "Little Lemon User");
    let requests = transport.requests();
    assert_eq!(requests[1].url, "http://localhost:3000/api/user/profile");
    assert_eq!(requests[1].method, Method::GET);
}
