//! Authenticated request pipeline tests
//!
//! The fake backend counts calls per mock, so retry and refresh bounds are
//! checked by wiremock's expectations when the server is dropped.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::*;
use leadhub::client::RequestOptions;
use leadhub::shared::error::ClientError;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_success_is_returned_without_refresh() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A1", "R1");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", auth_header("A1").as_str()))
        .and(header_exists("x-device-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;

    let response = assert_ok!(
        backend
            .client
            .authed_fetch(LEADS_PATH, RequestOptions::get())
            .await
    );
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "[]");
}

#[tokio::test]
async fn test_non_401_errors_are_returned_verbatim() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A1", "R1");

    for status in [403u16, 404, 500] {
        let target = format!("/api/v1/status-{}", status);
        Mock::given(method("GET"))
            .and(path(target.as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"detail": "nope"})))
            .expect(1)
            .mount(&backend.server)
            .await;

        let response = backend
            .client
            .authed_fetch(&target, RequestOptions::get())
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), status);
    }

    assert!(backend.requests_to(REFRESH_PATH).await.is_empty());
    assert_eq!(
        stored_pair(backend.store.as_ref()),
        (Some("A1".to_string()), Some("R1".to_string()))
    );
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_and_replayed() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R1");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A_old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(header_exists("x-device-id"))
        .and(body_json(json!({"refresh_token": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&backend.server)
        .await;

    let response = backend
        .client
        .authed_fetch(LEADS_PATH, RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        stored_pair(backend.store.as_ref()),
        (Some("A2".to_string()), Some("R2".to_string()))
    );
}

#[tokio::test]
async fn test_retry_replays_method_and_body() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R1");

    Mock::given(method("POST"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A_old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")))
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .mount(&backend.server)
        .await;

    let options = RequestOptions::post()
        .json(&json!({"full_name": "Jo Buyer", "channel": "web", "raw_message": "3 bed"}))
        .unwrap()
        .header("x-request-source", "dashboard")
        .unwrap();
    let response = backend.client.authed_fetch(LEADS_PATH, options).await.unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let attempts = backend.requests_to(LEADS_PATH).await;
    assert_eq!(attempts.len(), 2);
    let (first, second) = (&attempts[0], &attempts[1]);

    assert_eq!(first.method.as_str(), second.method.as_str());
    assert_eq!(first.body, second.body);
    for name in ["content-type", "x-request-source", "x-device-id"] {
        assert_eq!(header_value(first, name), header_value(second, name), "{}", name);
    }
    assert_eq!(header_value(first, "authorization").as_deref(), Some("Bearer A_old"));
    assert_eq!(header_value(second, "authorization").as_deref(), Some("Bearer A2"));
    assert_eq!(
        header_value(second, "x-device-id"),
        Some(backend.client.device_id())
    );
}

#[tokio::test]
async fn test_retry_that_is_still_unauthorized_is_returned() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R1");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")))
        .expect(1)
        .mount(&backend.server)
        .await;

    let response = backend
        .client
        .authed_fetch(LEADS_PATH, RequestOptions::get())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(
        stored_pair(backend.store.as_ref()),
        (Some("A2".to_string()), Some("R2".to_string()))
    );
}

#[tokio::test]
async fn test_dead_refresh_token_fails_with_session_expired() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R_dead");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Session invalid"})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let result = backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()).await;
    let error = result.unwrap_err();
    assert_matches!(error, ClientError::SessionExpired { status: 401 });
    assert!(error.is_auth_error());

    assert_eq!(
        stored_pair(backend.store.as_ref()),
        (Some("A_old".to_string()), Some("R_dead".to_string()))
    );
}

#[tokio::test]
async fn test_no_session_fails_before_refresh_call() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(NoAuthorization)
        .and(header_exists("x-device-id"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")))
        .expect(0)
        .mount(&backend.server)
        .await;

    let result = backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()).await;
    assert_matches!(result, Err(ClientError::NoRefreshToken));
    assert_eq!(stored_pair(backend.store.as_ref()), (None, None));
}

#[tokio::test]
async fn test_concurrent_unauthorized_calls_share_one_refresh() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R1");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A_old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1..=2)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("A2", "R2"))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&backend.server)
        .await;

    let (first, second) = tokio::join!(
        backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()),
        backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()),
    );

    assert_eq!(first.unwrap().status().as_u16(), 200);
    assert_eq!(second.unwrap().status().as_u16(), 200);
    assert_eq!(backend.client.credentials().access_token(), "A2");
}

#[tokio::test]
async fn test_concurrent_calls_share_one_rejected_refresh() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R_dead");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(50)))
        .expect(1)
        .mount(&backend.server)
        .await;

    let (first, second) = tokio::join!(
        backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()),
        backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()),
    );

    assert_matches!(first, Err(ClientError::SessionExpired { status: 401 }));
    assert_matches!(second, Err(ClientError::SessionExpired { status: 401 }));
    assert_eq!(backend.requests_to(REFRESH_PATH).await.len(), 1);
}

#[tokio::test]
async fn test_new_session_is_refreshed_after_rejection() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R_dead");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A_old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({"refresh_token": "R_dead"})))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({"refresh_token": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A2", "R2")))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backend.server)
        .await;

    let first = backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()).await;
    assert_matches!(first, Err(ClientError::SessionExpired { .. }));
    let again = backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()).await;
    assert_matches!(again, Err(ClientError::SessionExpired { .. }));

    seed_session(backend.store.as_ref(), "A1", "R1");
    let response = backend
        .client
        .authed_fetch(LEADS_PATH, RequestOptions::get())
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_server_error_on_refresh_is_tried_again() {
    let backend = TestBackend::start().await;
    seed_session(backend.store.as_ref(), "A_old", "R1");

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&backend.server)
        .await;

    for _ in 0..2 {
        let result = backend.client.authed_fetch(LEADS_PATH, RequestOptions::get()).await;
        assert_matches!(result, Err(ClientError::SessionExpired { status: 503 }));
    }
}

#[tokio::test]
async fn test_network_failure_is_not_retried() {
    let backend = TestBackend::start().await;
    let unreachable = client_for("http://127.0.0.1:1", backend.store.clone());
    seed_session(backend.store.as_ref(), "A1", "R1");

    let result = unreachable.authed_fetch(LEADS_PATH, RequestOptions::get()).await;
    let error = result.unwrap_err();
    assert_matches!(error, ClientError::Network(_));
    assert!(!error.is_auth_error());
}

#[tokio::test]
async fn test_per_attempt_timeout() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(LEADS_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&backend.server)
        .await;

    let options = RequestOptions::get().timeout(Duration::from_millis(50));
    let result = backend.client.authed_fetch(LEADS_PATH, options).await;
    match result {
        Err(ClientError::Network(e)) => assert!(e.is_timeout()),
        other => panic!("Expected timeout, got {:?}", other.map(|r| r.status())),
    }
}

#[tokio::test]
async fn test_device_id_is_stable_across_requests() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&backend.server)
        .await;

    backend.client.authed_fetch("/api/v1/a", RequestOptions::get()).await.unwrap();
    backend.client.authed_fetch("/api/v1/b", RequestOptions::get()).await.unwrap();

    let a = backend.requests_to("/api/v1/a").await;
    let b = backend.requests_to("/api/v1/b").await;
    let expected = Some(backend.client.device_id());
    assert_eq!(header_value(&a[0], "x-device-id"), expected);
    assert_eq!(header_value(&b[0], "x-device-id"), expected);
}
