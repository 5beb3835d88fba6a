//! Integration tests for the Pledge backend client

#![cfg(feature = "client")]

use pledge_http::client::{ApiClient, ClientError, MemoryTokenStore, Origin, TokenStore};
use pledge_http::types::DonationRequest;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Client pointed at the mock for both origins, recording forced navigations
fn client_for(server: &MockServer, store: Arc<MemoryTokenStore>) -> (ApiClient, Arc<Mutex<Vec<String>>>) {
    let visits = Arc::new(Mutex::new(Vec::new()));
    let recorded = visits.clone();
    let client = ApiClient::builder()
        .app_url(server.uri())
        .service_url(server.uri())
        .token_store(store)
        .navigator(Arc::new(move |location: &str| {
            recorded.lock().unwrap().push(location.to_string());
        }))
        .build()
        .unwrap();
    (client, visits)
}

async fn mount_refresh(server: &MockServer, refresh: &str, access: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(json!({ "refresh": refresh })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": access })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_builder() {
    let client = ApiClient::builder()
        .app_url("http://localhost:8080/")
        .service_url("http://localhost:8081")
        .build()
        .unwrap();

    assert_eq!(client.app_url(), "http://localhost:8080");
    assert_eq!(client.service_url(), "http://localhost:8081");
    assert_eq!(
        client.url(Origin::Service, "/campaigns"),
        "http://localhost:8081/campaigns"
    );
}

#[tokio::test]
async fn test_client_builder_requires_app_url() {
    let result = ApiClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_login_stores_credential_and_later_requests_carry_it() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ana@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("tok1"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let (client, _) = client_for(&server, store.clone());

    let payload = client.login("ana@example.com", "secret").await.unwrap();
    assert_eq!(payload.access(), "tok1");
    assert_eq!(store.get().as_deref(), Some("tok1"));
    assert!(client.is_logged_in());

    let campaigns = client.list_campaigns().await.unwrap();
    assert!(campaigns.is_empty());
}

#[tokio::test]
async fn test_login_never_attaches_stored_credential() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("fresh")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("stale"));
    let (client, _) = client_for(&server, store.clone());

    client.login("ana@example.com", "secret").await.unwrap();
    assert_eq!(store.get().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_rejected_credential_is_refreshed_and_request_replayed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .and(header("authorization", "Bearer tok2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    mount_refresh(&server, "tok1", "tok2", 1).await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    let (client, visits) = client_for(&server, store.clone());

    let campaigns = client.list_campaigns().await.unwrap();
    assert!(campaigns.is_empty());
    assert_eq!(store.get().as_deref(), Some("tok2"));
    assert!(visits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_second_rejection_is_final() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wallet"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "nope" })))
        .expect(2)
        .mount(&server)
        .await;

    mount_refresh(&server, "tok1", "tok2", 1).await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    let (client, visits) = client_for(&server, store.clone());

    let err = client.wallet().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.message(), Some("nope"));

    // The refreshed credential is kept; only a failed refresh ends the session
    assert_eq!(store.get().as_deref(), Some("tok2"));
    assert!(visits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_refresh_ends_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token is invalid or expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    store.set_refresh("ref1".to_string());
    let (client, visits) = client_for(&server, store.clone());

    let err = client.my_profile().await.unwrap_err();
    assert!(err.is_session_ended());
    assert_eq!(err.message(), Some("Token is invalid or expired"));

    assert_eq!(store.get(), None);
    assert_eq!(store.get_refresh(), None);
    assert_eq!(*visits.lock().unwrap(), vec!["/auth/login".to_string()]);
}

#[tokio::test]
async fn test_refresh_presents_separate_refresh_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wallet/transactions"))
        .and(header("authorization", "Bearer access1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wallet/transactions"))
        .and(header("authorization", "Bearer access2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    mount_refresh(&server, "ref1", "access2", 1).await;

    let store = Arc::new(MemoryTokenStore::with_token("access1"));
    store.set_refresh("ref1".to_string());
    let (client, _) = client_for(&server, store.clone());

    let transactions = client.transactions().await.unwrap();
    assert!(transactions.is_empty());
    assert_eq!(store.get_refresh().as_deref(), Some("ref1"));
}

#[tokio::test]
async fn test_unauthenticated_rejection_is_not_refreshed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .expect(1)
        .mount(&server)
        .await;

    mount_refresh(&server, "unused", "unused", 0).await;

    let store = Arc::new(MemoryTokenStore::new());
    let (client, visits) = client_for(&server, store.clone());

    let err = client.list_campaigns().await.unwrap_err();
    assert!(err.is_unauthorized());

    let err = client.login("ana@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.message(), Some("Invalid credentials"));

    assert!(visits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let server = MockServer::start().await;

    for route in ["/campaigns", "/campaigns/user"] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer tok2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "tok2" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    let (client, _) = client_for(&server, store.clone());

    let (all, mine) = tokio::join!(client.list_campaigns(), client.list_my_campaigns());
    assert!(all.unwrap().is_empty());
    assert!(mine.unwrap().is_empty());
    assert_eq!(store.get().as_deref(), Some("tok2"));
}

#[tokio::test]
async fn test_validation_error_keeps_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/campaigns/7/donations"))
        .and(body_json(json!({ "amount": 0.5, "message": "go!" })))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Amount too small" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    let (client, _) = client_for(&server, store.clone());

    let err = client
        .donate(
            7,
            &DonationRequest {
                amount: 0.5,
                message: "go!".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.message(), Some("Amount too small"));
    assert_eq!(store.get().as_deref(), Some("tok1"));
}

#[tokio::test]
async fn test_empty_success_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/campaigns/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/notifications/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    let (client, _) = client_for(&server, store);

    client.delete_campaign(3).await.unwrap();
    client.mark_notification_read(9).await.unwrap();
}

#[tokio::test]
async fn test_origins_are_routed_separately() {
    let app = MockServer::start().await;
    let service = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "Ana",
            "email": "ana@example.com",
            "phone": "0800",
            "role": "user"
        })))
        .expect(1)
        .mount(&app)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/notifications/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&service)
        .await;

    let client = ApiClient::builder()
        .app_url(app.uri())
        .service_url(service.uri())
        .token_store(Arc::new(MemoryTokenStore::with_token("tok1")))
        .build()
        .unwrap();

    let profile = client.my_profile().await.unwrap();
    assert_eq!(profile.name, "Ana");
    assert!(client.notifications().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_timeout_is_reported_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wallet"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "balance": 10 }))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_refresh(&server, "tok1", "tok2", 0).await;

    let client = ApiClient::builder()
        .app_url(server.uri())
        .timeout(Duration::from_millis(200))
        .token_store(Arc::new(MemoryTokenStore::with_token("tok1")))
        .build()
        .unwrap();

    let err = client.wallet().await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_stored_credential_overrides_caller_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/campaigns/1"))
        .respond_with(|request: &Request| {
            let values: Vec<_> = request
                .headers
                .get_all("authorization")
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect();
            if values == ["Bearer tok1"] {
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true }))
            } else {
                ResponseTemplate::new(400)
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    let (client, _) = client_for(&server, store);

    let request = pledge_http::client::ApiRequest::get(Origin::Service, "/campaigns/1").header(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_static("Bearer caller"),
    );
    let body: serde_json::Value = client.execute(request).await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_failed_shared_refresh_ends_session_once() {
    let server = MockServer::start().await;

    for route in ["/campaigns", "/campaigns/user"] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Token is invalid or expired" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("tok1"));
    let (client, visits) = client_for(&server, store.clone());

    let (all, mine) = tokio::join!(client.list_campaigns(), client.list_my_campaigns());
    let errors = [all.unwrap_err(), mine.unwrap_err()];

    // One request ran the refresh and got its error, the other found the
    // session already gone
    assert_eq!(
        errors.iter().filter(|e| matches!(e, ClientError::SessionExpired)).count(),
        1
    );
    assert_eq!(errors.iter().filter(|e| e.is_unauthorized()).count(), 1);
    assert!(errors.iter().all(ClientError::is_session_ended));

    assert_eq!(store.get(), None);
    assert_eq!(*visits.lock().unwrap(), vec!["/auth/login".to_string()]);
}

#[tokio::test]
async fn test_rotated_refresh_credential_is_stored() {
    let server = MockServer::start().await;

    for route in ["/wallet", "/wallet/transactions"] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer a2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(json!({ "refresh": "r1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "a2", "refresh": "r2" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("a1"));
    store.set_refresh("r1".to_string());
    let (client, visits) = client_for(&server, store.clone());

    let (balance, history) = tokio::join!(client.wallet(), client.transactions());
    assert_eq!(balance.unwrap(), json!([]));
    assert!(history.unwrap().is_empty());

    assert_eq!(store.get().as_deref(), Some("a2"));
    assert_eq!(store.get_refresh().as_deref(), Some("r2"));
    assert_eq!(store.refresh_credential().as_deref(), Some("r2"));
    assert!(visits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_timeout_disables_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wallet"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "balance": 10 }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = pledge_http::config::ClientSettings {
        app_url: server.uri(),
        service_url: server.uri(),
        timeout_secs: 0,
        ..Default::default()
    };
    let client = ApiClient::builder()
        .settings(&settings)
        .token_store(Arc::new(MemoryTokenStore::with_token("tok1")))
        .build()
        .unwrap();

    let wallet = client.wallet().await.unwrap();
    assert_eq!(wallet["balance"], 10);
}
