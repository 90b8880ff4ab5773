//! Router tests over the in-memory ledger.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use walletd_api::{AppState, create_router};
use walletd_core::service::{RetryPolicy, RetryScope, WalletService};
use walletd_core::testing::{InMemoryCache, InMemoryLedger};
use walletd_shared::{JwtService, Money, WalletId};

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    ledger: InMemoryLedger,
    token: String,
}

fn app() -> TestApp {
    let ledger = InMemoryLedger::new().with_wallet(
        WalletId::new(25).unwrap(),
        Money::from_minor_units(1_000_000),
    );
    let policy = RetryPolicy {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(5),
        max_elapsed_time: Duration::from_millis(50),
        scope: RetryScope::ConflictOnly,
    };
    let wallets = WalletService::new(
        Arc::new(ledger.clone()),
        Arc::new(InMemoryCache::new()),
        policy,
    );
    let jwt_service = JwtService::new(SECRET);
    let token = jwt_service
        .issue_token("tester", chrono::Duration::minutes(5))
        .unwrap();

    let state = AppState {
        wallets: Arc::new(wallets),
        jwt_service: Arc::new(jwt_service),
    };

    TestApp {
        router: create_router(state, Duration::from_secs(5)),
        ledger,
        token,
    }
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app();

    let (status, body) = send(&app.router, get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/v1/wallets/25/balance", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");
}

#[tokio::test]
async fn test_wrong_scheme_is_unauthorized() {
    let app = app();
    let auth = format!("Basic {}", app.token);

    let (status, _) = send(&app.router, get("/api/v1/wallets/25/balance", Some(&auth))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_foreign_token_is_unauthorized() {
    let app = app();
    let foreign = JwtService::new("other-secret")
        .issue_token("tester", chrono::Duration::minutes(5))
        .unwrap();
    let auth = format!("Bearer {foreign}");

    let (status, body) = send(&app.router, get("/api/v1/wallets/25/balance", Some(&auth))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = app();
    let expired = JwtService::new(SECRET)
        .issue_token("tester", chrono::Duration::minutes(-10))
        .unwrap();
    let auth = format!("Bearer {expired}");

    let (status, body) = send(&app.router, get("/api/v1/wallets/25/balance", Some(&auth))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn test_get_balance() {
    let app = app();
    let auth = format!("Bearer {}", app.token);

    let (status, body) = send(&app.router, get("/api/v1/wallets/25/balance", Some(&auth))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": { "walletId": 25, "amount": 1_000_000 } }));
}

#[tokio::test]
async fn test_unknown_wallet_is_not_found() {
    let app = app();
    let auth = format!("Bearer {}", app.token);

    let (status, body) = send(&app.router, get("/api/v1/wallets/99/balance", Some(&auth))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "WALLET_NOT_FOUND");
}

#[tokio::test]
async fn test_non_positive_wallet_id_is_bad_request() {
    let app = app();
    let auth = format!("Bearer {}", app.token);

    for uri in ["/api/v1/wallets/0/balance", "/api/v1/wallets/abc/balance"] {
        let (status, body) = send(&app.router, get(uri, Some(&auth))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "INVALID_WALLET_ID");
    }
}

#[tokio::test]
async fn test_debit_returns_new_balance() {
    let app = app();

    let (status, body) = send(
        &app.router,
        post("/api/v1/wallets/25/debit", &app.token, &json!({ "amount": 250_000 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], 1_250_000);
    assert_eq!(
        app.ledger.balance(WalletId::new(25).unwrap()),
        Some(Money::from_minor_units(1_250_000))
    );
}

#[tokio::test]
async fn test_credit_returns_new_balance() {
    let app = app();

    let (status, body) = send(
        &app.router,
        post("/api/v1/wallets/25/credit", &app.token, &json!({ "amount": 250_000 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], 750_000);
}

#[tokio::test]
async fn test_over_balance_credit_is_unprocessable() {
    let app = app();

    let (status, body) = send(
        &app.router,
        post("/api/v1/wallets/25/credit", &app.token, &json!({ "amount": 2_500_000 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "INSUFFICIENT_FUNDS");
    assert_eq!(
        app.ledger.balance(WalletId::new(25).unwrap()),
        Some(Money::from_minor_units(1_000_000))
    );
}

#[tokio::test]
async fn test_non_positive_amount_is_bad_request() {
    let app = app();

    let (status, body) = send(
        &app.router,
        post("/api/v1/wallets/25/debit", &app.token, &json!({ "amount": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_AMOUNT");
    assert_eq!(app.ledger.transactions_opened(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/wallets/25/debit")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"amount\":"))
        .unwrap();

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_BODY");
    assert!(body["message"].is_string());
    assert_eq!(app.ledger.transactions_opened(), 0);
}

#[tokio::test]
async fn test_missing_amount_is_bad_request() {
    let app = app();

    let (status, body) = send(
        &app.router,
        post("/api/v1/wallets/25/credit", &app.token, &json!({ "value": 10 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_BODY");
    assert_eq!(app.ledger.transactions_opened(), 0);
}
