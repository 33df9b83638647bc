//! API tests against an in-process router over the memory backend

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use jigyasa_server::config::{
    AppConfig, CacheConfig, ConfirmConfig, LoggingConfig, ServerConfig, StorageConfig,
};
use jigyasa_server::models::{Book, Member};
use jigyasa_server::services::Services;
use jigyasa_server::storage::memory::MemoryStorage;
use jigyasa_server::{api, AppState};

fn app() -> Router {
    let storage = Arc::new(MemoryStorage::new());
    storage.seed_book(Book {
        id: 1,
        title: "Gitanjali".to_string(),
        available_copies: 1,
    });
    storage.seed_book(Book {
        id: 2,
        title: "Godan".to_string(),
        available_copies: 2,
    });
    storage.seed_member(Member {
        id: 1,
        name: "Asha".to_string(),
    });

    let config = AppConfig {
        server: ServerConfig::default(),
        storage: StorageConfig::default(),
        cache: CacheConfig { ttl_seconds: 60 },
        confirm: ConfirmConfig {
            token_ttl_seconds: 120,
        },
        logging: LoggingConfig::default(),
    };
    let services = Services::new(storage, &config.cache, &config.confirm);

    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body read failed")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body was not JSON")
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let router = app();
    let (status, body) = send(&router, get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn readiness_check() {
    let router = app();
    let (status, body) = send(&router, get("/api/v1/ready")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn lend_then_list_recent() {
    let router = app();

    let (status, body) = send(
        &router,
        post(
            "/api/v1/transactions",
            json!({"book_id": 1, "member_id": 1, "borrow_date": "2024-01-01"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["due_date"], "2024-01-15");

    let (status, body) = send(&router, get("/api/v1/books/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_copies"], 0);

    let (status, body) = send(&router, get("/api/v1/transactions?limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    let recent = body.as_array().expect("array body");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["book_title"], "Gitanjali");
    assert_eq!(recent[0]["member_name"], "Asha");
    assert_eq!(recent[0]["return_date"], Value::Null);
}

#[tokio::test]
async fn lend_with_no_copies_is_conflict() {
    let router = app();

    let (status, _) = send(
        &router,
        post(
            "/api/v1/transactions",
            json!({"book_id": 1, "member_id": 1, "borrow_date": "2024-01-01"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &router,
        post(
            "/api/v1/transactions",
            json!({"book_id": 1, "member_id": 1, "borrow_date": "2024-01-02"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NoCopiesAvailable");
}

#[tokio::test]
async fn lend_unknown_book_is_not_found() {
    let router = app();

    let (status, body) = send(
        &router,
        post(
            "/api/v1/transactions",
            json!({"book_id": 99, "member_id": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchBook");
}

#[tokio::test]
async fn return_is_a_two_step_protocol() {
    let router = app();

    send(
        &router,
        post(
            "/api/v1/transactions",
            json!({"book_id": 1, "member_id": 1, "borrow_date": "2024-01-01"}),
        ),
    )
    .await;

    // Committing without a valid token is rejected
    let (status, body) = send(
        &router,
        post(
            "/api/v1/transactions/1/return",
            json!({"confirm_token": "bogus", "return_date": "2024-01-10"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ConfirmationRejected");

    // Propose, then commit with the issued token
    let (status, body) = send(&router, post("/api/v1/transactions/1/return/propose", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["confirm_token"].as_str().expect("token").to_string();

    let (status, body) = send(
        &router,
        post(
            "/api/v1/transactions/1/return",
            json!({"confirm_token": token, "return_date": "2024-01-10"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert_eq!(body["transaction"]["return_date"], "2024-01-10");

    let (status, body) = send(&router, get("/api/v1/books/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_copies"], 1);

    // Proposing again on a closed transaction is rejected
    let (status, body) = send(&router, post("/api/v1/transactions/1/return/propose", json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyReturned");
}

#[tokio::test]
async fn book_search_by_prefix() {
    let router = app();

    let (status, body) = send(&router, get("/api/v1/books?q=gi")).await;
    assert_eq!(status, StatusCode::OK);
    let books = body.as_array().expect("array body");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Gitanjali");
}

#[tokio::test]
async fn stats_reflect_ledger() {
    let router = app();

    send(
        &router,
        post(
            "/api/v1/transactions",
            json!({"book_id": 2, "member_id": 1, "borrow_date": "2024-01-01"}),
        ),
    )
    .await;

    let (status, body) = send(&router, get("/api/v1/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"], 2);
    assert_eq!(body["members"], 1);
    assert_eq!(body["active_loans"], 1);
}
