//! API handlers for Jigyasa REST endpoints

pub mod books;
pub mod health;
pub mod members;
pub mod openapi;
pub mod transactions;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/:id", get(books::get_book))
        .route("/members", get(members::list_members))
        .route("/members/:id", get(members::get_member))
        // Transactions
        .route("/transactions", post(transactions::lend))
        .route("/transactions", get(transactions::recent_transactions))
        .route(
            "/transactions/outstanding",
            get(transactions::outstanding_loans),
        )
        .route(
            "/transactions/:id/return/propose",
            post(transactions::propose_return),
        )
        .route("/transactions/:id/return", post(transactions::commit_return))
        // Statistics
        .route("/stats", get(transactions::get_stats))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
