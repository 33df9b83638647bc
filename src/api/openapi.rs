//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, members, transactions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jigyasa API",
        version = "0.1.0",
        description = "Library Lending System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Jigyasa Team")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        // Members
        members::list_members,
        members::get_member,
        // Transactions
        transactions::lend,
        transactions::recent_transactions,
        transactions::outstanding_loans,
        transactions::propose_return,
        transactions::commit_return,
        transactions::get_stats,
    ),
    components(
        schemas(
            // Catalog
            crate::models::Book,
            crate::models::Member,
            // Transactions
            crate::models::Transaction,
            crate::models::TransactionDetails,
            crate::models::LibraryStats,
            transactions::LendRequest,
            transactions::LendResponse,
            transactions::ProposeReturnResponse,
            transactions::ReturnRequest,
            transactions::ReturnResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "members", description = "Members"),
        (name = "transactions", description = "Lending transactions"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
