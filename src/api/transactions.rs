//! Lending transaction endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{LibraryStats, Transaction, TransactionDetails},
};

/// Lend request
#[derive(Deserialize, ToSchema)]
pub struct LendRequest {
    /// Book ID
    pub book_id: i64,
    /// Member ID
    pub member_id: i64,
    /// Borrow date; defaults to the current date
    pub borrow_date: Option<NaiveDate>,
}

/// Lend response with the created ledger entry
#[derive(Serialize, ToSchema)]
pub struct LendResponse {
    /// Transaction ID
    pub id: i64,
    /// Due date
    pub due_date: NaiveDate,
    /// Status message
    pub message: String,
}

/// Recent transactions listing parameters
#[derive(Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of entries; defaults to 10
    pub limit: Option<usize>,
}

/// Proposed return, to be confirmed
#[derive(Serialize, ToSchema)]
pub struct ProposeReturnResponse {
    /// Transaction ID the token was issued for
    pub transaction_id: i64,
    /// Single-use confirm token
    pub confirm_token: String,
    /// Seconds until the token expires
    pub expires_in_seconds: u64,
}

/// Return commit request
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Token obtained from the propose step
    pub confirm_token: String,
    /// Return date; defaults to the current date
    pub return_date: Option<NaiveDate>,
}

/// Return response with the closed ledger entry
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// The closed transaction
    pub transaction: Transaction,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Lend a book to a member
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    request_body = LendRequest,
    responses(
        (status = 201, description = "Book lent", body = LendResponse),
        (status = 404, description = "Book or member not found"),
        (status = 409, description = "No copies available")
    )
)]
pub async fn lend(
    State(state): State<crate::AppState>,
    Json(request): Json<LendRequest>,
) -> AppResult<(StatusCode, Json<LendResponse>)> {
    let borrow_date = request.borrow_date.unwrap_or_else(today);

    let tx = state
        .services
        .lending
        .lend(request.book_id, request.member_id, borrow_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LendResponse {
            id: tx.id,
            due_date: tx.due_date,
            message: "Book lent successfully".to_string(),
        }),
    ))
}

/// Most recent transactions, enriched for display
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent transactions", body = Vec<TransactionDetails>)
    )
)]
pub async fn recent_transactions(
    State(state): State<crate::AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let limit = query.limit.unwrap_or(10);
    let transactions = state
        .services
        .queries
        .recent_transactions(limit, today())
        .await?;
    Ok(Json(transactions))
}

/// All open loans
#[utoipa::path(
    get,
    path = "/transactions/outstanding",
    tag = "transactions",
    responses(
        (status = 200, description = "Open loans", body = Vec<Transaction>)
    )
)]
pub async fn outstanding_loans(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Transaction>>> {
    let loans = state.services.queries.outstanding_loans().await?;
    Ok(Json(loans))
}

/// Propose returning a transaction; yields a confirm token
#[utoipa::path(
    post,
    path = "/transactions/{id}/return/propose",
    tag = "transactions",
    params(
        ("id" = i64, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Return proposed", body = ProposeReturnResponse),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn propose_return(
    State(state): State<crate::AppState>,
    Path(transaction_id): Path<i64>,
) -> AppResult<Json<ProposeReturnResponse>> {
    let tx = state.services.queries.get_transaction(transaction_id).await?;
    if !tx.is_open() {
        return Err(AppError::AlreadyReturned { transaction_id });
    }

    let confirm_token = state.services.confirm.issue(transaction_id);

    Ok(Json(ProposeReturnResponse {
        transaction_id,
        confirm_token,
        expires_in_seconds: state.services.confirm.ttl().as_secs(),
    }))
}

/// Commit a proposed return
#[utoipa::path(
    post,
    path = "/transactions/{id}/return",
    tag = "transactions",
    params(
        ("id" = i64, Path, description = "Transaction ID")
    ),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Already returned, or confirm token rejected")
    )
)]
pub async fn commit_return(
    State(state): State<crate::AppState>,
    Path(transaction_id): Path<i64>,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<ReturnResponse>> {
    state
        .services
        .confirm
        .redeem(&request.confirm_token, transaction_id)?;

    let return_date = request.return_date.unwrap_or_else(today);
    let tx = state
        .services
        .lending
        .return_book(transaction_id, return_date)
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        transaction: tx,
    }))
}

/// Aggregate library counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Library statistics", body = LibraryStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
) -> AppResult<Json<LibraryStats>> {
    let stats = state.services.queries.stats(today()).await?;
    Ok(Json(stats))
}
