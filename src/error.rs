//! Error types for the Jigyasa server

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes surfaced in API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    StorageFailure = 2,
    NoSuchBook = 3,
    NoSuchMember = 4,
    NoSuchTransaction = 5,
    NoCopiesAvailable = 6,
    AlreadyReturned = 7,
    PartialWrite = 8,
    BadValue = 9,
    ConfirmationRejected = 10,
}

/// Entity kinds referenced by lookup failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Book,
    Member,
    Transaction,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Book => write!(f, "Book"),
            Entity::Member => write!(f, "Member"),
            Entity::Transaction => write!(f, "Transaction"),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("No copies of book {book_id} available")]
    NoCopiesAvailable { book_id: i64 },

    #[error("Transaction {transaction_id} already returned")]
    AlreadyReturned { transaction_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The first write of a two-write operation committed but the second
    /// failed; catalog and ledger may disagree until an operator reconciles.
    #[error("Partial write: {0}")]
    PartialWrite(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Confirmation rejected: {0}")]
    Confirmation(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound { entity, .. } => {
                let code = match entity {
                    Entity::Book => ErrorCode::NoSuchBook,
                    Entity::Member => ErrorCode::NoSuchMember,
                    Entity::Transaction => ErrorCode::NoSuchTransaction,
                };
                (StatusCode::NOT_FOUND, code, self.to_string())
            }
            AppError::NoCopiesAvailable { .. } => (
                StatusCode::CONFLICT,
                ErrorCode::NoCopiesAvailable,
                self.to_string(),
            ),
            AppError::AlreadyReturned { .. } => (
                StatusCode::CONFLICT,
                ErrorCode::AlreadyReturned,
                self.to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageFailure,
                    "Storage error".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageFailure,
                    "Storage error".to_string(),
                )
            }
            AppError::PartialWrite(msg) => {
                tracing::error!("Partial write: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::PartialWrite,
                    msg.clone(),
                )
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Confirmation(msg) => (
                StatusCode::CONFLICT,
                ErrorCode::ConfirmationRejected,
                msg.clone(),
            ),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
