use axum::{
    Json,
    extract::rejection::{FormRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages.
pub mod msg {
    pub const NOT_AUTHENTICATED: &str = "Not authenticated";

    pub const INVALID_ID: &str = "Invalid id";
    pub const PROJECT_NOT_FOUND: &str = "Project not found";
    pub const SERVICE_ORDER_NOT_FOUND: &str = "Service order not found";
    pub const MEMBER_NOT_FOUND: &str = "User is not a member of this project";

    pub const PROJECT_NAME_TOO_SHORT: &str = "Project name must be at least 3 characters";
    pub const UNKNOWN_MEMBER: &str = "Selected member does not exist in the directory";
    pub const SEARCH_QUERY_TOO_LONG: &str = "Search query must be at most 100 characters";

    pub const NAME_REQUIRED: &str = "Name is required";
    pub const INVALID_PRICE: &str = "Invalid price";
    pub const NEGATIVE_PRICE: &str = "Price must not be negative";
    pub const PRICE_TOO_PRECISE: &str = "Price must have at most two decimal places";
    pub const INVALID_STATUS: &str = "Invalid status";
    pub const INVALID_TAG: &str = "Invalid tag";
    pub const INVALID_DELIVERY_DATE: &str = "Delivery date must be formatted as YYYY-MM-DD";

    pub const NOT_PROJECT_MEMBER: &str = "You do not have permission to edit this project";
    pub const ONLY_OWNER_CAN_DELETE: &str = "Only the owner can delete the project";
    pub const ONLY_OWNER_CAN_REMOVE_MEMBERS: &str = "Only the owner can remove project members";
    pub const CANNOT_REMOVE_OWNER: &str = "The project owner cannot be removed";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                Some(msg::NOT_AUTHENTICATED.to_string()),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Converts a missing row into a `NotFound` error.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}
