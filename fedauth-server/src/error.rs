use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use fedauth_types::ScopeError;

use crate::directory::DirectoryError;
use crate::token::TokenError;

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or unverifiable Basic auth credentials.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// The request's `grant_type` is absent or not registered.
    #[error("invalid_grant")]
    InvalidGrantType(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Malformed scope syntax, or a scope naming unknown or unusable
    /// directory entries.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// The principal lacks the required permission, or a token does not
    /// cover the requested access.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    Token(#[from] TokenError),

    /// The directory could not be reached or answered unexpectedly.
    #[error("Directory error: {0}")]
    Directory(String),
}

impl From<ScopeError> for AuthError {
    fn from(err: ScopeError) -> Self {
        AuthError::InvalidScope(err.to_string())
    }
}

impl AuthError {
    /// Map a directory failure, turning `NotFound` into the given error and
    /// anything else into an upstream failure.
    pub(crate) fn or_not_found(err: DirectoryError, not_found: AuthError) -> AuthError {
        match err {
            DirectoryError::NotFound => not_found,
            other => AuthError::Directory(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    status: u16,
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::InvalidGrantType(_)
            | AuthError::BadRequest(_)
            | AuthError::InvalidScope(_)
            | AuthError::Token(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AuthError::Directory(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
