//! API route handlers.

pub mod auth;
pub mod health;
pub mod session;
pub mod visits;

use crate::error::ApiError;

/// 404 handler for undefined routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
