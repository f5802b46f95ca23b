//! HTTP JSON API for the field visit form.
//!
//! The browser form talks to these endpoints:
//!
//! - `GET /health` - liveness probe
//! - `POST /api/session` - log in with e-mail and position
//! - `GET /api/session/{id}/sites?q=` - search the session's sites
//! - `POST /api/session/{id}/district` - change the district (managers)
//! - `POST /api/session/{id}/visits` - submit a visit
//! - `DELETE /api/session/{id}` - log out
//! - `GET /api/auth/status` - external token state
//! - `POST /api/auth/sign-out` - revoke and forget the external token

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use server::{build_router, init_tracing, start_server};
pub use state::AppState;
