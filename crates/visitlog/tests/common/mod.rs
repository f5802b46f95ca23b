//! Shared test utilities for visitlog integration tests.
//!
//! This module provides:
//! - In-memory fakes for the row store and the external services
//! - Builders for forms, photos and pipeline wiring

pub mod builders;
pub mod fakes;

pub use builders::*;
pub use fakes::*;
