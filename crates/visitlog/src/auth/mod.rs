//! Bearer-token lifecycle for the Drive, Sheets and Calendar APIs.
//!
//! [`TokenManager`] hands out a valid access token, reusing the in-memory or
//! persisted one when possible and otherwise running exactly one interactive
//! consent flow no matter how many callers are waiting. A background timer
//! refreshes the token silently shortly before it expires.

pub mod device;
pub mod error;
pub mod manager;
pub mod provider;
pub mod store;
pub mod token;

pub use device::DeviceConsent;
pub use error::AuthError;
pub use manager::{AuthStatus, TokenManager};
pub use provider::{ConsentPrompt, ConsentProvider, ConsentRequest, GrantedToken, LogPrompt};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{AuthToken, TokenPolicy};
