//! Core traits for storage, transport and authentication behavior.

mod auth;
mod store;
mod transport;

pub use auth::{AuthApi, LoginGrant, RefreshGrant};
pub use store::SecureStore;
pub use transport::{HttpRequest, HttpResponse, Transport};
