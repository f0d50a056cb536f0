//! lemon-http - Network-backed transport and auth authority.

mod auth;
mod transport;

pub use auth::HttpAuthApi;
pub use transport::ReqwestTransport;
