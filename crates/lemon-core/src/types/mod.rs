//! Core value types.
//!
//! These types enforce their invariants at construction time.

mod base_url;
mod user;

pub use base_url::BaseUrl;
pub use user::{Identifier, User};
