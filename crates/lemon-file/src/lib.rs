//! lemon-file - Filesystem-backed secure storage.

mod store;

pub use store::FileSecureStore;
