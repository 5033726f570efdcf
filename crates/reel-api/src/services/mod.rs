//! Request-independent helpers used by handlers.

pub mod api_key;

pub use api_key::resolve_api_key;
