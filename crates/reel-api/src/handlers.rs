//! HTTP request handlers.

pub mod generate;
pub mod health;

pub use generate::generate_video;
pub use health::{health, ready};
