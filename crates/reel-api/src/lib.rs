//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /api/generate-video`, which turns an uploaded clip into a
//!   branded 9:16 reel with AI-written overlay text and caption
//! - Static serving of rendered files
//! - Health/readiness probes, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::resolve_api_key;
pub use state::AppState;
