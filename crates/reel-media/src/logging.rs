//! Structured render logging.

use std::time::Instant;

use tracing::{error, info, warn, Span};

/// Logs pipeline stages with the request id attached to every line.
#[derive(Debug, Clone)]
pub struct RenderLogger {
    request_id: String,
    started: Instant,
}

impl RenderLogger {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            started: Instant::now(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(request_id = %self.request_id, "Render started: {}", message);
    }

    /// Log the outcome of one pipeline stage.
    pub fn log_stage(&self, stage: &str, message: &str) {
        info!(
            request_id = %self.request_id,
            stage = stage,
            elapsed_ms = self.elapsed_ms(),
            "{}", message
        );
    }

    pub fn log_warning(&self, stage: &str, message: &str) {
        warn!(request_id = %self.request_id, stage = stage, "Render warning: {}", message);
    }

    pub fn log_error(&self, stage: &str, message: &str) {
        error!(request_id = %self.request_id, stage = stage, "Render error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            elapsed_ms = self.elapsed_ms(),
            "Render completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("render", request_id = %self.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_keeps_request_id() {
        let logger = RenderLogger::new("req-1");
        assert_eq!(logger.request_id(), "req-1");
        assert!(logger.elapsed_secs() >= 0.0);
    }

    #[test]
    fn test_logging_methods_do_not_panic() {
        let logger = RenderLogger::new("req-2");
        logger.log_start("start");
        logger.log_stage("canvas", "ok");
        logger.log_warning("logo", "skipped");
        logger.log_error("compose", "failed");
        logger.log_completion("done");
        let _span = logger.create_span();
    }
}
