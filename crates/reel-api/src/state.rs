//! Application state.

use std::sync::Arc;

use reel_ai::{CaptionGenerator, GeminiClient};
use reel_media::ReelPipeline;
use reel_models::RenderSettings;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub pipeline: ReelPipeline,
    pub captions: Arc<dyn CaptionGenerator>,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pipeline = ReelPipeline::new(RenderSettings::from_env())?;
        let captions = GeminiClient::from_env()?;
        Self::with_generator(config, pipeline, Arc::new(captions))
    }

    /// Create state with an explicit pipeline and caption generator.
    pub fn with_generator(
        config: ApiConfig,
        pipeline: ReelPipeline,
        captions: Arc<dyn CaptionGenerator>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&config.output_dir)?;
        std::fs::create_dir_all(&config.temp_dir)?;

        Ok(Self {
            config: Arc::new(config),
            pipeline,
            captions,
        })
    }
}
