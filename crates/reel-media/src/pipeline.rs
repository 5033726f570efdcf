//! End-to-end render of one reel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::{counter, histogram};
use reel_models::{MusicVolume, RenderSettings};

use crate::audio::AudioMixer;
use crate::canvas::Canvas;
use crate::command::FfmpegRunner;
use crate::compositor::{Composition, Layer, Placement};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::publish_output;
use crate::logging::RenderLogger;
use crate::logo::{LogoLayer, LogoProcessor};
use crate::normalize::NormalizedVideo;
use crate::probe::{probe_audio, probe_video};
use crate::text::{TextRenderer, TextStyle};
use crate::workspace::{RequestWorkspace, Slot};

/// Files and parameters for one render; paths point into the request workspace.
#[derive(Debug, Clone)]
pub struct ReelInputs {
    pub video: PathBuf,
    pub logo: Option<PathBuf>,
    pub music: Option<PathBuf>,
    pub music_volume: MusicVolume,
    pub overlay_text: String,
}

impl ReelInputs {
    pub fn new(video: impl Into<PathBuf>, overlay_text: impl Into<String>) -> Self {
        Self {
            video: video.into(),
            logo: None,
            music: None,
            music_volume: MusicVolume::default(),
            overlay_text: overlay_text.into(),
        }
    }

    pub fn with_logo(mut self, logo: impl Into<PathBuf>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    pub fn with_music(mut self, music: impl Into<PathBuf>, volume: MusicVolume) -> Self {
        self.music = Some(music.into());
        self.music_volume = volume;
        self
    }
}

/// A published render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReel {
    pub path: PathBuf,
    pub file_name: String,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_logo: bool,
    pub has_audio: bool,
    /// Source was longer than the duration cap
    pub capped: bool,
}

/// Runs canvas, normalizer, text, logo, audio and compositor for a request.
#[derive(Debug, Clone)]
pub struct ReelPipeline {
    settings: Arc<RenderSettings>,
    text_renderer: Arc<TextRenderer>,
    runner: FfmpegRunner,
}

impl ReelPipeline {
    pub fn new(settings: RenderSettings) -> MediaResult<Self> {
        validate_settings(&settings)?;
        let text_renderer = TextRenderer::with_font_path(settings.text.font_path.as_deref());
        tracing::info!(font = %text_renderer.font(), "Text renderer ready");
        let runner = FfmpegRunner::new().with_timeout(settings.ffmpeg_timeout_secs);

        Ok(Self {
            settings: Arc::new(settings),
            text_renderer: Arc::new(text_renderer),
            runner,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `inputs` and publish the result as `<output_dir>/<request id>.mp4`.
    pub async fn render(
        &self,
        workspace: &RequestWorkspace,
        inputs: &ReelInputs,
        output_dir: impl AsRef<Path>,
    ) -> MediaResult<RenderedReel> {
        let logger = RenderLogger::new(workspace.id());
        logger.log_start(&format!("source {}", inputs.video.display()));

        let result = self.render_inner(workspace, inputs, output_dir.as_ref(), &logger).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) if e.is_unreadable() => "unreadable",
            Err(e) if e.is_invalid_parameter() => "invalid",
            Err(_) => "failed",
        };
        counter!("reel_renders_total", "outcome" => outcome).increment(1);
        histogram!("reel_render_duration_seconds").record(logger.elapsed_secs());

        match &result {
            Ok(reel) => logger.log_completion(&format!(
                "{} ({:.2}s, logo: {}, audio: {})",
                reel.file_name, reel.duration, reel.has_logo, reel.has_audio
            )),
            Err(e) => logger.log_error("render", &e.to_string()),
        }
        result
    }

    async fn render_inner(
        &self,
        workspace: &RequestWorkspace,
        inputs: &ReelInputs,
        output_dir: &Path,
        logger: &RenderLogger,
    ) -> MediaResult<RenderedReel> {
        let settings = &self.settings;

        let info = probe_video(&inputs.video).await?;
        let video = NormalizedVideo::from_probe(&info, &settings.video)?;
        let (layer_w, layer_h) = video.geometry.layer_size();
        logger.log_stage(
            "normalize",
            &format!(
                "{}x{} -> {}x{}, {:.2}s{}",
                info.width,
                info.height,
                layer_w,
                layer_h,
                video.duration,
                if video.capped { " (capped)" } else { "" }
            ),
        );

        let canvas = Canvas::new(&settings.canvas, video.duration, settings.encoding.fps)?;

        let text_path = workspace.slot(Slot::TextLayer);
        let text = {
            let renderer = Arc::clone(&self.text_renderer);
            let style = TextStyle::from(&settings.text).with_max_width(settings.canvas.width);
            let overlay = inputs.overlay_text.clone();
            let path = text_path.clone();
            tokio::task::spawn_blocking(move || renderer.render_to_file(&overlay, &style, &path))
                .await
                .map_err(|e| MediaError::internal(format!("text render task failed: {e}")))??
        };
        logger.log_stage(
            "text",
            &format!("{}x{}, {} line(s)", text.width, text.height, text.lines),
        );

        let logo = match &inputs.logo {
            Some(source) => self.prepare_logo(source, workspace.slot(Slot::LogoLayer), logger).await,
            None => None,
        };

        let music_duration = match &inputs.music {
            Some(path) => Some(probe_audio(path).await?.duration),
            None => None,
        };
        let audio = AudioMixer::new(settings.audio.clone()).plan(
            video.has_audio,
            music_duration,
            inputs.music_volume,
            video.duration,
        )?;
        logger.log_stage("audio", &format!("{audio:?}"));

        let mut layers = vec![
            Layer::video(video.geometry),
            Layer::image("text", &text.path, Placement::top_offset(settings.text.offset_y)),
        ];
        if let Some(logo) = &logo {
            layers.push(Layer::image(
                "logo",
                &logo.path,
                Placement::top_offset(settings.logo.offset_y),
            ));
        }

        let composition = Composition {
            canvas,
            video: inputs.video.clone(),
            input_limit: video.input_limit(),
            layers,
            audio,
            music: inputs.music.clone(),
            encoding: settings.encoding.clone(),
        };

        let render_path = workspace.slot(Slot::Render);
        composition.render(&self.runner, &render_path).await?;
        logger.log_stage("compose", "encode finished");

        let file_name = format!("{}.mp4", workspace.id());
        let path = publish_output(&render_path, output_dir, &file_name).await?;

        Ok(RenderedReel {
            path,
            file_name,
            duration: composition.duration(),
            width: composition.canvas.width,
            height: composition.canvas.height,
            has_logo: logo.is_some(),
            has_audio: composition.audio.has_audio(),
            capped: video.capped,
        })
    }

    /// Logo failures never fail the render.
    async fn prepare_logo(
        &self,
        source: &Path,
        output: PathBuf,
        logger: &RenderLogger,
    ) -> Option<LogoLayer> {
        let processor = LogoProcessor::new(self.settings.logo.clone());
        let source = source.to_path_buf();
        let result = tokio::task::spawn_blocking(move || processor.process(&source, &output))
            .await
            .map_err(|e| MediaError::internal(format!("logo task failed: {e}")))
            .and_then(|r| r);

        match result {
            Ok(layer) => {
                logger.log_stage(
                    "logo",
                    &format!("{}x{}, {} px cleared", layer.width, layer.height, layer.cleared),
                );
                Some(layer)
            }
            Err(e) => {
                counter!("reel_logo_fallbacks_total").increment(1);
                logger.log_warning("logo", &format!("logo skipped: {e}"));
                None
            }
        }
    }
}

fn validate_settings(settings: &RenderSettings) -> MediaResult<()> {
    let canvas = &settings.canvas;
    if canvas.width == 0 || canvas.height == 0 {
        return Err(MediaError::invalid_parameter("canvas size must be positive"));
    }
    if settings.video.width == 0 || settings.video.width > canvas.width {
        return Err(MediaError::invalid_parameter(format!(
            "video width {} must be between 1 and the canvas width {}",
            settings.video.width, canvas.width
        )));
    }
    if let Some(max_h) = settings.video.max_height {
        if max_h == 0 || max_h > canvas.height {
            return Err(MediaError::invalid_parameter(format!(
                "video max height {} must be between 1 and the canvas height {}",
                max_h, canvas.height
            )));
        }
    }
    if settings.logo.width == 0 || settings.logo.width > canvas.width {
        return Err(MediaError::invalid_parameter(format!(
            "logo width {} must be between 1 and the canvas width {}",
            settings.logo.width, canvas.width
        )));
    }
    if settings.text.font_size == 0 {
        return Err(MediaError::invalid_parameter("font size must be positive"));
    }
    if settings.encoding.fps == 0 {
        return Err(MediaError::invalid_parameter("frame rate must be positive"));
    }
    Ok(())
}
