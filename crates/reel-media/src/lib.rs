//! Compositing pipeline for vertical social videos.
//!
//! This crate provides:
//! - FFmpeg command building and execution with progress and timeouts
//! - FFprobe media inspection
//! - The render stages: canvas, video normalizer, text renderer, logo
//!   processor, audio mixer and compositor
//! - [`ReelPipeline`], which runs the stages for one request inside a
//!   [`RequestWorkspace`]

pub mod audio;
pub mod canvas;
pub mod command;
pub mod compositor;
pub mod error;
pub mod font;
pub mod fs_utils;
pub mod logging;
pub mod logo;
pub mod normalize;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod text;
pub mod workspace;

pub use audio::{fit_music, AudioMixer, AudioPlan, MusicFit};
pub use canvas::Canvas;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compositor::{Anchor, Composition, Layer, LayerSource, Placement};
pub use error::{MediaError, MediaResult};
pub use font::{BuiltinFont, FontChain, FontFile, FontSource, LoadedFont, PlatformBold};
pub use fs_utils::{move_file, publish_output};
pub use logging::RenderLogger;
pub use logo::{strip_dark_background, LogoLayer, LogoProcessor};
pub use normalize::{effective_duration, CropBox, NormalizedGeometry, NormalizedVideo};
pub use pipeline::{ReelInputs, ReelPipeline, RenderedReel};
pub use probe::{probe_audio, probe_media, probe_video, MediaInfo};
pub use progress::FfmpegProgress;
pub use text::{wrap_text, TextLayer, TextRenderer, TextStyle};
pub use workspace::{RequestWorkspace, Slot};
