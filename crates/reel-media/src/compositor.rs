//! Layer stacking and the final encode.
//!
//! A [`Composition`] turns the canvas, the normalized source, raster layers
//! and an audio plan into one ffmpeg invocation with a single
//! `-filter_complex` graph.

use std::path::{Path, PathBuf};

use reel_models::EncodingConfig;

use crate::audio::{AudioPlan, AUDIO_OUT};
use crate::canvas::Canvas;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::normalize::NormalizedGeometry;
use crate::progress::FfmpegProgress;

/// Label of the final video stream in the filter graph.
pub const VIDEO_OUT: &str = "vout";

/// Position of a layer along one canvas axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    /// Fixed offset from the canvas origin
    At(u32),
}

impl Anchor {
    fn x_expr(self) -> String {
        match self {
            Anchor::Center => "(W-w)/2".to_string(),
            Anchor::At(px) => px.to_string(),
        }
    }

    fn y_expr(self) -> String {
        match self {
            Anchor::Center => "(H-h)/2".to_string(),
            Anchor::At(px) => px.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: Anchor,
    pub y: Anchor,
}

impl Placement {
    pub const CENTERED: Placement = Placement {
        x: Anchor::Center,
        y: Anchor::Center,
    };

    /// Horizontally centered, `y` pixels from the top.
    pub const fn top_offset(y: u32) -> Self {
        Self {
            x: Anchor::Center,
            y: Anchor::At(y),
        }
    }

    fn overlay_expr(&self) -> String {
        format!("overlay={}:{}", self.x.x_expr(), self.y.y_expr())
    }
}

/// Where a layer's pixels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    /// The source video, scaled and cropped
    Video(NormalizedGeometry),
    /// A still raster looped for the whole duration
    Image(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub source: LayerSource,
    pub placement: Placement,
}

impl Layer {
    pub fn video(geometry: NormalizedGeometry) -> Self {
        Self {
            name: "video".to_string(),
            source: LayerSource::Video(geometry),
            placement: Placement::CENTERED,
        }
    }

    pub fn image(name: impl Into<String>, path: impl Into<PathBuf>, placement: Placement) -> Self {
        Self {
            name: name.into(),
            source: LayerSource::Image(path.into()),
            placement,
        }
    }
}

/// Everything needed to render one output file.
#[derive(Debug, Clone)]
pub struct Composition {
    pub canvas: Canvas,
    pub video: PathBuf,
    /// Read the source only up to this many seconds
    pub input_limit: Option<f64>,
    /// Stacked bottom to top above the canvas
    pub layers: Vec<Layer>,
    pub audio: AudioPlan,
    pub music: Option<PathBuf>,
    pub encoding: EncodingConfig,
}

impl Composition {
    /// Shared duration of every layer and of the output.
    pub fn duration(&self) -> f64 {
        self.canvas.duration
    }

    /// Build the ffmpeg invocation writing to `output`.
    pub fn build_command(&self, output: impl AsRef<Path>) -> MediaResult<FfmpegCommand> {
        let video_layers = self
            .layers
            .iter()
            .filter(|l| matches!(l.source, LayerSource::Video(_)))
            .count();
        if video_layers != 1 {
            return Err(MediaError::internal(format!(
                "composition needs exactly one video layer, got {video_layers}"
            )));
        }

        let mut cmd = FfmpegCommand::new(&self.video, output);
        if let Some(limit) = self.input_limit {
            cmd = cmd.duration(limit);
        }

        let mut graph = vec![format!("{}[bg]", self.canvas.source_filter())];
        let mut below = "bg".to_string();
        let mut next_input = 1usize;

        for (i, layer) in self.layers.iter().enumerate() {
            let stream = match &layer.source {
                LayerSource::Video(geometry) => {
                    let label = "src".to_string();
                    graph.push(geometry.filter("0:v", &label));
                    label
                }
                LayerSource::Image(path) => {
                    cmd = cmd.add_input(path).loop_image();
                    let label = format!("{next_input}:v");
                    next_input += 1;
                    label
                }
            };

            let out = if i + 1 == self.layers.len() {
                VIDEO_OUT.to_string()
            } else {
                format!("l{i}")
            };
            graph.push(format!(
                "[{below}][{stream}]{}[{out}]",
                layer.placement.overlay_expr()
            ));
            below = out;
        }

        let music_input = match (&self.music, self.audio.music_fit()) {
            (Some(path), Some(fit)) => {
                cmd = cmd.add_input(path);
                if fit.is_looped() {
                    cmd = cmd.stream_loop(fit.loops);
                }
                let index = next_input;
                next_input += 1;
                Some(index)
            }
            (None, Some(_)) => {
                return Err(MediaError::internal("audio plan uses music but no music file was given"))
            }
            _ => None,
        };
        debug_assert_eq!(next_input, cmd.input_count());

        if let Some(audio) = self.audio.filter(0, music_input)? {
            graph.push(audio);
        }

        cmd = cmd
            .filter_complex(graph.join(";"))
            .map(format!("[{VIDEO_OUT}]"));
        if self.audio.has_audio() {
            cmd = cmd.map(format!("[{AUDIO_OUT}]"));
        }

        Ok(cmd
            .output_args(self.encoding.to_ffmpeg_args(self.audio.has_audio()))
            .output_duration(self.duration()))
    }

    /// Render to `output` with `runner`.
    pub async fn render(&self, runner: &FfmpegRunner, output: impl AsRef<Path>) -> MediaResult<()> {
        let cmd = self.build_command(output)?;
        let total = self.duration();
        runner
            .run_with_progress(&cmd, move |p: FfmpegProgress| {
                tracing::trace!(
                    percent = p.percentage(total),
                    speed = ?p.speed,
                    "Render progress"
                );
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioMixer, MusicFit};
    use reel_models::{AudioSettings, CanvasSettings, MusicVolume};

    fn canvas(duration: f64) -> Canvas {
        Canvas::new(&CanvasSettings::default(), duration, 40).unwrap()
    }

    fn geometry() -> NormalizedGeometry {
        NormalizedGeometry::plan(720, 1280, 980, Some(1225)).unwrap()
    }

    fn composition(audio: AudioPlan, music: Option<&str>, logo: bool) -> Composition {
        let mut layers = vec![
            Layer::video(geometry()),
            Layer::image("text", "/ws/text.png", Placement::top_offset(200)),
        ];
        if logo {
            layers.push(Layer::image("logo", "/ws/logo.png", Placement::top_offset(1350)));
        }
        Composition {
            canvas: canvas(10.0),
            video: PathBuf::from("/ws/video.mp4"),
            input_limit: None,
            layers,
            audio,
            music: music.map(PathBuf::from),
            encoding: EncodingConfig::default(),
        }
    }

    fn arg_after(args: &[String], flag: &str) -> String {
        let pos = args.iter().position(|a| a == flag).unwrap();
        args[pos + 1].clone()
    }

    #[test]
    fn test_basic_graph() {
        let comp = composition(AudioPlan::Original { target: 10.0 }, None, false);
        let args = comp.build_command("/ws/out.mp4").unwrap().build_args();

        let graph = arg_after(&args, "-filter_complex");
        assert_eq!(
            graph,
            "color=c=0xFFFFFF:s=1080x1920:r=40:d=10.000[bg];\
             [0:v]scale=980:1742,setsar=1,crop=980:1225:0:258[src];\
             [bg][src]overlay=(W-w)/2:(H-h)/2[l0];\
             [l0][1:v]overlay=(W-w)/2:200[vout];\
             [0:a]atrim=0:10.000,asetpts=PTS-STARTPTS[aout]"
        );
        assert!(args.contains(&"[vout]".to_string()));
        assert!(args.contains(&"[aout]".to_string()));
        assert_eq!(args.last().unwrap(), "/ws/out.mp4");
        assert_eq!(arg_after(&args, "-r"), "40");
    }

    #[test]
    fn test_text_input_is_looped() {
        let comp = composition(AudioPlan::Silent, None, true);
        let args = comp.build_command("/ws/out.mp4").unwrap().build_args();

        let text = args.iter().position(|a| a == "/ws/text.png").unwrap();
        assert_eq!(&args[text - 3..text], ["-loop", "1", "-i"]);
        let graph = arg_after(&args, "-filter_complex");
        assert!(graph.ends_with("[l1][2:v]overlay=(W-w)/2:1350[vout]"));
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"[aout]".to_string()));
    }

    #[test]
    fn test_output_is_cut_to_duration() {
        let mut comp = composition(AudioPlan::Silent, None, false);
        comp.input_limit = Some(10.0);
        let args = comp.build_command("/ws/out.mp4").unwrap().build_args();

        // Input-side cap precedes the first -i, output cut precedes the path
        let first_input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(&args[first_input - 2..first_input], ["-t", "10.000"]);
        let n = args.len();
        assert_eq!(&args[n - 3..n - 1], ["-t", "10.000"]);
    }

    #[test]
    fn test_looped_music_input() {
        let plan = AudioMixer::new(AudioSettings::default())
            .plan(true, Some(4.0), MusicVolume::default(), 10.0)
            .unwrap();
        let comp = composition(plan, Some("/ws/music.mp3"), true);
        let cmd = comp.build_command("/ws/out.mp4").unwrap();
        assert_eq!(cmd.input_count(), 4);

        let args = cmd.build_args();
        let music = args.iter().position(|a| a == "/ws/music.mp3").unwrap();
        assert_eq!(&args[music - 3..music], ["-stream_loop", "2", "-i"]);
        let graph = arg_after(&args, "-filter_complex");
        assert!(graph.contains("[3:a]atrim=0:10.000"));
        assert!(graph.contains("amix=inputs=2"));
    }

    #[test]
    fn test_long_music_is_not_looped() {
        let plan = AudioPlan::Music {
            fit: MusicFit {
                music_duration: 120.0,
                target: 10.0,
                loops: 0,
            },
            gain: 0.6,
        };
        let comp = composition(plan, Some("/ws/music.mp3"), false);
        let args = comp.build_command("/ws/out.mp4").unwrap().build_args();
        assert!(!args.contains(&"-stream_loop".to_string()));
        assert!(arg_after(&args, "-filter_complex").contains("[2:a]atrim=0:10.000"));
    }

    #[test]
    fn test_music_plan_without_file_fails() {
        let plan = AudioMixer::new(AudioSettings::default())
            .plan(false, Some(4.0), MusicVolume::default(), 10.0)
            .unwrap();
        assert!(composition(plan, None, false).build_command("/o.mp4").is_err());
    }

    #[test]
    fn test_requires_one_video_layer() {
        let mut comp = composition(AudioPlan::Silent, None, false);
        comp.layers.remove(0);
        assert!(comp.build_command("/o.mp4").is_err());
    }
}
