//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels (0 without a video stream)
    pub width: u32,
    /// Height in pixels (0 without a video stream)
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec
    pub codec: String,
    /// Whether a video stream exists
    pub has_video: bool,
    /// Whether an audio stream exists
    pub has_audio: bool,
    /// Frame count when the container reports one
    pub frame_count: Option<u64>,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
}

/// Probe any media file.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed on {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Probe a source video and reject anything the pipeline cannot render.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();
    let info = probe_media(path).await.map_err(|e| as_unreadable(path, e))?;
    validate_video(&info).map_err(|reason| {
        MediaError::unreadable(format!("{}: {}", path.display(), reason))
    })?;
    Ok(info)
}

/// Probe a music file; it must carry an audio stream with a duration.
pub async fn probe_audio(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();
    let info = probe_media(path).await.map_err(|e| as_unreadable(path, e))?;
    if !info.has_audio {
        return Err(MediaError::unreadable(format!(
            "{}: no audio stream",
            path.display()
        )));
    }
    if !(info.duration.is_finite() && info.duration > 0.0) {
        return Err(MediaError::unreadable(format!(
            "{}: audio has no duration",
            path.display()
        )));
    }
    Ok(info)
}

/// Decoding failures become `UnreadableMedia`; tooling failures pass through.
fn as_unreadable(path: &Path, error: MediaError) -> MediaError {
    match error {
        MediaError::FfprobeFailed { stderr, .. } => MediaError::unreadable(format!(
            "{}: {}",
            path.display(),
            stderr.unwrap_or_default().trim()
        )),
        MediaError::JsonParse(e) => {
            MediaError::unreadable(format!("{}: bad probe output: {}", path.display(), e))
        }
        other => other,
    }
}

fn validate_video(info: &MediaInfo) -> Result<(), &'static str> {
    if !info.has_video {
        return Err("no video stream");
    }
    if info.width == 0 || info.height == 0 {
        return Err("video stream has no dimensions");
    }
    if info.frame_count == Some(0) {
        return Err("video stream has no frames");
    }
    if !(info.duration.is_finite() && info.duration > 0.0) {
        return Err("video has no duration");
    }
    Ok(())
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");
    let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");

    // Container duration first, then whichever stream reports one
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_seconds)
        .or_else(|| video_stream.and_then(|s| s.duration.as_deref()).and_then(parse_seconds))
        .or_else(|| audio_stream.and_then(|s| s.duration.as_deref()).and_then(parse_seconds))
        .unwrap_or(0.0);

    let fps = video_stream
        .and_then(|s| s.avg_frame_rate.as_deref().and_then(parse_frame_rate))
        .or_else(|| video_stream.and_then(|s| s.r_frame_rate.as_deref().and_then(parse_frame_rate)))
        .unwrap_or(30.0);

    Ok(MediaInfo {
        duration,
        width: video_stream.and_then(|s| s.width).unwrap_or(0),
        height: video_stream.and_then(|s| s.height).unwrap_or(0),
        fps,
        codec: video_stream
            .and_then(|s| s.codec_name.clone())
            .unwrap_or_default(),
        has_video: video_stream.is_some(),
        has_audio: audio_stream.is_some(),
        frame_count: video_stream
            .and_then(|s| s.nb_frames.as_deref())
            .and_then(|n| n.parse().ok()),
    })
}

fn parse_seconds(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite())
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok().filter(|f: &f64| *f > 0.0)
}
