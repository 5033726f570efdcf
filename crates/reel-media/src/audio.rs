//! Audio track planning: pass-through, music replacement, or a two-track mix.
//!
//! Music shorter than the video is looped whole (via `-stream_loop` on the
//! input) and every branch is trimmed to exactly the target duration.

use reel_models::{AudioSettings, MusicVolume};

use crate::error::{MediaError, MediaResult};

/// Label of the final audio stream in the filter graph.
pub const AUDIO_OUT: &str = "aout";

/// How a music track is matched to the target duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicFit {
    pub music_duration: f64,
    pub target: f64,
    /// Extra copies appended after the first play
    pub loops: u32,
}

impl MusicFit {
    /// Total seconds of music available after looping.
    pub fn covered(&self) -> f64 {
        self.music_duration * (self.loops as f64 + 1.0)
    }

    pub fn is_looped(&self) -> bool {
        self.loops > 0
    }

    /// Whether the tail of the (looped) music is cut off.
    pub fn is_trimmed(&self) -> bool {
        self.covered() > self.target
    }
}

/// Match `music_duration` to `target` seconds.
pub fn fit_music(music_duration: f64, target: f64) -> MediaResult<MusicFit> {
    if !(music_duration.is_finite() && music_duration > 0.0) {
        return Err(MediaError::unreadable(format!(
            "music has no usable duration ({music_duration})"
        )));
    }
    if !(target.is_finite() && target > 0.0) {
        return Err(MediaError::invalid_parameter(format!(
            "target duration must be positive, got {target}"
        )));
    }

    let loops = if music_duration >= target {
        0
    } else {
        ((target / music_duration).ceil() as u32).saturating_sub(1)
    };

    Ok(MusicFit {
        music_duration,
        target,
        loops,
    })
}

/// Resolved audio for one render.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioPlan {
    /// No audio track in the output
    Silent,
    /// The source's own audio, trimmed to the target
    Original { target: f64 },
    /// Music replaces a silent source
    Music { fit: MusicFit, gain: f64 },
    /// Source audio and music mixed at independent gains
    Mixed {
        fit: MusicFit,
        music_gain: f64,
        original_gain: f64,
    },
}

impl AudioPlan {
    pub fn has_audio(&self) -> bool {
        !matches!(self, AudioPlan::Silent)
    }

    pub fn music_fit(&self) -> Option<&MusicFit> {
        match self {
            AudioPlan::Music { fit, .. } | AudioPlan::Mixed { fit, .. } => Some(fit),
            _ => None,
        }
    }

    /// Filter graph fragment ending in `[aout]`.
    ///
    /// `original` and `music` are the ffmpeg input indices of the source
    /// video and the music file.
    pub fn filter(&self, original: usize, music: Option<usize>) -> MediaResult<Option<String>> {
        let music_input = || {
            music.ok_or_else(|| MediaError::internal("audio plan needs a music input"))
        };

        let graph = match self {
            AudioPlan::Silent => return Ok(None),
            AudioPlan::Original { target } => {
                format!("[{original}:a]{}[{AUDIO_OUT}]", trim_chain(*target, None))
            }
            AudioPlan::Music { fit, gain } => format!(
                "[{}:a]{}[{AUDIO_OUT}]",
                music_input()?,
                trim_chain(fit.target, Some(*gain))
            ),
            AudioPlan::Mixed {
                fit,
                music_gain,
                original_gain,
            } => format!(
                "[{original}:a]{}[a_orig];[{}:a]{}[a_music];\
                 [a_orig][a_music]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0,\
                 atrim=0:{:.3}[{AUDIO_OUT}]",
                trim_chain(fit.target, Some(*original_gain)),
                music_input()?,
                trim_chain(fit.target, Some(*music_gain)),
                fit.target
            ),
        };
        Ok(Some(graph))
    }
}

fn trim_chain(target: f64, gain: Option<f64>) -> String {
    let mut chain = format!("atrim=0:{target:.3},asetpts=PTS-STARTPTS");
    if let Some(gain) = gain {
        chain.push_str(&format!(",volume={gain:.3}"));
    }
    chain
}

/// Chooses the audio plan for a render.
#[derive(Debug, Clone)]
pub struct AudioMixer {
    settings: AudioSettings,
}

impl AudioMixer {
    pub fn new(settings: AudioSettings) -> Self {
        Self { settings }
    }

    pub fn plan(
        &self,
        has_original: bool,
        music_duration: Option<f64>,
        volume: MusicVolume,
        target: f64,
    ) -> MediaResult<AudioPlan> {
        if !(target.is_finite() && target > 0.0) {
            return Err(MediaError::invalid_parameter(format!(
                "target duration must be positive, got {target}"
            )));
        }
        if !(self.settings.original_gain.is_finite() && self.settings.original_gain >= 0.0) {
            return Err(MediaError::invalid_parameter(format!(
                "original audio gain must be non-negative, got {}",
                self.settings.original_gain
            )));
        }

        let plan = match (music_duration, has_original) {
            (None, true) => AudioPlan::Original { target },
            (None, false) => AudioPlan::Silent,
            (Some(d), false) => AudioPlan::Music {
                fit: fit_music(d, target)?,
                gain: volume.gain(),
            },
            (Some(d), true) => AudioPlan::Mixed {
                fit: fit_music(d, target)?,
                music_gain: volume.gain(),
                original_gain: self.settings.original_gain,
            },
        };
        Ok(plan)
    }
}
