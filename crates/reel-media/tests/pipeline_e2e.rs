//! End-to-end renders against a real ffmpeg.
//!
//! Run with `cargo test -p reel-media -- --ignored`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{Rgba, RgbaImage};
use reel_media::{probe_media, ReelInputs, ReelPipeline, RequestWorkspace, Slot};
use reel_models::{MusicVolume, RenderSettings};
use tempfile::TempDir;

fn fast_settings() -> RenderSettings {
    let mut settings = RenderSettings::default();
    settings.encoding.preset = "ultrafast".to_string();
    settings.encoding = settings.encoding.with_crf(30).with_fps(25);
    settings
}

fn lavfi(args: &[&str], output: &Path) {
    let status = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-v", "error"])
        .args(args)
        .arg(output)
        .status()
        .expect("ffmpeg must be installed");
    assert!(status.success(), "failed to generate {}", output.display());
}

fn source_video(path: &Path, seconds: u32, size: &str, with_audio: bool) {
    let video = format!("testsrc2=size={size}:rate=25:duration={seconds}");
    let audio = format!("sine=frequency=440:duration={seconds}");
    let mut args = vec!["-f", "lavfi", "-i", video.as_str()];
    if with_audio {
        args.extend(["-f", "lavfi", "-i", audio.as_str(), "-c:a", "aac"]);
    }
    args.extend(["-c:v", "libx264", "-preset", "ultrafast", "-pix_fmt", "yuv420p"]);
    lavfi(&args, path);
}

fn music(path: &Path, seconds: u32) {
    let src = format!("sine=frequency=220:duration={seconds}");
    lavfi(&["-f", "lavfi", "-i", src.as_str(), "-c:a", "aac"], path);
}

fn frame_at(video: &Path, seconds: f64, dir: &Path) -> RgbaImage {
    let png = dir.join("frame.png");
    let ts = format!("{seconds:.2}");
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-ss", ts.as_str(), "-i"])
        .arg(video)
        .args(["-frames:v", "1"])
        .arg(&png)
        .status()
        .unwrap();
    assert!(status.success());
    image::open(&png).unwrap().to_rgba8()
}

async fn render(
    settings: RenderSettings,
    build: impl FnOnce(&RequestWorkspace) -> ReelInputs,
) -> (PathBuf, TempDir) {
    let temp_root = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let ws = RequestWorkspace::create(temp_root.path()).unwrap();
    let inputs = build(&ws);

    let pipeline = ReelPipeline::new(settings).unwrap();
    let reel = pipeline.render(&ws, &inputs, out.path()).await.unwrap();
    assert_eq!(reel.file_name, format!("{}.mp4", ws.id()));

    ws.close().unwrap();
    assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);
    (reel.path, out)
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_portrait_source_with_text_and_original_audio() {
    let (path, _out) = render(fast_settings(), |ws| {
        let video = ws.slot(Slot::Video);
        source_video(&video, 10, "720x1280", true);
        ReelInputs::new(video, "Test")
    })
    .await;

    let info = probe_media(&path).await.unwrap();
    assert_eq!((info.width, info.height), (1080, 1920));
    assert!((info.duration - 10.0).abs() < 0.2, "duration {}", info.duration);
    assert!(info.has_audio);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_long_source_is_capped() {
    let (path, _out) = render(fast_settings(), |ws| {
        let video = ws.slot(Slot::Video);
        source_video(&video, 90, "180x320", true);
        ReelInputs::new(video, "Too long")
    })
    .await;

    let info = probe_media(&path).await.unwrap();
    assert!((info.duration - 60.0).abs() < 0.2, "duration {}", info.duration);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_short_music_is_looped_over_silent_source() {
    let (path, _out) = render(fast_settings(), |ws| {
        let video = ws.slot(Slot::Video);
        let track = ws.upload_path(Slot::Music, Some("track.m4a"));
        source_video(&video, 8, "360x640", false);
        music(&track, 3);
        ReelInputs::new(video, "Loop it").with_music(track, MusicVolume::new(80.0).unwrap())
    })
    .await;

    let info = probe_media(&path).await.unwrap();
    assert!(info.has_audio);
    assert!((info.duration - 8.0).abs() < 0.2, "duration {}", info.duration);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_logo_black_background_shows_canvas() {
    let scratch = TempDir::new().unwrap();
    let (path, _out) = render(fast_settings(), |ws| {
        let video = ws.slot(Slot::Video);
        // Landscape source keeps the video band clear of the logo row
        source_video(&video, 2, "1280x720", true);

        let logo = ws.slot(Slot::Logo);
        let mut img = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        for x in 60..140 {
            for y in 30..70 {
                img.put_pixel(x, y, Rgba([220, 20, 20, 255]));
            }
        }
        img.save(&logo).unwrap();
        ReelInputs::new(video, "Logo").with_logo(logo)
    })
    .await;

    let frame = frame_at(&path, 1.0, scratch.path());
    // Logo spans x 415..665, y 1350..1475 on the canvas
    let corner = frame.get_pixel(420, 1355);
    assert!(corner.0[..3].iter().all(|c| *c > 200), "corner {:?}", corner);
    let center = frame.get_pixel(540, 1412);
    assert!(center[0] > 150 && center[1] < 100, "center {:?}", center);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_rendering_twice_is_stable() {
    let source_dir = TempDir::new().unwrap();
    let source = source_dir.path().join("source.mp4");
    source_video(&source, 4, "540x960", true);

    let mut results = Vec::new();
    for _ in 0..2 {
        let src = source.clone();
        let (path, out) = render(fast_settings(), |ws| {
            let video = ws.slot(Slot::Video);
            std::fs::copy(&src, &video).unwrap();
            ReelInputs::new(video, "Same input")
        })
        .await;
        results.push((probe_media(&path).await.unwrap(), out));
    }

    let (a, b) = (&results[0].0, &results[1].0);
    assert_eq!((a.width, a.height), (b.width, b.height));
    assert!((a.duration - b.duration).abs() < 1e-3);
}
