//! Reel generation handler.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use reel_ai::generate_copy;
use reel_media::{ReelInputs, RequestWorkspace, Slot};
use reel_models::{GenerateVideoResponse, MusicVolume};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::RequestId;
use crate::services::resolve_api_key;
use crate::state::AppState;

const MISSING_INPUT: &str = "Missing video or API key";

/// Fields of the `generate-video` multipart form.
#[derive(Debug, Default)]
struct GenerateForm {
    video: Option<PathBuf>,
    logo: Option<PathBuf>,
    music: Option<PathBuf>,
    description: String,
    overlay_text: Option<String>,
    music_volume: Option<String>,
    api_key: Option<String>,
}

/// `POST /api/generate-video`.
pub async fn generate_video(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    multipart: Multipart,
) -> ApiResult<Json<GenerateVideoResponse>> {
    let workspace = RequestWorkspace::create(&state.config.temp_dir)?;
    let request_id = request_id.map(|Extension(id)| id.0);
    info!(
        request_id = request_id.as_deref().unwrap_or("-"),
        render_id = workspace.id(),
        "Generate video request"
    );

    let result = generate(&state, &workspace, multipart).await;
    if let Err(e) = &result {
        metrics::record_generation_failure(e.kind());
        warn!(render_id = workspace.id(), kind = e.kind(), "Generate video failed: {}", e);
    }

    if let Err(e) = workspace.close() {
        warn!("Failed to remove request workspace: {}", e);
    }
    result.map(Json)
}

async fn generate(
    state: &AppState,
    workspace: &RequestWorkspace,
    multipart: Multipart,
) -> ApiResult<GenerateVideoResponse> {
    let form = read_form(multipart, workspace).await?;

    let video = form
        .video
        .ok_or_else(|| ApiError::invalid_request(MISSING_INPUT))?;
    let api_key = resolve_api_key(
        state.config.gemini_api_key.as_deref(),
        form.api_key.as_deref(),
    )
    .ok_or_else(|| ApiError::invalid_request(MISSING_INPUT))?;
    let volume: MusicVolume = form.music_volume.as_deref().unwrap_or("").parse()?;

    let copy = generate_copy(
        state.captions.as_ref(),
        &api_key,
        &form.description,
        form.overlay_text.as_deref(),
    )
    .await;
    if copy.is_error() {
        metrics::record_ai_failure();
        return Err(ApiError::AiGenerationFailed(copy.overlay_text));
    }

    let mut inputs = ReelInputs::new(video, copy.overlay_text.clone());
    if let Some(logo) = form.logo {
        inputs = inputs.with_logo(logo);
    }
    if let Some(music) = form.music {
        inputs = inputs.with_music(music, volume);
    }

    let reel = state
        .pipeline
        .render(workspace, &inputs, &state.config.output_dir)
        .await?;
    metrics::record_video_generated(reel.has_logo, inputs.music.is_some());

    Ok(GenerateVideoResponse::success(
        state.config.output_url(&reel.file_name),
        copy.overlay_text,
        copy.caption,
    ))
}

/// Stream uploads into `workspace` and collect the text fields.
async fn read_form(mut multipart: Multipart, workspace: &RequestWorkspace) -> ApiResult<GenerateForm> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => form.video = save_upload(field, workspace, Slot::Video).await?,
            "logo" => form.logo = save_upload(field, workspace, Slot::Logo).await?,
            "music" => form.music = save_upload(field, workspace, Slot::Music).await?,
            "description" => form.description = field.text().await?,
            "overlay_text" => form.overlay_text = Some(field.text().await?),
            "music_volume" => form.music_volume = Some(field.text().await?),
            "api_key" => form.api_key = Some(field.text().await?),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Save one file field. Empty uploads count as absent.
async fn save_upload(
    field: Field<'_>,
    workspace: &RequestWorkspace,
    slot: Slot,
) -> ApiResult<Option<PathBuf>> {
    let path = workspace.upload_path(slot, field.file_name());
    let written = write_field(field, &path).await?;
    if written == 0 {
        tokio::fs::remove_file(&path).await?;
        return Ok(None);
    }

    metrics::record_upload_bytes(slot.stem(), written);
    Ok(Some(path))
}

async fn write_field(mut field: Field<'_>, path: &Path) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
