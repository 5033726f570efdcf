//! Filesystem helpers for publishing rendered files.
//!
//! Renders happen inside the per-request scratch directory, which may live on
//! a different filesystem than the public output directory.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move a file from `src` to `dst`, falling back to copy+delete across devices.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Cross-device rename, copying instead"
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Publish a finished render as `<output_dir>/<file_name>`.
///
/// Returns the published path. An existing file with the same name is replaced.
pub async fn publish_output(
    rendered: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    file_name: &str,
) -> MediaResult<PathBuf> {
    if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\') {
        return Err(MediaError::invalid_parameter(format!(
            "invalid output file name: {file_name:?}"
        )));
    }
    let dst = output_dir.as_ref().join(file_name);
    move_file(rendered, &dst).await?;
    Ok(dst)
}

/// EXDEV is 18 on Linux and macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    // Stage next to dst so the final rename stays on one filesystem
    let staged = dst.with_extension("partial");

    if let Err(e) = fs::copy(src, &staged).await {
        let _ = fs::remove_file(&staged).await;
        tracing::error!(
            src = %src.display(),
            staged = %staged.display(),
            "Copy failed during cross-device move: {}", e
        );
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&staged, dst).await {
        let _ = fs::remove_file(&staged).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(src = %src.display(), "Failed to remove source after move: {}", e);
    }

    Ok(())
}
