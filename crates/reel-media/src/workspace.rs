//! Per-request scratch directory.
//!
//! A [`RequestWorkspace`] owns a uniquely named directory under the temp root.
//! Every upload and intermediate raster of one request lives inside it, and
//! the directory is removed when the workspace is dropped.

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::error::MediaResult;

/// Named files a request may place in its workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Video,
    Logo,
    Music,
    TextLayer,
    LogoLayer,
    Render,
}

impl Slot {
    pub fn stem(self) -> &'static str {
        match self {
            Slot::Video => "video",
            Slot::Logo => "logo",
            Slot::Music => "music",
            Slot::TextLayer => "text",
            Slot::LogoLayer => "logo_clean",
            Slot::Render => "render",
        }
    }

    fn default_extension(self) -> &'static str {
        match self {
            Slot::Video | Slot::Render => "mp4",
            Slot::Logo | Slot::TextLayer | Slot::LogoLayer => "png",
            Slot::Music => "mp3",
        }
    }
}

/// Scoped temp directory tagged with a request id.
pub struct RequestWorkspace {
    id: String,
    dir: TempDir,
}

impl RequestWorkspace {
    /// Create a workspace under `root`, creating `root` if needed.
    pub fn create(root: impl AsRef<Path>) -> MediaResult<Self> {
        Self::with_id(root, Uuid::new_v4().to_string())
    }

    /// Create a workspace with a caller-chosen id.
    pub fn with_id(root: impl AsRef<Path>, id: impl Into<String>) -> MediaResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let id = id.into();
        let dir = tempfile::Builder::new()
            .prefix(&format!("reel-{id}-"))
            .tempdir_in(root)?;
        tracing::debug!(request_id = %id, dir = %dir.path().display(), "Workspace created");
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// `<dir>/<id>_<name>`
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{}_{}", self.id, name))
    }

    /// Path for a slot with its default extension.
    pub fn slot(&self, slot: Slot) -> PathBuf {
        self.path(&format!("{}.{}", slot.stem(), slot.default_extension()))
    }

    /// Path for an uploaded file, keeping the client's extension when it is sane.
    ///
    /// ffmpeg and the `image` crate both sniff formats from the extension, so
    /// a `.mov` upload should stay `.mov`.
    pub fn upload_path(&self, slot: Slot, client_file_name: Option<&str>) -> PathBuf {
        let ext = client_file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or_else(|| slot.default_extension().to_string());
        self.path(&format!("{}.{}", slot.stem(), ext))
    }

    /// Remove the directory now and report failures.
    pub fn close(self) -> MediaResult<()> {
        let id = self.id;
        self.dir.close()?;
        tracing::debug!(request_id = %id, "Workspace removed");
        Ok(())
    }
}

impl fmt::Debug for RequestWorkspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestWorkspace")
            .field("id", &self.id)
            .field("dir", &self.dir.path())
            .finish()
    }
}
