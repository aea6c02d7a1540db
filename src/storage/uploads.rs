use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::forms::validators::{check_cropped_avatar, has_allowed_image_extension};

/// Stored picture reference for users without an upload. Served from the static dir.
pub const DEFAULT_AVATAR: &str = "img/default_avatar.svg";
const UPLOAD_PREFIX: &str = "uploads/";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Rejected(&'static str),
}

/// Profile pictures on local disk. References stored on users look like
/// `uploads/<uuid><ext>`.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
}

impl UploadStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// `Ok(None)` when the filename has no allowed image extension.
    pub async fn save_file(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<Option<String>, UploadError> {
        if !has_allowed_image_extension(original_name) {
            return Ok(None);
        }
        let ext = Path::new(&original_name.to_lowercase())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        self.write(&ext, bytes).await.map(Some)
    }

    /// Stores a cropped `data:image/...;base64,` picture.
    pub async fn save_data_url(&self, data_url: &str) -> Result<String, UploadError> {
        let bytes = check_cropped_avatar(data_url).map_err(UploadError::Rejected)?;
        let header = data_url.split(',').next().unwrap_or_default();
        let ext = if header.contains("image/png") {
            ".png"
        } else if header.contains("image/webp") {
            ".webp"
        } else {
            ".jpg"
        };
        self.write(ext, &bytes).await
    }

    async fn write(&self, ext: &str, bytes: &[u8]) -> Result<String, UploadError> {
        self.ensure_dir().await?;
        let name = format!("{}{ext}", Uuid::new_v4().simple());
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::debug!(file = %name, size = bytes.len(), "stored upload");
        Ok(format!("{UPLOAD_PREFIX}{name}"))
    }

    /// Browser URL for a stored picture reference, falling back to the default avatar.
    pub fn avatar_url(&self, reference: Option<&str>) -> String {
        let default = format!("/static/{DEFAULT_AVATAR}");
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return default;
        };
        match reference.strip_prefix(UPLOAD_PREFIX) {
            Some(name) if is_plain_file_name(name) && self.dir.join(name).is_file() => {
                format!("/uploads/{name}")
            }
            Some(_) => default,
            None => format!("/static/{}", reference.trim_start_matches('/')),
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}
