use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex"));

/// Uploaded files stored under a media root, addressed by relative path.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `data` as `<upload_to>/<file_name>` and returns that relative
    /// path. A taken name gets a short random suffix before its extension.
    pub async fn save(&self, upload_to: &str, file_name: &str, data: &[u8]) -> AppResult<String> {
        let dir = self.root.join(upload_to);
        tokio::fs::create_dir_all(&dir).await?;

        let clean = sanitize_file_name(file_name);
        let mut candidate = clean.clone();
        for _ in 0..8 {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dir.join(&candidate))
                .await
            {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    let relative = format!("{}/{}", upload_to, candidate);
                    info!("Stored upload {} ({} bytes)", relative, data.len());
                    return Ok(relative);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = with_suffix(&clean, &Uuid::new_v4().simple().to_string()[..7]);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::MediaError(format!("No free file name for {}", clean)))
    }

    /// Deletes a stored file by its relative path. A missing file is not an error.
    pub async fn remove(&self, relative: &str) -> AppResult<()> {
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => {
                info!("Removed upload {}", relative);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Upload {} already gone", relative);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = UNSAFE_FILE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    }
}
