use bytes::Bytes;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{error, info, instrument, warn};

use crate::model::product::UPLOADS_URL_PREFIX;

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9A-Za-z_.-]").expect("static regex"))
}

/// Final path component with anything outside `[0-9A-Za-z_.-]` removed.
pub fn strip_file_name(raw: &str) -> String {
    let base = Path::new(raw).file_name().and_then(|n| n.to_str()).unwrap_or("");
    unsafe_chars().replace_all(base, "").into_owned()
}

/// Final path component with anything outside `[0-9A-Za-z_.-]` replaced by `_`.
pub fn underscore_file_name(raw: &str) -> String {
    let base = Path::new(raw).file_name().and_then(|n| n.to_str()).unwrap_or("");
    unsafe_chars().replace_all(base, "_").into_owned()
}

/// Writes uploads below the public uploads directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        UploadStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(file_name), bytes).await?;
        Ok(format!("{}{}", UPLOADS_URL_PREFIX, file_name))
    }

    /// Saves product images as `<millis>_<name>` and returns their public URLs.
    /// Files without a name, empty files and failed writes are skipped.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn save_product_images(&self, files: &[UploadedFile]) -> Vec<String> {
        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            let clean = strip_file_name(&file.file_name);
            if clean.is_empty() || file.bytes.is_empty() {
                warn!(file_name = %file.file_name, "Skipping empty upload");
                continue;
            }
            let stored_name = format!("{}_{}", chrono::Utc::now().timestamp_millis(), clean);
            match self.write(&stored_name, &file.bytes).await {
                Ok(url) => saved.push(url),
                Err(e) => error!("Failed to save file {}: {}", file.file_name, e),
            }
        }
        info!(saved = saved.len(), "Product images stored");
        saved
    }

    /// Saves an avatar as `<user_id>_<secs>_<name>` and returns its public URL.
    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn save_avatar(&self, user_id: &str, file: &UploadedFile) -> std::io::Result<String> {
        let safe = underscore_file_name(&file.file_name);
        let safe = if safe.is_empty() { "avatar".to_string() } else { safe };
        let stored_name = format!("{}_{}_{}", user_id, chrono::Utc::now().timestamp(), safe);
        self.write(&stored_name, &file.bytes).await
    }
}
