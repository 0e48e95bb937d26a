//! Image store
//!
//! Uploaded (or proxied) images land in one flat folder under short
//! unique names; the server hands back URLs pointing at the get-image
//! route.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::shared::ids;

/// Extensions accepted for uploads and URL fetches.
pub const ALLOWED_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Image store errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// Extension outside the whitelist
    #[error("\"{0}\" is not a supported image type")]
    UnsupportedExtension(String),

    /// Name containing path separators or traversal
    #[error("Invalid image name: {0}")]
    InvalidFilename(String),

    /// No stored image under that name
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Upstream fetch failed
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Flat on-disk image store.
#[derive(Clone)]
pub struct ImageStore {
    dir: PathBuf,
    client: reqwest::Client,
}

impl ImageStore {
    pub fn new(dir: PathBuf) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self { dir, client }
    }

    /// Store uploaded bytes under a fresh short name, keeping the original
    /// extension. Returns the stored file name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let ext = extension_of(original_name)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| ImageError::UnsupportedExtension(original_name.to_string()))?;

        let filename = format!("{}{}", ids::short_token(), ext);
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&filename), bytes).await?;
        info!("Stored image {}", filename);
        Ok(filename)
    }

    /// Download an image from a remote URL into the store. Unknown
    /// extensions default to `.png`.
    pub async fn fetch_from_url(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let ext = url_extension(url)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or_else(|| ".png".to_string());

        let filename = format!("{}{}", ids::short_token(), ext);
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&filename), &bytes).await?;
        info!("Fetched image {} from {}", filename, url);
        Ok(filename)
    }

    /// Resolve a stored image, rejecting names that could escape the
    /// store directory.
    pub async fn open(&self, filename: &str) -> Result<(PathBuf, Vec<u8>)> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename.contains("..")
        {
            return Err(ImageError::InvalidFilename(filename.to_string()));
        }

        let path = self.dir.join(filename);
        match fs::read(&path).await {
            Ok(bytes) => Ok((path, bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ImageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Lowercased extension (with leading dot) of a file name.
fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Extension taken from a URL path, ignoring any query string.
fn url_extension(url: &str) -> Option<String> {
    let without_query = url.split('?').next().unwrap_or(url);
    extension_of(without_query)
}
