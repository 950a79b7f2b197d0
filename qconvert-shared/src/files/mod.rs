/// Uploaded file storage and content views
///
/// Files are stored flat in the upload directory under a generated name
/// (`<uuid>.<ext>`), so client-supplied names never reach the filesystem.
/// Every derived view re-reads the file from disk; nothing is cached.
///
/// # Modules
///
/// - [`tabular`]: JSON/CSV parsing and metadata inference
/// - [`export`]: Download formats and chart series

pub mod export;
pub mod tabular;

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Content family, derived from the file extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Json,
    Csv,
    /// Any other extension (lowercased, possibly empty)
    Other(String),
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        match extension(name).as_str() {
            "json" => FileKind::Json,
            "csv" => FileKind::Csv,
            other => FileKind::Other(other.to_string()),
        }
    }

    /// Value stored in `data_files.file_type`
    pub fn as_str(&self) -> &str {
        match self {
            FileKind::Json => "json",
            FileKind::Csv => "csv",
            FileKind::Other(ext) => ext,
        }
    }
}

/// Lowercased extension without the dot; empty when there is none
pub fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// File name without its extension, for download names
pub fn stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("export")
        .to_string()
}

/// Unique on-disk name that keeps the original extension
pub fn generate_file_name(original_name: &str) -> String {
    match extension(original_name).as_str() {
        "" => Uuid::new_v4().to_string(),
        ext => format!("{}.{}", Uuid::new_v4(), ext),
    }
}

/// MIME type guessed from the extension
pub fn mime_type(name: &str) -> &'static str {
    match extension(name).as_str() {
        "json" => "application/json",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "py" => "text/x-python",
        "qasm" => "text/plain",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Hex-encoded SHA-256 of file contents
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Flat directory holding uploaded files
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

/// A file written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub checksum: String,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory if needed
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Writes bytes under a freshly generated name
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<StoredFile> {
        self.ensure_dir().await?;

        let file_name = generate_file_name(original_name);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(file_name = %file_name, size = bytes.len(), "Stored upload");

        Ok(StoredFile {
            file_path: path.to_string_lossy().into_owned(),
            file_name,
            file_size: bytes.len() as i64,
            checksum: checksum(bytes),
        })
    }

    /// Path of a stored file, given its generated name
    ///
    /// Returns `None` for names that could escape the store (separators,
    /// `..`, empty).
    pub fn resolve(&self, file_name: &str) -> Option<String> {
        let name = file_name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return None;
        }

        Some(self.root.join(name).to_string_lossy().into_owned())
    }

    /// Reads a stored file as UTF-8 text
    pub async fn read_text(path: &str) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    /// Removes a stored file; a file that is already gone is not an error
    ///
    /// Returns whether a file was removed.
    pub async fn remove(path: &str) -> io::Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
