//! Sources for file transfers.

use std::path::{Path, PathBuf};

use threema_gateway_types::{GatewayError, Result};

/// Mime type used when none can be determined.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file to be sent, with an optional thumbnail.
pub trait FileSource {
    /// File name shown to the recipient.
    fn name(&self) -> String;

    /// Mime type, or `None` if unknown.
    fn mime_type(&self) -> Option<String>;

    /// Reads the file content.
    fn read(&self) -> Result<Vec<u8>>;

    /// Reads the thumbnail, if the source has one.
    fn read_thumbnail(&self) -> Result<Option<Vec<u8>>>;
}

// ---------------------------------------------------------------------------
// FilePath
// ---------------------------------------------------------------------------

/// A file (and optional thumbnail) on the local file system.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilePath {
    path: PathBuf,
    thumbnail_path: Option<PathBuf>,
}

impl FilePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            thumbnail_path: None,
        }
    }

    /// Attaches a thumbnail image.
    pub fn with_thumbnail(mut self, thumbnail_path: impl Into<PathBuf>) -> Self {
        self.thumbnail_path = Some(thumbnail_path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| GatewayError::IoError {
        reason: format!("failed to read {}: {e}", path.display()),
    })
}

impl FileSource for FilePath {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn mime_type(&self) -> Option<String> {
        let extension = self.path.extension()?.to_str()?.to_ascii_lowercase();
        mime_type_for_extension(&extension).map(str::to_owned)
    }

    fn read(&self) -> Result<Vec<u8>> {
        read_file(&self.path)
    }

    fn read_thumbnail(&self) -> Result<Option<Vec<u8>>> {
        self.thumbnail_path.as_deref().map(read_file).transpose()
    }
}

/// Maps a lowercase file extension to a mime type.
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}

// ---------------------------------------------------------------------------
// FileBytes
// ---------------------------------------------------------------------------

/// A file already held in memory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileBytes {
    pub name: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
}

impl FileSource for FileBytes {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn mime_type(&self) -> Option<String> {
        self.mime_type.clone()
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn read_thumbnail(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.thumbnail.clone())
    }
}
