//! Building a [`VideoFile`] from a path on disk.

use std::path::Path;

use scut_models::{VideoFile, MP4_MIME_TYPE};

/// MIME type guessed from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => MP4_MIME_TYPE,
        "mov" => "video/quicktime",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Describe a local file for upload. The bytes are streamed at upload time.
pub async fn video_file_from_path(path: &Path) -> std::io::Result<VideoFile> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(VideoFile::on_disk(name, mime_type_for(path), metadata.len(), path))
}
