//! Upload validation and storage helpers.

use std::path::{Path, PathBuf};

use crate::error::{ApiError, ApiResult};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Validate a video upload's extension, returning it lowercased.
pub fn video_extension(file_name: &str) -> ApiResult<String> {
    match extension_of(file_name) {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(ApiError::bad_request(format!(
            "unsupported video format: {file_name} (expected .mp4, .mov or .avi)"
        ))),
    }
}

/// Validate an image upload's extension, returning it lowercased.
pub fn image_extension(file_name: &str) -> ApiResult<String> {
    match extension_of(file_name) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(ApiError::bad_request(format!(
            "unsupported image format: {file_name} (expected .jpg, .jpeg or .png)"
        ))),
    }
}

/// Persist uploaded bytes under `dir/name`, creating the directory.
pub async fn save_upload(dir: &Path, name: &str, bytes: &[u8]) -> ApiResult<PathBuf> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension_accepts_known_formats() {
        assert_eq!(video_extension("clip.MP4").unwrap(), "mp4");
        assert_eq!(video_extension("clip.mov").unwrap(), "mov");
        assert!(video_extension("clip.mkv").is_err());
        assert!(video_extension("noext").is_err());
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("card.PNG").unwrap(), "png");
        assert!(image_extension("card.gif").is_err());
    }
}
