use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::fs::try_exists;

pub async fn ensure_dir(path: &Path) -> Result<PathBuf, String> {
    if !try_exists(path)
        .await
        .map_err(|err| format!("Failed to check directory '{}': {}", path.display(), err))?
    {
        fs::create_dir_all(path)
            .await
            .map_err(|err| format!("Unable to create directory '{}': {}", path.display(), err))?;
    }
    Ok(path.to_path_buf())
}

pub async fn ensure_unique_file_name(dir: &Path, original: &str) -> Result<String, String> {
    if !try_exists(dir.join(original))
        .await
        .map_err(|err| format!("Failed to verify file existence: {}", err))?
    {
        return Ok(original.to_string());
    }

    let original_path = Path::new(original);
    let stem = original_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    let extension = original_path.extension().and_then(|ext| ext.to_str());

    let mut counter = 1;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{stem}-{counter}.{ext}"),
            None => format!("{stem}-{counter}"),
        };

        if !try_exists(dir.join(&candidate))
            .await
            .map_err(|err| format!("Failed to verify file existence: {}", err))?
        {
            return Ok(candidate);
        }

        counter += 1;
    }
}

pub fn resolve_mime_type(candidate: Option<&str>, path: &Path) -> String {
    if let Some(value) = candidate {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

pub fn default_extension_for_mime(mime_type: &str) -> Option<String> {
    let mime = mime_type.trim().to_lowercase();
    let ext = match mime.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tiff"),
        _ => None,
    };

    if let Some(value) = ext {
        return Some(value.to_string());
    }

    mime.split('/')
        .nth(1)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

pub fn display_file_name(path: &Path) -> Result<String, String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("Invalid UTF-8 in file name: {}", path.display()))
}

/// `file://` locator for an on-disk file, absolute when it can be resolved.
pub fn file_url(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}
