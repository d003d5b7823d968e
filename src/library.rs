//! On-disk side of the forge: loading reference images from files, saving
//! generated images and keeping the generation log.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use gemini_image::utils::{decode_base64, encode_byte_to_base64, parse_data_url};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::fs::try_exists;
use uuid::Uuid;

use crate::constants::{LOG_FILE_NAME, MAX_LOG_ENTRIES};
use crate::fs_utils::{
    default_extension_for_mime, display_file_name, ensure_dir, ensure_unique_file_name, file_url,
    resolve_mime_type,
};
use crate::models::{GenerationSettings, ReferenceImage};

/// Reads image files into reference records. Any non-image file fails the
/// whole batch so a half-added selection never reaches the store.
pub async fn load_reference_images(paths: &[PathBuf]) -> Result<Vec<ReferenceImage>, String> {
    let mut images = Vec::with_capacity(paths.len());

    for path in paths {
        let metadata = fs::metadata(path)
            .await
            .map_err(|err| format!("Unable to read '{}': {}", path.display(), err))?;
        if !metadata.is_file() {
            return Err(format!("'{}' is not a file.", path.display()));
        }

        let mime_type = resolve_mime_type(None, path);
        if !mime_type.starts_with("image/") {
            return Err(format!(
                "'{}' is not an image (detected {}).",
                path.display(),
                mime_type
            ));
        }

        let bytes = fs::read(path)
            .await
            .map_err(|err| format!("Unable to read file '{}': {}", path.display(), err))?;

        images.push(ReferenceImage {
            id: Uuid::new_v4().to_string(),
            url: file_url(path),
            base64: encode_byte_to_base64(&bytes),
            mime_type,
            name: display_file_name(path)?,
        });
    }

    Ok(images)
}

/// Decodes a `data:` URL and writes it to `output_dir` under a fresh
/// `image_<millis>.<ext>` name.
pub async fn save_generated_image(output_dir: &Path, image_url: &str) -> Result<PathBuf, String> {
    let (mime_type, data) = parse_data_url(image_url)
        .ok_or_else(|| "Generated image is not a base64 data URL.".to_string())?;
    let bytes = decode_base64(data)
        .map_err(|err| format!("Failed to decode generated image: {}", err))?;

    let output_dir = ensure_dir(output_dir).await?;
    let extension = default_extension_for_mime(mime_type).unwrap_or_else(|| "bin".to_string());
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let base_name = format!("image_{timestamp}.{extension}");

    let unique_name = ensure_unique_file_name(&output_dir, &base_name).await?;
    let target_path = output_dir.join(&unique_name);

    fs::write(&target_path, &bytes)
        .await
        .map_err(|err| format!("Unable to persist generated image: {}", err))?;

    Ok(target_path)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationLogEntry {
    pub timestamp: u64,
    pub prompt: String,
    pub settings: GenerationSettings,
    pub reference_images: Vec<String>,
    pub output_image: String,
}

impl GenerationLogEntry {
    pub fn new(
        prompt: &str,
        settings: GenerationSettings,
        references: &[ReferenceImage],
        output_image: &Path,
    ) -> Self {
        Self {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            prompt: prompt.trim().to_string(),
            settings,
            reference_images: references.iter().map(|image| image.name.clone()).collect(),
            output_image: output_image
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.to_string())
                .unwrap_or_else(|| output_image.display().to_string()),
        }
    }
}

/// Appends to `log.json`, keeping only the most recent entries.
pub async fn append_generation_log(
    output_dir: &Path,
    entry: GenerationLogEntry,
) -> Result<(), String> {
    let dir = ensure_dir(output_dir).await?;
    let path = dir.join(LOG_FILE_NAME);

    let mut entries: Vec<GenerationLogEntry> = if try_exists(&path)
        .await
        .map_err(|err| format!("Failed to check log file: {}", err))?
    {
        let contents = fs::read_to_string(&path)
            .await
            .unwrap_or_else(|_| "[]".to_string());
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), "discarding unreadable generation log: {err}");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    entries.push(entry);
    if entries.len() > MAX_LOG_ENTRIES {
        entries = entries.split_off(entries.len() - MAX_LOG_ENTRIES);
    }

    let payload = serde_json::to_string_pretty(&entries)
        .map_err(|err| format!("Unable to serialise generation logs: {}", err))?;

    fs::write(&path, payload)
        .await
        .map_err(|err| format!("Failed to write generation log: {}", err))
}

pub async fn list_generation_logs(output_dir: &Path) -> Result<Vec<GenerationLogEntry>, String> {
    let path = output_dir.join(LOG_FILE_NAME);

    if !try_exists(&path)
        .await
        .map_err(|err| format!("Failed to check log file: {}", err))?
    {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(&path)
        .await
        .map_err(|err| format!("Unable to read generation log: {}", err))?;

    serde_json::from_str(&contents)
        .map_err(|err| format!("Unable to parse generation log: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectRatio;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[tokio::test]
    async fn loads_images_in_given_order_with_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("front.png");
        let second = dir.path().join("side.jpg");
        std::fs::write(&first, PNG_MAGIC).unwrap();
        std::fs::write(&second, b"\xff\xd8\xff").unwrap();

        let images = load_reference_images(&[first, second]).await.unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "front.png");
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[0].base64, encode_byte_to_base64(PNG_MAGIC));
        assert!(images[0].url.starts_with("file://"));
        assert_eq!(images[1].mime_type, "image/jpeg");
        assert_ne!(images[0].id, images[1].id);
    }

    #[tokio::test]
    async fn rejects_non_images_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "hello").unwrap();

        let err = load_reference_images(&[notes]).await.unwrap_err();
        assert!(err.contains("is not an image"));

        let missing = dir.path().join("missing.png");
        assert!(load_reference_images(&[missing]).await.is_err());
    }

    #[tokio::test]
    async fn saves_data_url_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let url = format!("data:image/png;base64,{}", encode_byte_to_base64(PNG_MAGIC));

        let path = save_generated_image(&output, &url).await.unwrap();

        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("png"));
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC);

        assert!(save_generated_image(&output, "https://example.com/x.png")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn log_keeps_most_recent_entries() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_generation_logs(dir.path()).await.unwrap().is_empty());

        for index in 0..(MAX_LOG_ENTRIES + 3) {
            let entry = GenerationLogEntry::new(
                &format!("prompt {index}"),
                GenerationSettings {
                    aspect_ratio: AspectRatio::Landscape,
                    ..GenerationSettings::default()
                },
                &[],
                Path::new("/tmp/output/image_1.png"),
            );
            append_generation_log(dir.path(), entry).await.unwrap();
        }

        let entries = list_generation_logs(dir.path()).await.unwrap();
        assert_eq!(entries.len(), MAX_LOG_ENTRIES);
        assert_eq!(entries[0].prompt, "prompt 3");
        assert_eq!(entries.last().unwrap().output_image, "image_1.png");
        assert_eq!(entries[0].settings.aspect_ratio, AspectRatio::Landscape);
    }
}
