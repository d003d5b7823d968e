use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::library::{list_generation_logs, GenerationLogEntry};

pub async fn run(config: &AppConfig, limit: usize) -> Result<()> {
    let entries = list_generation_logs(&config.output_dir())
        .await
        .map_err(anyhow::Error::msg)
        .context("Failed to read generation history")?;

    if entries.is_empty() {
        println!("No generations yet.");
        return Ok(());
    }

    for entry in recent(&entries, limit) {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// The last `limit` entries, newest first.
pub fn recent(
    entries: &[GenerationLogEntry],
    limit: usize,
) -> impl Iterator<Item = &GenerationLogEntry> {
    entries.iter().rev().take(limit)
}

pub fn format_entry(entry: &GenerationLogEntry) -> String {
    let references = if entry.reference_images.is_empty() {
        "no references".to_string()
    } else {
        entry.reference_images.join(", ")
    };
    format!(
        "[{}] {} ({} {}) <- {} | {}",
        entry.timestamp,
        entry.output_image,
        entry.settings.aspect_ratio,
        entry.settings.image_size,
        references,
        entry.prompt
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationSettings;

    fn entry(timestamp: u64, references: &[&str]) -> GenerationLogEntry {
        GenerationLogEntry {
            timestamp,
            prompt: format!("prompt {timestamp}"),
            settings: GenerationSettings::default(),
            reference_images: references.iter().map(|name| name.to_string()).collect(),
            output_image: format!("image_{timestamp}.png"),
        }
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let entries = vec![entry(1, &[]), entry(2, &[]), entry(3, &[])];
        let timestamps: Vec<u64> = recent(&entries, 2).map(|entry| entry.timestamp).collect();
        assert_eq!(timestamps, vec![3, 2]);
    }

    #[test]
    fn formats_entry_on_one_line() {
        assert_eq!(
            format_entry(&entry(7, &["front.png", "side.png"])),
            "[7] image_7.png (1:1 1K) <- front.png, side.png | prompt 7"
        );
        assert!(format_entry(&entry(8, &[])).contains("no references"));
    }
}
