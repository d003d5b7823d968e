//! Presentation layer: a view model derived purely from a session snapshot,
//! and its text rendering for the console.

use std::fmt;

use gemini_image::utils::parse_data_url;

use crate::models::{AspectRatio, ImageSize};
use crate::session::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionIndicator {
    pub connected: bool,
}

impl ConnectionIndicator {
    pub fn label(&self) -> &'static str {
        if self.connected {
            "API Connected"
        } else {
            "No API Key"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPanel {
    Busy,
    Image(String),
    Error(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptForm {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
    pub reference_count: usize,
    pub is_generating: bool,
    pub can_generate: bool,
    /// Without a key the form offers key selection instead of generation.
    pub needs_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub connection: ConnectionIndicator,
    pub references: Vec<ReferenceRow>,
    pub result: ResultPanel,
    pub form: PromptForm,
}

impl ViewModel {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let state = &snapshot.state;
        let has_key = snapshot.api_key_valid;

        let result = if state.is_generating {
            ResultPanel::Busy
        } else if let Some(url) = &state.generated_image {
            ResultPanel::Image(url.clone())
        } else if let Some(error) = &state.error {
            ResultPanel::Error(error.clone())
        } else {
            ResultPanel::Empty
        };

        Self {
            connection: ConnectionIndicator { connected: has_key },
            references: state
                .references
                .images()
                .iter()
                .map(|image| ReferenceRow {
                    id: image.id.clone(),
                    name: image.name.clone(),
                    mime_type: image.mime_type.clone(),
                })
                .collect(),
            result,
            form: PromptForm {
                prompt: state.prompt.clone(),
                aspect_ratio: state.settings.aspect_ratio,
                image_size: state.settings.image_size,
                reference_count: state.references.len(),
                is_generating: state.is_generating,
                can_generate: has_key && !state.is_generating,
                needs_key: !has_key,
            },
        }
    }
}

/// Short human description of an image locator; data URLs are summarised
/// instead of dumped.
pub fn describe_image_url(url: &str) -> String {
    match parse_data_url(url) {
        Some((mime_type, data)) => {
            let approx_bytes = data.trim().len() / 4 * 3;
            format!("{mime_type} image, ~{} KB", approx_bytes.div_ceil(1024))
        }
        None => url.to_string(),
    }
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OC Forge  [{}]", self.connection.label())?;

        writeln!(f, "References ({}):", self.references.len())?;
        if self.references.is_empty() {
            writeln!(f, "  (none, use `add <path>`)")?;
        }
        for (index, row) in self.references.iter().enumerate() {
            writeln!(
                f,
                "  {}. {}  {}  [{}]",
                index + 1,
                row.name,
                row.mime_type,
                row.id
            )?;
        }

        let prompt = if self.form.prompt.trim().is_empty() {
            "(empty)"
        } else {
            self.form.prompt.as_str()
        };
        writeln!(f, "Prompt: {prompt}")?;
        writeln!(
            f,
            "Settings: aspect {}  size {}",
            self.form.aspect_ratio, self.form.image_size
        )?;

        match &self.result {
            ResultPanel::Busy => writeln!(f, "Result: generating...")?,
            ResultPanel::Image(url) => writeln!(f, "Result: {}", describe_image_url(url))?,
            ResultPanel::Error(message) => writeln!(f, "Error: {message}")?,
            ResultPanel::Empty => writeln!(f, "Result: -")?,
        }

        let action = if self.form.needs_key {
            "`key` to select an API key"
        } else if self.form.can_generate {
            "`generate` to create an image"
        } else {
            "waiting for the current generation"
        };
        write!(f, "Next: {action}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerationSettings, ReferenceImage};
    use crate::session::GenerationState;

    fn snapshot(valid: bool, state: GenerationState) -> SessionSnapshot {
        SessionSnapshot {
            api_key_valid: valid,
            state,
        }
    }

    #[test]
    fn connection_label_follows_validity() {
        let view = ViewModel::from_snapshot(&snapshot(true, GenerationState::default()));
        assert_eq!(view.connection.label(), "API Connected");
        assert!(view.form.can_generate);
        assert!(!view.form.needs_key);

        let view = ViewModel::from_snapshot(&snapshot(false, GenerationState::default()));
        assert_eq!(view.connection.label(), "No API Key");
        assert!(!view.form.can_generate);
        assert!(view.form.needs_key);
    }

    #[test]
    fn result_panel_precedence() {
        let mut state = GenerationState {
            is_generating: true,
            generated_image: Some("data:image/png;base64,AAAA".into()),
            error: Some("boom".into()),
            ..GenerationState::default()
        };
        let view = ViewModel::from_snapshot(&snapshot(true, state.clone()));
        assert_eq!(view.result, ResultPanel::Busy);
        assert!(!view.form.can_generate);

        state.is_generating = false;
        let view = ViewModel::from_snapshot(&snapshot(true, state.clone()));
        assert!(matches!(view.result, ResultPanel::Image(_)));

        state.generated_image = None;
        let view = ViewModel::from_snapshot(&snapshot(true, state.clone()));
        assert_eq!(view.result, ResultPanel::Error("boom".into()));

        state.error = None;
        let view = ViewModel::from_snapshot(&snapshot(true, state));
        assert_eq!(view.result, ResultPanel::Empty);
    }

    #[test]
    fn renders_references_and_settings() {
        let mut state = GenerationState {
            prompt: "a fox knight".into(),
            settings: GenerationSettings {
                aspect_ratio: AspectRatio::Tall,
                image_size: ImageSize::TwoK,
            },
            ..GenerationState::default()
        };
        state.references.add(vec![ReferenceImage {
            id: "id-1".into(),
            url: "file:///refs/fox.png".into(),
            base64: "AAAA".into(),
            mime_type: "image/png".into(),
            name: "fox.png".into(),
        }]);

        let rendered = ViewModel::from_snapshot(&snapshot(false, state)).to_string();
        assert!(rendered.contains("[No API Key]"));
        assert!(rendered.contains("References (1):"));
        assert!(rendered.contains("1. fox.png  image/png  [id-1]"));
        assert!(rendered.contains("Prompt: a fox knight"));
        assert!(rendered.contains("Settings: aspect 9:16  size 2K"));
        assert!(rendered.contains("`key` to select an API key"));
    }

    #[test]
    fn data_urls_are_summarised() {
        let payload = "A".repeat(4096);
        let url = format!("data:image/png;base64,{payload}");
        assert_eq!(describe_image_url(&url), "image/png image, ~3 KB");
        assert_eq!(describe_image_url("/tmp/out.png"), "/tmp/out.png");
    }
}
