use serde::Serialize;

use crate::utils;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessagePart {
    Text(String),
    Image {
        data_b64: String,
        mime_type: Option<String>,
        file_path: Option<String>,
    },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text(text.into())
    }

    pub fn image_b64(data_b64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        MessagePart::Image {
            data_b64: data_b64.into(),
            mime_type: Some(mime_type.into()),
            file_path: None,
        }
    }

    /// MIME type sent for an image part: the explicit one, else guessed from
    /// the file path, else JPEG.
    pub fn resolved_mime_type(&self) -> Option<String> {
        match self {
            MessagePart::Text(_) => None,
            MessagePart::Image {
                mime_type,
                file_path,
                ..
            } => Some(
                mime_type
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .or_else(|| file_path.as_ref().map(utils::detect_mime_type))
                    .unwrap_or_else(|| utils::FALLBACK_IMAGE_MIME.to_string()),
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
    pub created_at: u64,
}

impl Message {
    pub fn new(id: Option<String>, role: Role, parts: Vec<MessagePart>) -> Self {
        let created_at = utils::current_timestamp_millis();
        Self {
            id: id.unwrap_or_else(|| created_at.to_string()),
            role,
            parts,
            created_at,
        }
    }

    pub fn user(parts: Vec<MessagePart>) -> Self {
        Self::new(None, Role::User, parts)
    }
}

/// `generationConfig.imageConfig` of a generateContent request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

impl GenerationConfig {
    /// Asks for both text and image parts, the mode image models expect.
    pub fn image(image_config: ImageConfig) -> Self {
        Self {
            response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            image_config: Some(image_config),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) endpoint: String,
    pub(crate) model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_http_client(reqwest::Client::new(), api_key, endpoint, model)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let endpoint: String = endpoint.into();
        let model: String = model.into();
        let model = model.trim();
        Self {
            http,
            api_key: api_key.into(),
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            model: model.strip_prefix("models/").unwrap_or(model).to_string(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_normalises_endpoint_and_model() {
        let client = GeminiClient::new(
            "key",
            "https://generativelanguage.googleapis.com/v1beta/models/",
            "models/gemini-3-pro-image-preview",
        );
        assert_eq!(
            client.model_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-image-preview"
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = GeminiClient::new("secret-key", "https://example.com", "model");
        assert!(!format!("{client:?}").contains("secret-key"));
    }

    #[test]
    fn image_part_mime_resolution() {
        let explicit = MessagePart::image_b64("AAAA", "image/webp");
        assert_eq!(explicit.resolved_mime_type().as_deref(), Some("image/webp"));

        let from_path = MessagePart::Image {
            data_b64: "AAAA".into(),
            mime_type: Some("  ".into()),
            file_path: Some("ref.png".into()),
        };
        assert_eq!(from_path.resolved_mime_type().as_deref(), Some("image/png"));

        assert_eq!(MessagePart::text("hi").resolved_mime_type(), None);
    }
}
