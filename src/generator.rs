use std::sync::Arc;

use async_trait::async_trait;
use gemini_image::models::GeminiResponse;
use gemini_image::utils::to_data_url;
use gemini_image::{
    first_inline_image, response_to_text_data, send_generate_request, GeminiClient,
    GenerationConfig, ImageConfig, Message, MessagePart,
};

use crate::constants::DEFAULT_IMAGE_MIME;
use crate::credentials::CredentialProvider;
use crate::error::GenerationError;
use crate::models::{GenerationResult, GenerationSettings, ReferenceImage};

/// The external generation capability.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_character_image(
        &self,
        prompt: &str,
        images: &[ReferenceImage],
        settings: &GenerationSettings,
    ) -> Result<GenerationResult, GenerationError>;
}

/// Gemini-backed generator. The key is resolved on every call so a newly
/// selected key takes effect without rebuilding the generator.
pub struct GeminiGenerator {
    credentials: Arc<dyn CredentialProvider>,
    endpoint: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ImageGenerator for GeminiGenerator {
    async fn generate_character_image(
        &self,
        prompt: &str,
        images: &[ReferenceImage],
        settings: &GenerationSettings,
    ) -> Result<GenerationResult, GenerationError> {
        let messages = build_messages(prompt, images)?;

        let api_key = self
            .credentials
            .api_key()
            .await
            .ok_or(GenerationError::ApiKeyInvalid)?;
        let client = GeminiClient::new(api_key, &self.endpoint, &self.model);

        tracing::info!(
            model = client.model(),
            references = images.len(),
            aspect_ratio = %settings.aspect_ratio,
            image_size = %settings.image_size,
            "requesting image generation"
        );

        let response =
            send_generate_request(&client, messages, Some(&generation_config(settings))).await?;

        Ok(extract_generation_result(&response))
    }
}

pub fn generation_config(settings: &GenerationSettings) -> GenerationConfig {
    GenerationConfig::image(ImageConfig {
        aspect_ratio: Some(settings.aspect_ratio.to_string()),
        image_size: Some(settings.image_size.to_string()),
    })
}

/// One user turn: every reference image in store order, then the prompt.
pub fn build_messages(
    prompt: &str,
    images: &[ReferenceImage],
) -> Result<Vec<Message>, GenerationError> {
    let mut parts: Vec<MessagePart> = Vec::new();

    for reference in images {
        let data = reference.base64.trim();
        if data.is_empty() {
            return Err(GenerationError::InvalidRequest(format!(
                "Reference image '{}' has no image data.",
                reference.name
            )));
        }

        let mime_type = Some(reference.mime_type.trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);

        parts.push(MessagePart::Image {
            data_b64: data.to_string(),
            mime_type: Some(mime_type.to_string()),
            file_path: Some(reference.name.clone()),
        });
    }

    let trimmed_prompt = prompt.trim();
    if !trimmed_prompt.is_empty() {
        parts.push(MessagePart::text(trimmed_prompt));
    }

    if parts.is_empty() {
        return Err(GenerationError::InvalidRequest(
            "A prompt or reference image is required to generate content.".into(),
        ));
    }

    Ok(vec![Message::user(parts)])
}

pub fn extract_generation_result(response: &GeminiResponse) -> GenerationResult {
    let image_url = first_inline_image(response).map(|inline_data| {
        let mime_type = Some(inline_data.mime_type.trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        to_data_url(mime_type, inline_data.data.trim())
    });

    GenerationResult {
        image_url,
        text: response_to_text_data(response),
    }
}
