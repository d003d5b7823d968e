use serde_json::{Value, json};

use crate::error::{GeminiError, Result};
use crate::models::{ApiErrorEnvelope, GeminiResponse, InlineData};
use crate::types::{GeminiClient, GenerationConfig, Message, MessagePart};

const RAW_BODY_PREVIEW: usize = 512;

pub fn convert_body_parts_gemini(parts: Vec<MessagePart>) -> Vec<Value> {
    parts
        .into_iter()
        .map(|part| {
            let mime = part.resolved_mime_type();
            match part {
                MessagePart::Text(text) => json!({ "text": text }),
                MessagePart::Image { data_b64, .. } => json!({
                    "inlineData": {
                        "mimeType": mime,
                        "data": data_b64
                    }
                }),
            }
        })
        .collect()
}

pub fn convert_messages_to_gemini_contents(messages: Vec<Message>) -> Vec<Value> {
    messages
        .into_iter()
        .map(|m| {
            json!({
                "role": m.role.as_str(),
                "parts": convert_body_parts_gemini(m.parts)
            })
        })
        .collect()
}

pub fn build_generate_body(messages: Vec<Message>, config: Option<&GenerationConfig>) -> Value {
    let mut body = json!({
        "contents": convert_messages_to_gemini_contents(messages)
    });
    if let Some(config) = config {
        body["generationConfig"] = json!(config);
    }
    body
}

pub async fn send_generate_request(
    client: &GeminiClient,
    messages: Vec<Message>,
    config: Option<&GenerationConfig>,
) -> Result<GeminiResponse> {
    let url = format!("{}:generateContent", client.model_url());
    let body = build_generate_body(messages, config);

    tracing::debug!(model = client.model(), "sending generateContent request");

    let response = client
        .http
        .post(url)
        .header("x-goog-api-key", client.api_key())
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    let response_text = response.text().await?;

    if !status.is_success() {
        let err = classify_error(status.as_u16(), &response_text);
        tracing::debug!(status = status.as_u16(), error = %err, "generateContent failed");
        return Err(err);
    }

    let response: GeminiResponse = serde_json::from_str(&response_text).map_err(|err| {
        GeminiError::Decode(format!(
            "{}. Raw response: {}",
            err,
            preview(&response_text)
        ))
    })?;

    if let Some(reason) = block_reason(&response) {
        return Err(GeminiError::Blocked(reason));
    }

    Ok(response)
}

/// Probes the model resource with the client's key. A rejected key is
/// `Ok(false)`; transport failures and unrelated API errors are returned.
pub async fn check_api_key(client: &GeminiClient) -> Result<bool> {
    if client.api_key().trim().is_empty() {
        return Ok(false);
    }

    let response = client
        .http
        .get(client.model_url())
        .header("x-goog-api-key", client.api_key())
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        return Ok(true);
    }

    let text = response.text().await.unwrap_or_default();
    match classify_error(status.as_u16(), &text) {
        GeminiError::ApiKeyInvalid(_) => Ok(false),
        err => Err(err),
    }
}

/// Maps a non-success status and its body onto an error kind.
pub fn classify_error(status: u16, body: &str) -> GeminiError {
    let envelope = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map(|envelope| envelope.error.message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP status {status}")
            } else {
                preview(trimmed)
            }
        });

    let key_rejected = envelope.as_ref().is_some_and(|envelope| {
        envelope
            .error
            .reasons()
            .any(|reason| reason == "API_KEY_INVALID")
    }) || message.to_lowercase().contains("api key not valid");

    match status {
        401 | 403 => GeminiError::ApiKeyInvalid(message),
        400 if key_rejected => GeminiError::ApiKeyInvalid(message),
        // Returned when a selected project key no longer grants the model.
        404 if message.contains("Requested entity was not found") => {
            GeminiError::ApiKeyInvalid(message)
        }
        429 => GeminiError::RateLimited(message),
        _ => GeminiError::Api { status, message },
    }
}

pub fn block_reason(response: &GeminiResponse) -> Option<String> {
    let feedback = response.prompt_feedback.as_ref()?;
    let reason = feedback.block_reason.as_ref()?;
    Some(
        feedback
            .block_reason_message
            .clone()
            .unwrap_or_else(|| format!("Prompt blocked: {reason}")),
    )
}

/// First non-empty inline image across all candidates.
pub fn first_inline_image(response: &GeminiResponse) -> Option<&InlineData> {
    response
        .candidates
        .iter()
        .flat_map(|candidate| candidate.content.parts.iter())
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline_data| !inline_data.data.trim().is_empty())
}

/// Text of the first candidate, or `None` when it carries no text.
pub fn response_to_text_data(response: &GeminiResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let mut full_text = String::new();
    for part in &candidate.content.parts {
        if let Some(text) = &part.text {
            full_text.push_str(text);
        }
    }
    let trimmed = full_text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn preview(text: &str) -> String {
    if text.chars().count() <= RAW_BODY_PREVIEW {
        return text.to_string();
    }
    let head: String = text.chars().take(RAW_BODY_PREVIEW).collect();
    format!("{head}...")
}
