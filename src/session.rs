//! Generation orchestrator: owns the UI-facing state of a session and runs
//! the request lifecycle `Idle -> Generating -> {Succeeded, Failed}`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::constants::{
    GENERIC_GENERATION_FAILURE, KEY_DIALOG_FAILED_MESSAGE, KEY_EXPIRED_MESSAGE, NO_IMAGE_MESSAGE,
};
use crate::error::GenerationError;
use crate::generator::ImageGenerator;
use crate::key_checker::KeyValidityChecker;
use crate::models::{GenerationSettings, ReferenceImage};
use crate::store::ReferenceStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationState {
    pub prompt: String,
    pub settings: GenerationSettings,
    pub references: ReferenceStore,
    pub is_generating: bool,
    pub generated_image: Option<String>,
    pub error: Option<String>,
}

/// Consistent copy of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub api_key_valid: bool,
    pub state: GenerationState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The session had no valid key; the key selection flow ran instead.
    KeyRequested,
    Succeeded(String),
    Failed(String),
    /// A newer request started before this one settled; its response was
    /// dropped.
    Superseded,
}

pub struct GenerationSession {
    generator: Arc<dyn ImageGenerator>,
    checker: Arc<KeyValidityChecker>,
    state: watch::Sender<GenerationState>,
    latest_request: AtomicU64,
}

impl GenerationSession {
    pub fn new(generator: Arc<dyn ImageGenerator>, checker: Arc<KeyValidityChecker>) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            generator,
            checker,
            state,
            latest_request: AtomicU64::new(0),
        }
    }

    /// Initial key check; returns the resulting validity.
    pub async fn start(&self) -> bool {
        self.checker.verify().await
    }

    pub fn checker(&self) -> &Arc<KeyValidityChecker> {
        &self.checker
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            api_key_valid: self.checker.is_valid(),
            state: self.state.borrow().clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.state.send_modify(|state| state.prompt = prompt);
    }

    pub fn set_settings(&self, settings: GenerationSettings) {
        self.state.send_modify(|state| state.settings = settings);
    }

    pub fn add_images(&self, images: Vec<ReferenceImage>) {
        self.state.send_modify(|state| state.references.add(images));
    }

    pub fn remove_image(&self, id: &str) -> bool {
        self.state.send_if_modified(|state| state.references.remove(id))
    }

    /// Key selection at the session level. Returns whether a key was
    /// selected. When the dialog cannot be shown the generic dialog message
    /// is set; a dismissed dialog sets nothing. Validity is left as it was
    /// unless a key was selected.
    pub async fn request_key(&self) -> bool {
        match self.checker.request_key().await {
            Ok(selected) => selected,
            Err(_) => {
                self.state
                    .send_modify(|state| state.error = Some(KEY_DIALOG_FAILED_MESSAGE.to_string()));
                false
            }
        }
    }

    pub async fn generate(&self) -> GenerateOutcome {
        if !self.checker.is_valid() {
            self.request_key().await;
            return GenerateOutcome::KeyRequested;
        }

        let mut request_id = 0;
        let mut prompt = String::new();
        let mut images = Vec::new();
        let mut settings = GenerationSettings::default();
        self.state.send_modify(|state| {
            state.error = None;
            state.generated_image = None;
            state.is_generating = true;
            request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
            prompt.clone_from(&state.prompt);
            images = state.references.images().to_vec();
            settings = state.settings;
        });

        tracing::debug!(request_id, references = images.len(), "generation started");

        let result = self
            .generator
            .generate_character_image(&prompt, &images, &settings)
            .await;

        if matches!(result, Err(GenerationError::ApiKeyInvalid)) {
            self.checker.invalidate();
        }

        let outcome = match result {
            Ok(result) => match result.image_url {
                Some(url) => GenerateOutcome::Succeeded(url),
                None => GenerateOutcome::Failed(NO_IMAGE_MESSAGE.to_string()),
            },
            Err(GenerationError::ApiKeyInvalid) => {
                GenerateOutcome::Failed(KEY_EXPIRED_MESSAGE.to_string())
            }
            Err(err) => {
                tracing::error!(request_id, "generation failed: {err}");
                let message = err.to_string();
                if message.trim().is_empty() {
                    GenerateOutcome::Failed(GENERIC_GENERATION_FAILURE.to_string())
                } else {
                    GenerateOutcome::Failed(message)
                }
            }
        };

        // Checked under the state lock so a request starting concurrently
        // either supersedes this one or starts after it has settled.
        let applied = self.state.send_if_modified(|state| {
            if self.latest_request.load(Ordering::SeqCst) != request_id {
                return false;
            }
            match &outcome {
                GenerateOutcome::Succeeded(url) => {
                    state.generated_image = Some(url.clone());
                    state.error = None;
                }
                GenerateOutcome::Failed(message) => {
                    state.generated_image = None;
                    state.error = Some(message.clone());
                }
                GenerateOutcome::KeyRequested | GenerateOutcome::Superseded => {}
            }
            state.is_generating = false;
            true
        });

        if applied {
            let succeeded = matches!(outcome, GenerateOutcome::Succeeded(_));
            tracing::debug!(request_id, succeeded, "generation settled");
            outcome
        } else {
            tracing::debug!(request_id, "discarding superseded generation response");
            GenerateOutcome::Superseded
        }
    }
}
