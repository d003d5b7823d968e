pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod fs_utils;
pub mod generator;
pub mod key_checker;
pub mod library;
pub mod models;
pub mod revalidate;
pub mod session;
pub mod store;
pub mod view;

pub use config::{AppConfig, ConfigOverrides};
pub use constants::{
    DEFAULT_GEMINI_ENDPOINT, DEFAULT_IMAGE_MIME, DEFAULT_IMAGE_MODEL, GENERIC_GENERATION_FAILURE,
    KEY_DIALOG_FAILED_MESSAGE, KEY_EXPIRED_MESSAGE, NO_IMAGE_MESSAGE,
};
pub use credentials::{CredentialProvider, KeyFileCredentials, KeyPrompt};
pub use error::{CredentialError, GenerationError};
pub use generator::{GeminiGenerator, ImageGenerator};
pub use key_checker::KeyValidityChecker;
pub use models::{AspectRatio, GenerationResult, GenerationSettings, ImageSize, ReferenceImage};
pub use session::{GenerateOutcome, GenerationSession, GenerationState, SessionSnapshot};
pub use store::ReferenceStore;
pub use view::ViewModel;
