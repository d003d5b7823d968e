//! Entry points behind the CLI subcommands.

pub mod generate;
pub mod history;
pub mod interactive;
pub mod key;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::credentials::CredentialProvider;
use crate::generator::GeminiGenerator;
use crate::key_checker::KeyValidityChecker;
use crate::library::{append_generation_log, save_generated_image, GenerationLogEntry};
use crate::session::{GenerationSession, GenerationState};

pub fn build_session(
    config: &AppConfig,
    credentials: Arc<dyn CredentialProvider>,
) -> Arc<GenerationSession> {
    let generator = Arc::new(GeminiGenerator::new(
        credentials.clone(),
        &config.endpoint,
        &config.model,
    ));
    let checker = Arc::new(KeyValidityChecker::new(credentials));
    Arc::new(GenerationSession::new(generator, checker))
}

/// Writes a successful result to disk and records it in the generation log.
/// `request` is the state the generation was started from.
pub async fn persist_generated(
    output_dir: &Path,
    image_url: &str,
    request: &GenerationState,
) -> Result<PathBuf, String> {
    let path = save_generated_image(output_dir, image_url).await?;
    let entry = GenerationLogEntry::new(
        &request.prompt,
        request.settings,
        request.references.images(),
        &path,
    );
    append_generation_log(output_dir, entry).await?;
    Ok(path)
}
