use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::GenerateArgs;
use crate::commands::{build_session, persist_generated};
use crate::config::AppConfig;
use crate::credentials::{KeyFileCredentials, StdinKeyPrompt};
use crate::library::load_reference_images;
use crate::models::GenerationSettings;
use crate::session::GenerateOutcome;

/// One-shot generation. Without a valid key the key prompt runs first and
/// the generation is attempted once more.
pub async fn run(config: &AppConfig, args: GenerateArgs) -> Result<()> {
    let credentials = Arc::new(KeyFileCredentials::new(
        config.key_file(),
        config.api_key.clone(),
        Arc::new(StdinKeyPrompt),
    ));
    let session = build_session(config, credentials);
    session.start().await;

    let images = load_reference_images(&args.references)
        .await
        .map_err(anyhow::Error::msg)
        .context("Failed to load reference images")?;
    session.add_images(images);
    session.set_prompt(args.prompt);
    session.set_settings(GenerationSettings {
        aspect_ratio: args.aspect_ratio,
        image_size: args.image_size,
    });

    let mut outcome = session.generate().await;
    if outcome == GenerateOutcome::KeyRequested {
        let snapshot = session.snapshot();
        if !snapshot.api_key_valid {
            bail!(
                "{}",
                snapshot
                    .state
                    .error
                    .unwrap_or_else(|| "No API key selected.".to_string())
            );
        }
        outcome = session.generate().await;
    }

    match outcome {
        GenerateOutcome::Succeeded(url) => {
            let output_dir = args.output.unwrap_or_else(|| config.output_dir());
            let request = session.snapshot().state;
            let path = persist_generated(&output_dir, &url, &request)
                .await
                .map_err(anyhow::Error::msg)
                .context("Failed to save generated image")?;
            println!("{}", path.display());
            Ok(())
        }
        GenerateOutcome::Failed(message) => bail!("{message}"),
        GenerateOutcome::KeyRequested | GenerateOutcome::Superseded => {
            bail!("Generation did not complete")
        }
    }
}
