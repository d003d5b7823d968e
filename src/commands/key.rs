use std::sync::Arc;

use anyhow::{Context, Result};
use gemini_image::{check_api_key, GeminiClient};

use crate::config::AppConfig;
use crate::credentials::{CredentialProvider, KeyFileCredentials, StdinKeyPrompt};
use crate::key_checker::KeyValidityChecker;

/// Runs the key selection flow, then asks Gemini whether the key works.
pub async fn run(config: &AppConfig) -> Result<()> {
    let credentials = Arc::new(KeyFileCredentials::new(
        config.key_file(),
        config.api_key.clone(),
        Arc::new(StdinKeyPrompt),
    ));
    let checker = KeyValidityChecker::new(credentials.clone());

    let selected = checker
        .request_key()
        .await
        .context(crate::constants::KEY_DIALOG_FAILED_MESSAGE)?;
    if !selected {
        println!("No key selected.");
        return Ok(());
    }
    println!("Stored key in {}", credentials.key_file().display());

    let Some(api_key) = credentials.api_key().await else {
        return Ok(());
    };
    let client = GeminiClient::new(api_key, &config.endpoint, &config.model);
    match check_api_key(&client).await {
        Ok(true) => println!("Key accepted for {}.", client.model()),
        Ok(false) => println!("Gemini rejected this key for {}.", client.model()),
        Err(err) => println!("Could not verify the key right now: {err}"),
    }
    Ok(())
}
