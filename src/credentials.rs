//! Credential subsystem: where the Gemini key comes from and how the user
//! selects a new one.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};

use crate::error::CredentialError;

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Whether a usable key is currently configured.
    async fn check_api_key(&self) -> Result<bool, CredentialError>;

    /// Runs the interactive key selection flow.
    async fn request_api_key(&self) -> Result<(), CredentialError>;

    async fn api_key(&self) -> Option<String>;
}

/// Interactive surface that asks the user for a key. `Ok(None)` means the
/// user dismissed the prompt.
#[async_trait]
pub trait KeyPrompt: Send + Sync {
    async fn prompt_for_key(&self) -> Result<Option<String>, CredentialError>;
}

/// Key stored in a file under the data directory, with an optional key from
/// the environment as fallback. A key selected interactively wins.
pub struct KeyFileCredentials {
    key_file: PathBuf,
    env_key: Option<String>,
    prompt: Arc<dyn KeyPrompt>,
}

impl KeyFileCredentials {
    pub fn new(key_file: PathBuf, env_key: Option<String>, prompt: Arc<dyn KeyPrompt>) -> Self {
        Self {
            key_file,
            env_key: env_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            prompt,
        }
    }

    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    async fn read_key_file(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.key_file).await {
            Ok(contents) => {
                let trimmed = contents.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn write_key_file(&self, key: &str) -> io::Result<()> {
        if let Some(parent) = self.key_file.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.key_file, key).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.key_file, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for KeyFileCredentials {
    async fn check_api_key(&self) -> Result<bool, CredentialError> {
        if self.read_key_file().await?.is_some() {
            return Ok(true);
        }
        Ok(self.env_key.is_some())
    }

    async fn request_api_key(&self) -> Result<(), CredentialError> {
        let key = self
            .prompt
            .prompt_for_key()
            .await?
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(CredentialError::Cancelled)?;

        self.write_key_file(&key).await?;
        tracing::info!(path = %self.key_file.display(), "stored selected API key");
        Ok(())
    }

    async fn api_key(&self) -> Option<String> {
        match self.read_key_file().await {
            Ok(Some(key)) => Some(key),
            Ok(None) => self.env_key.clone(),
            Err(err) => {
                tracing::warn!(path = %self.key_file.display(), "failed to read key file: {err}");
                self.env_key.clone()
            }
        }
    }
}

/// Reads a key from the controlling terminal; used by one-shot commands.
pub struct StdinKeyPrompt;

#[async_trait]
impl KeyPrompt for StdinKeyPrompt {
    async fn prompt_for_key(&self) -> Result<Option<String>, CredentialError> {
        if !io::stdin().is_terminal() {
            return Err(CredentialError::DialogUnavailable(
                "stdin is not a terminal".into(),
            ));
        }

        let line = tokio::task::spawn_blocking(|| -> io::Result<String> {
            eprint!("Paste your Gemini API key (empty line cancels): ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(|err| CredentialError::DialogUnavailable(err.to_string()))??;

        let trimmed = line.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

/// A pending key dialog, answered by whoever owns the terminal input.
#[derive(Debug)]
pub struct KeyDialogRequest {
    pub reply: oneshot::Sender<Option<String>>,
}

/// Routes key prompts to the interactive console, which owns stdin.
#[derive(Clone)]
pub struct ConsoleKeyPrompt {
    requests: mpsc::Sender<KeyDialogRequest>,
}

impl ConsoleKeyPrompt {
    pub fn new(requests: mpsc::Sender<KeyDialogRequest>) -> Self {
        Self { requests }
    }
}

#[async_trait]
impl KeyPrompt for ConsoleKeyPrompt {
    async fn prompt_for_key(&self) -> Result<Option<String>, CredentialError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(KeyDialogRequest { reply })
            .await
            .map_err(|_| CredentialError::DialogUnavailable("console is closed".into()))?;
        response
            .await
            .map_err(|_| CredentialError::DialogUnavailable("dialog was dropped".into()))
    }
}
