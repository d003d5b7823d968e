//! Re-verification of the API key when something outside the session may
//! have changed it: the key file being rewritten (for example from another
//! terminal) or an explicit refresh from the console.

use std::path::Path;
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::key_checker::KeyValidityChecker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidationSignal {
    KeyFileChanged,
    Requested,
}

/// Runs `verify` once per signal until every sender is dropped.
pub fn spawn_revalidation(
    checker: Arc<KeyValidityChecker>,
    mut signals: mpsc::Receiver<RevalidationSignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            let valid = checker.verify().await;
            tracing::debug!(?signal, valid, "revalidated API key");
        }
    })
}

/// Watches the directory holding `key_file` and emits a signal whenever an
/// event touches the key file. The watcher stops when dropped.
pub fn watch_key_file(
    key_file: &Path,
    signals: mpsc::Sender<RevalidationSignal>,
) -> notify::Result<RecommendedWatcher> {
    let dir = key_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(notify::Error::io)?;

    let file_name = key_file.file_name().map(|name| name.to_os_string());
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        match result {
            Ok(event) => {
                let touches_key = event
                    .paths
                    .iter()
                    .any(|path| path.file_name().map(|name| name.to_os_string()) == file_name);
                // A full channel already has a pending re-check queued.
                if touches_key && signals.try_send(RevalidationSignal::KeyFileChanged).is_ok() {
                    tracing::debug!(kind = ?event.kind, "key file changed");
                }
            }
            Err(err) => tracing::warn!("key file watch error: {err}"),
        }
    })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_checker::tests::FakeCredentials;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn each_signal_triggers_a_verify() {
        let creds = Arc::new(FakeCredentials::default());
        let checker = Arc::new(KeyValidityChecker::new(creds.clone()));
        let mut validity = checker.subscribe();
        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_revalidation(checker.clone(), rx);

        // Authorised elsewhere while the session was not looking.
        creds.valid.store(true, Ordering::SeqCst);
        tx.send(RevalidationSignal::Requested).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), validity.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(*validity.borrow_and_update());

        drop(tx);
        handle.await.unwrap();
        assert_eq!(creds.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn watching_creates_the_key_directory() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("forge").join("api_key");
        let (tx, _rx) = mpsc::channel(1);

        let watcher = watch_key_file(&key_file, tx).unwrap();
        assert!(key_file.parent().unwrap().is_dir());
        drop(watcher);
    }

    #[tokio::test]
    async fn writing_the_key_file_signals_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("api_key");
        let (tx, mut rx) = mpsc::channel(4);
        let _watcher = watch_key_file(&key_file, tx).unwrap();

        std::fs::write(&key_file, "fresh-key").unwrap();

        let signal = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no signal for key file write");
        assert_eq!(signal, Some(RevalidationSignal::KeyFileChanged));
    }

    #[tokio::test]
    async fn sibling_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("api_key");
        let (tx, mut rx) = mpsc::channel(4);
        let _watcher = watch_key_file(&key_file, tx).unwrap();

        std::fs::write(dir.path().join("log.json"), "[]").unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(waited.is_err(), "unexpected signal: {waited:?}");
    }
}
