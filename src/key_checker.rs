use std::sync::Arc;

use tokio::sync::watch;

use crate::credentials::CredentialProvider;
use crate::error::CredentialError;

/// Owns the session validity flag and keeps it in sync with the credential
/// subsystem.
pub struct KeyValidityChecker {
    credentials: Arc<dyn CredentialProvider>,
    validity: watch::Sender<bool>,
}

impl KeyValidityChecker {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        let (validity, _) = watch::channel(false);
        Self {
            credentials,
            validity,
        }
    }

    /// Re-derives the flag. Fails closed: a failing check counts as invalid.
    pub async fn verify(&self) -> bool {
        let valid = match self.credentials.check_api_key().await {
            Ok(valid) => valid,
            Err(err) => {
                tracing::warn!("API key check failed: {err}");
                false
            }
        };
        self.validity.send_replace(valid);
        valid
    }

    /// Runs the key selection flow and returns whether a key was selected.
    /// A selection optimistically marks the session valid; the next `verify`
    /// corrects a false positive. A dismissed prompt leaves the flag alone.
    pub async fn request_key(&self) -> Result<bool, CredentialError> {
        match self.credentials.request_api_key().await {
            Ok(()) => {
                self.validity.send_replace(true);
                Ok(true)
            }
            Err(CredentialError::Cancelled) => {
                tracing::info!("key selection dismissed");
                Ok(false)
            }
            Err(err) => {
                tracing::error!("failed to request key: {err}");
                Err(err)
            }
        }
    }

    pub fn invalidate(&self) {
        self.validity.send_replace(false);
    }

    pub fn is_valid(&self) -> bool {
        *self.validity.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.validity.subscribe()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scriptable credential subsystem shared by the crate's tests.
    #[derive(Default)]
    pub(crate) struct FakeCredentials {
        pub valid: AtomicBool,
        pub check_fails: AtomicBool,
        pub request_fails: AtomicBool,
        pub request_dismissed: AtomicBool,
        pub checks: AtomicUsize,
        pub requests: AtomicUsize,
    }

    impl FakeCredentials {
        pub fn valid() -> Self {
            let creds = Self::default();
            creds.valid.store(true, Ordering::SeqCst);
            creds
        }
    }

    #[async_trait]
    impl CredentialProvider for FakeCredentials {
        async fn check_api_key(&self) -> Result<bool, CredentialError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            if self.check_fails.load(Ordering::SeqCst) {
                return Err(CredentialError::DialogUnavailable("host bridge missing".into()));
            }
            Ok(self.valid.load(Ordering::SeqCst))
        }

        async fn request_api_key(&self) -> Result<(), CredentialError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.request_fails.load(Ordering::SeqCst) {
                return Err(CredentialError::DialogUnavailable("no terminal".into()));
            }
            if self.request_dismissed.load(Ordering::SeqCst) {
                return Err(CredentialError::Cancelled);
            }
            self.valid.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn api_key(&self) -> Option<String> {
            self.valid
                .load(Ordering::SeqCst)
                .then(|| "test-key".to_string())
        }
    }

    #[tokio::test]
    async fn verify_reflects_credentials() {
        let creds = Arc::new(FakeCredentials::valid());
        let checker = KeyValidityChecker::new(creds.clone());
        assert!(!checker.is_valid());

        assert!(checker.verify().await);
        assert!(checker.is_valid());

        creds.valid.store(false, Ordering::SeqCst);
        assert!(!checker.verify().await);
        assert!(!checker.is_valid());
    }

    #[tokio::test]
    async fn verify_fails_closed() {
        let creds = Arc::new(FakeCredentials::valid());
        creds.check_fails.store(true, Ordering::SeqCst);
        let checker = KeyValidityChecker::new(creds);
        checker.validity.send_replace(true);

        assert!(!checker.verify().await);
        assert!(!checker.is_valid());
    }

    #[tokio::test]
    async fn request_key_marks_valid_optimistically() {
        let creds = Arc::new(FakeCredentials::default());
        let checker = KeyValidityChecker::new(creds.clone());
        let mut updates = checker.subscribe();

        assert!(checker.request_key().await.unwrap());
        assert!(checker.is_valid());
        assert!(updates.has_changed().unwrap());
        assert!(*updates.borrow_and_update());
        assert_eq!(creds.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_request_leaves_flag_unchanged() {
        let creds = Arc::new(FakeCredentials::default());
        creds.request_fails.store(true, Ordering::SeqCst);
        let checker = KeyValidityChecker::new(creds);

        assert!(checker.request_key().await.is_err());
        assert!(!checker.is_valid());
    }

    #[tokio::test]
    async fn dismissed_request_is_not_an_error() {
        let creds = Arc::new(FakeCredentials::default());
        creds.request_dismissed.store(true, Ordering::SeqCst);
        let checker = KeyValidityChecker::new(creds);
        let mut updates = checker.subscribe();

        assert!(!checker.request_key().await.unwrap());
        assert!(!checker.is_valid());
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn invalidate_clears_flag() {
        let checker = KeyValidityChecker::new(Arc::new(FakeCredentials::valid()));
        checker.verify().await;
        checker.invalidate();
        assert!(!checker.is_valid());
    }
}
