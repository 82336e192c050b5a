//! Password authentication against an encrypted marker
//!
//! A store keeps a marker: a known plain text encrypted under the store
//! password. A candidate password is correct only if it decrypts the marker
//! back to exactly that plain text.

use secrecy::{ExposeSecret, SecretString};

use crate::crypto::CryptographyProvider;

/// Context handed to a [`CredentialRequestor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPrompt {
    /// Short title for the prompt
    pub title: String,
    /// 1-based attempt number
    pub attempt: u32,
    /// Attempts allowed in total
    pub max_attempts: u32,
}

/// Source of candidate passwords, usually an interactive prompt
///
/// Returning `None` means the user declined; authentication stops.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialRequestor: Send + Sync {
    /// Ask for a password
    fn request_credential(&self, prompt: &CredentialPrompt) -> Option<SecretString>;
}

impl<F> CredentialRequestor for F
where
    F: Fn(&CredentialPrompt) -> Option<SecretString> + Send + Sync,
{
    fn request_credential(&self, prompt: &CredentialPrompt) -> Option<SecretString> {
        self(prompt)
    }
}

/// Requestor that always declines
///
/// Used where nobody can answer a prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelRequestor;

impl CredentialRequestor for CancelRequestor {
    fn request_credential(&self, _prompt: &CredentialPrompt) -> Option<SecretString> {
        None
    }
}

/// Confirms passwords against an encrypted marker
///
/// The expected plain text is tried as the first candidate, so stores
/// protected only by the default password open without a prompt. After that
/// the requestor is asked up to `max_attempts` times.
pub struct PasswordAuthenticator<'a> {
    crypto: &'a dyn CryptographyProvider,
    cipher_text: &'a str,
    requestor: &'a dyn CredentialRequestor,
    max_attempts: u32,
    title: String,
    last_authenticated: Option<SecretString>,
}

impl<'a> PasswordAuthenticator<'a> {
    /// Prompt attempts allowed by default
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Create authenticator for a marker
    #[must_use]
    pub fn new(
        crypto: &'a dyn CryptographyProvider,
        cipher_text: &'a str,
        requestor: &'a dyn CredentialRequestor,
    ) -> Self {
        Self {
            crypto,
            cipher_text,
            requestor,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            title: "Connection store password".to_string(),
            last_authenticated: None,
        }
    }

    /// Set the number of prompt attempts
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the prompt title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Find a password that decrypts the marker to `expected_plain_text`
    ///
    /// Returns `true` once a candidate matches; the candidate is then
    /// available through [`PasswordAuthenticator::last_authenticated_password`].
    /// Returns `false` when the requestor declines, supplies an empty
    /// password, or the attempts run out.
    pub fn authenticate(&mut self, expected_plain_text: &SecretString) -> bool {
        let hint = SecretString::from(expected_plain_text.expose_secret().to_owned());
        if self.confirms(&hint, expected_plain_text) {
            tracing::debug!("marker opened with the default password");
            self.last_authenticated = Some(hint);
            return true;
        }

        for attempt in 1..=self.max_attempts {
            let prompt = CredentialPrompt {
                title: self.title.clone(),
                attempt,
                max_attempts: self.max_attempts,
            };
            let Some(candidate) = self.requestor.request_credential(&prompt) else {
                tracing::info!("password prompt declined");
                return false;
            };
            if candidate.expose_secret().is_empty() {
                tracing::info!("empty password supplied; treating as declined");
                return false;
            }
            if self.confirms(&candidate, expected_plain_text) {
                tracing::debug!(attempt, "password confirmed");
                self.last_authenticated = Some(candidate);
                return true;
            }
            tracing::warn!(attempt, max = self.max_attempts, "password rejected");
        }
        false
    }

    fn confirms(&self, candidate: &SecretString, expected: &SecretString) -> bool {
        match self.crypto.decrypt(self.cipher_text, candidate) {
            Ok(plain) => plain == expected.expose_secret(),
            Err(err) => {
                tracing::debug!(error = %err, "marker did not decrypt");
                false
            }
        }
    }

    /// Password confirmed by the last successful [`PasswordAuthenticator::authenticate`]
    #[inline]
    #[must_use]
    pub fn last_authenticated_password(&self) -> Option<&SecretString> {
        self.last_authenticated.as_ref()
    }

    /// Take ownership of the confirmed password
    #[inline]
    pub fn take_last_authenticated_password(&mut self) -> Option<SecretString> {
        self.last_authenticated.take()
    }
}

impl std::fmt::Debug for PasswordAuthenticator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordAuthenticator")
            .field("max_attempts", &self.max_attempts)
            .field("title", &self.title)
            .field("authenticated", &self.last_authenticated.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AesGcmCryptographyProvider;
    use crate::error::CryptoError;
    use mockall::predicate::function;

    const DEFAULT: &str = "mR3m";

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn provider() -> AesGcmCryptographyProvider {
        AesGcmCryptographyProvider::with_kdf_rounds(8)
    }

    /// Marker holding `plain` encrypted under `key`
    fn marker(plain: &str, key: &str) -> String {
        provider().encrypt(plain, &secret(key)).unwrap()
    }

    #[test]
    fn default_password_needs_no_prompt() {
        let crypto = provider();
        let cipher = marker(DEFAULT, DEFAULT);
        let mut requestor = MockCredentialRequestor::new();
        requestor.expect_request_credential().never();

        let mut auth = PasswordAuthenticator::new(&crypto, &cipher, &requestor);
        assert!(auth.authenticate(&secret(DEFAULT)));
        assert_eq!(
            auth.last_authenticated_password().map(|s| s.expose_secret().to_owned()),
            Some(DEFAULT.to_owned())
        );
    }

    #[test]
    fn prompts_until_the_right_password() {
        let crypto = provider();
        let cipher = marker(DEFAULT, "letmein");
        let mut requestor = MockCredentialRequestor::new();
        requestor
            .expect_request_credential()
            .with(function(|p: &CredentialPrompt| p.attempt == 1))
            .times(1)
            .returning(|_| Some(secret("wrong")));
        requestor
            .expect_request_credential()
            .with(function(|p: &CredentialPrompt| p.attempt == 2))
            .times(1)
            .returning(|_| Some(secret("letmein")));

        let mut auth = PasswordAuthenticator::new(&crypto, &cipher, &requestor);
        assert!(auth.authenticate(&secret(DEFAULT)));
        let key = auth.take_last_authenticated_password().unwrap();
        assert_eq!(key.expose_secret(), "letmein");
        assert!(auth.last_authenticated_password().is_none());
    }

    #[test]
    fn declined_prompt_fails() {
        let crypto = provider();
        let cipher = marker(DEFAULT, "letmein");
        let mut auth = PasswordAuthenticator::new(&crypto, &cipher, &CancelRequestor);
        assert!(!auth.authenticate(&secret(DEFAULT)));
        assert!(auth.last_authenticated_password().is_none());
    }

    #[test]
    fn empty_password_counts_as_declined() {
        let crypto = provider();
        let cipher = marker(DEFAULT, "letmein");
        let mut requestor = MockCredentialRequestor::new();
        requestor
            .expect_request_credential()
            .times(1)
            .returning(|_| Some(secret("")));

        let mut auth = PasswordAuthenticator::new(&crypto, &cipher, &requestor);
        assert!(!auth.authenticate(&secret(DEFAULT)));
    }

    #[test]
    fn attempts_are_capped() {
        let crypto = provider();
        let cipher = marker(DEFAULT, "letmein");
        let mut requestor = MockCredentialRequestor::new();
        requestor
            .expect_request_credential()
            .times(2)
            .returning(|_| Some(secret("nope")));

        let mut auth =
            PasswordAuthenticator::new(&crypto, &cipher, &requestor).with_max_attempts(2);
        assert!(!auth.authenticate(&secret(DEFAULT)));
    }

    #[test]
    fn decrypting_to_other_text_is_not_success() {
        // Right key, wrong plain text: the marker is not ours.
        let crypto = provider();
        let cipher = marker("something else", "letmein");
        let requestor = |_: &CredentialPrompt| Some(secret("letmein"));

        let mut auth = PasswordAuthenticator::new(&crypto, &cipher, &requestor);
        assert!(!auth.authenticate(&secret(DEFAULT)));
    }

    #[derive(Debug)]
    struct Broken;

    impl CryptographyProvider for Broken {
        fn encrypt(&self, _: &str, _: &SecretString) -> Result<String, CryptoError> {
            Err(CryptoError::Encrypt)
        }
        fn decrypt(&self, _: &str, _: &SecretString) -> Result<String, CryptoError> {
            Err(CryptoError::Decrypt)
        }
    }

    #[test]
    fn decryption_errors_are_not_success() {
        let requestor = |_: &CredentialPrompt| Some(secret("anything"));
        let mut auth = PasswordAuthenticator::new(&Broken, "marker", &requestor);
        assert!(!auth.authenticate(&secret(DEFAULT)));
    }

    #[test]
    fn closures_are_requestors() {
        let requestor = |p: &CredentialPrompt| -> Option<SecretString> {
            assert_eq!(p.max_attempts, PasswordAuthenticator::DEFAULT_MAX_ATTEMPTS);
            None
        };
        let prompt = CredentialPrompt {
            title: "t".into(),
            attempt: 1,
            max_attempts: PasswordAuthenticator::DEFAULT_MAX_ATTEMPTS,
        };
        assert!(requestor.request_credential(&prompt).is_none());
    }
}
