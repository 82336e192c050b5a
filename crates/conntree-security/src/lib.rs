//! Security primitives for connection stores
//!
//! - [`CryptographyProvider`]: password-keyed symmetric encryption of text
//! - [`PasswordAuthenticator`]: confirms a candidate password against an
//!   encrypted marker, prompting through a [`CredentialRequestor`]
//!
//! Passwords are carried as [`secrecy::SecretString`] and never logged.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod authenticator;
pub mod crypto;
pub mod error;

pub use authenticator::{
    CancelRequestor, CredentialPrompt, CredentialRequestor, PasswordAuthenticator,
};
pub use crypto::{AesGcmCryptographyProvider, CryptographyProvider};
pub use error::CryptoError;
pub use secrecy::{ExposeSecret, SecretString};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
