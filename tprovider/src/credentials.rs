//! Already-resolved gateway credentials with explicit provenance.
//!
//! Core crates never read files or the environment; whoever builds a
//! [`Credentials`] value records where the secret came from.
//!
//! ```rust
//! use tprovider::{CredentialKind, CredentialSource, Credentials};
//!
//! let credentials = Credentials::authorization_key("c2VjcmV0", CredentialSource::Inline)
//!     .expect("non-empty key");
//! assert_eq!(credentials.kind(), CredentialKind::AuthorizationKey);
//! assert!(!format!("{credentials:?}").contains("c2VjcmV0"));
//! ```

use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Long-lived key exchanged for short-lived access tokens.
    AuthorizationKey,
    /// Pre-issued bearer token used as-is.
    AccessToken,
}

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // SAFETY: zero bytes keep the buffer valid UTF-8.
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Inline,
    File(PathBuf),
    Environment(String),
}

impl Display for CredentialSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline => f.write_str("inline"),
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Environment(name) => write!(f, "env:{name}"),
        }
    }
}

#[derive(Clone)]
pub enum Credential {
    AuthorizationKey(SecretString),
    AccessToken {
        token: SecretString,
        expires_at: Option<SystemTime>,
    },
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::AuthorizationKey(_) => CredentialKind::AuthorizationKey,
            Self::AccessToken { .. } => CredentialKind::AccessToken,
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorizationKey(_) => f.write_str("Credential::AuthorizationKey([REDACTED])"),
            Self::AccessToken { expires_at, .. } => f
                .debug_struct("Credential::AccessToken")
                .field("token", &"[REDACTED]")
                .field("expires_at", expires_at)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    credential: Credential,
    source: CredentialSource,
}

impl Credentials {
    pub fn authorization_key(
        key: impl Into<String>,
        source: CredentialSource,
    ) -> Result<Self, ProviderError> {
        let key = SecretString::new(key);
        if key.is_empty() {
            return Err(ProviderError::authentication(format!(
                "authorization key from {source} must not be empty"
            )));
        }

        Ok(Self {
            credential: Credential::AuthorizationKey(key),
            source,
        })
    }

    pub fn access_token(
        token: impl Into<String>,
        expires_at: Option<SystemTime>,
        source: CredentialSource,
    ) -> Result<Self, ProviderError> {
        let token = SecretString::new(token);
        if token.is_empty() {
            return Err(ProviderError::authentication(format!(
                "access token from {source} must not be empty"
            )));
        }

        Ok(Self {
            credential: Credential::AccessToken { token, expires_at },
            source,
        })
    }

    pub fn kind(&self) -> CredentialKind {
        self.credential.kind()
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Runs `f` against the raw secret without handing out an owned copy.
    pub fn with_secret<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        match &self.credential {
            Credential::AuthorizationKey(key) => f(key.expose()),
            Credential::AccessToken { token, .. } => f(token.expose()),
        }
    }
}
