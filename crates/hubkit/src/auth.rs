//! Credential handling for GitHub API basic auth.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Environment variable holding the GitHub username.
pub const USERNAME_ENV: &str = "GITHUB_USERNAME";

/// Environment variable holding the personal access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// A username and personal access token pair, sent as HTTP Basic auth.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    /// Token stored as `SecretString` for automatic zeroization on drop.
    token: SecretString,
}

impl Credentials {
    /// Create credentials from a username and token.
    #[must_use]
    pub fn new(username: impl Into<String>, token: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Build credentials from optional halves.
    ///
    /// Both missing yields `None` (anonymous access).
    ///
    /// # Errors
    /// Returns [`Error::InvalidAuthCombination`] if only one half is present.
    pub fn from_parts(username: Option<String>, token: Option<String>) -> Result<Option<Self>> {
        match (username, token) {
            (Some(username), Some(token)) => Ok(Some(Self::new(username, token))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::InvalidAuthCombination(
                "a username was provided without a token".into(),
            )),
            (None, Some(_)) => Err(Error::InvalidAuthCombination(
                "a token was provided without a username".into(),
            )),
        }
    }

    /// Read credentials from `GITHUB_USERNAME` and `GITHUB_TOKEN`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAuthCombination`] if only one variable is set.
    pub fn from_env() -> Result<Option<Self>> {
        let read = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        Self::from_parts(read(USERNAME_ENV), read(TOKEN_ENV))
    }

    /// The username half of the pair.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"[redacted]")
            .finish()
    }
}
