//! Credential sources for digest authentication.
//!
//! The client never owns a password directly: it asks a [`CredentialProvider`]
//! the first time a server challenges it, and the provider decides where the
//! secret comes from (configuration, an interactive prompt, ...).

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, TransportError};

/// Supplies the account used to answer digest challenges.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Account name sent in the `username` digest attribute.
    fn username(&self) -> &str;

    /// Resolves the password for [`username`](Self::username).
    ///
    /// Called once per authenticated request; implementations that acquire
    /// the secret interactively are expected to cache it for the rest of the
    /// process. The secret must never be written to disk or to logs.
    async fn password(&self) -> Result<String>;
}

/// Credentials known up front, e.g. from an environment file.
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    /// Create a provider from a fixed username/password pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    fn username(&self) -> &str {
        &self.username
    }

    async fn password(&self) -> Result<String> {
        Ok(self.password.clone())
    }
}

/// Prompts on the terminal for the password, once, and caches it in memory.
pub struct PromptCredentials {
    username: String,
    cached: Mutex<Option<String>>,
}

impl PromptCredentials {
    /// Create a provider that will prompt when first asked.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CredentialProvider for PromptCredentials {
    fn username(&self) -> &str {
        &self.username
    }

    async fn password(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(password) = cached.as_ref() {
            return Ok(password.clone());
        }
        debug!("No cached password for {}, prompting", self.username);
        let entered = tokio::task::spawn_blocking(|| {
            dialoguer::Password::new().with_prompt("Password").interact()
        })
        .await
        .map_err(|e| TransportError::Credentials(format!("prompt task failed: {e}")))?
        .map_err(|e| TransportError::Credentials(format!("password prompt failed: {e}")))?;
        *cached = Some(entered.clone());
        Ok(entered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credentials_hand_back_the_pair() {
        let creds = StaticCredentials::new("admin", "hunter2");
        assert_eq!(creds.username(), "admin");
        assert_eq!(creds.password().await.unwrap(), "hunter2");
    }

    #[tokio::test]
    async fn test_static_credentials_are_repeatable() {
        let creds = StaticCredentials::new("admin", "hunter2");
        assert_eq!(creds.password().await.unwrap(), creds.password().await.unwrap());
    }
}
