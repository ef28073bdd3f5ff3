//! Session credential access
//!
//! The core never creates, inspects, or refreshes credentials; it reads the
//! current bearer token from an injected [`CredentialProvider`] at the start
//! of each request. Keeping auth behind a trait keeps the orchestrator
//! testable without a live session.

/// Read-only source of the current session credential
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, or `None` when no session exists
    fn access_token(&self) -> Option<String>;
}

/// Fixed-token provider for the CLI and tests
pub struct StaticCredential {
    token: Option<String>,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: if token.trim().is_empty() { None } else { Some(token) },
        }
    }

    /// Provider with no session (every token read yields `None`)
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Read the token from the `VERISCAN_ACCESS_TOKEN` environment variable
    pub fn from_env() -> Self {
        match std::env::var("VERISCAN_ACCESS_TOKEN") {
            Ok(token) => Self::new(token),
            Err(_) => Self::anonymous(),
        }
    }
}

impl CredentialProvider for StaticCredential {
    fn access_token(&self) -> Option<String> {
        self.token.clone()
    }
}
