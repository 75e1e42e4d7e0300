//! Error types shared by the client, the lookup flow and the session store.

use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field:   &'static str,
    pub message: String,
}

/// All validation messages collected for one submission.
///
/// Validation never stops at the first failure, so a form can show every
/// problem at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut i = self.0.iter().peekable();
        while let Some(e) = i.next() {
            write!(f, "{}: {}", e.field, e.message)?;
            if i.peek().is_some() {
                write!(f, "; ")?;
            }
        }
        Ok(())
    }
}

/// Errors that can occur while talking to the backend or handling local state.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with an unexpected status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// No token available, or the backend rejected it
    #[error("Authentication required, please log in")]
    AuthRequired,

    /// Login was refused
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Response body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The request was abandoned through its cancellation token
    #[error("Request cancelled")]
    Cancelled,

    #[error("Session storage failed: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Errors after which the user has to log in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::AuthRequired | Error::AuthFailed(_))
    }

    /// Errors the user may retry by re-submitting. Nothing is retried automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Request(_) => true,
            Error::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.push(field, message);
        Error::Validation(errors)
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_field_message() {
        let mut errors = ValidationErrors::new();
        errors.push("isbn", "Invalid ISBN");
        errors.push("title", "Title is required");
        errors.push("isbn", "ISBN is required");

        assert_eq!(errors.for_field("isbn"), vec!["Invalid ISBN", "ISBN is required"]);
        assert_eq!(
            errors.to_string(),
            "isbn: Invalid ISBN; title: Title is required; isbn: ISBN is required"
        );
        assert!(matches!(errors.into_result(), Err(Error::Validation(_))));
    }

    #[test]
    fn empty_errors_pass() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn classification() {
        assert!(Error::AuthRequired.is_auth());
        assert!(Error::AuthFailed("nope".into()).is_auth());
        assert!(!Error::Cancelled.is_auth());
        assert!(Error::Server {
            status:  503,
            message: String::new(),
        }
        .is_retryable());
        assert!(!Error::Server {
            status:  400,
            message: String::new(),
        }
        .is_retryable());
    }
}
