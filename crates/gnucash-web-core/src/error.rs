//! Error types for gnucash-web-core
//!
//! Store failures are translated into a small set of domain errors by the
//! gateway. Anything the gateway does not recognize travels on unchanged as
//! [`CoreError::Store`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The book could not be reached or access was refused
    AccessDenied,
    /// No account matched the requested filter
    AccountNotFound,
    /// Another session holds the GnuCash lock
    DatabaseLocked,
    /// Untranslated failure of the underlying store
    StoreError,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::AccessDenied => write!(f, "ACCESS_DENIED"),
            ErrorCode::AccountNotFound => write!(f, "ACCOUNT_NOT_FOUND"),
            ErrorCode::DatabaseLocked => write!(f, "DATABASE_LOCKED"),
            ErrorCode::StoreError => write!(f, "STORE_ERROR"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Main error type for gnucash-web-core
#[derive(Error, Debug)]
pub enum CoreError {
    /// Deliberately generic: a missing book and a refused login look the same.
    #[error("Access to the GnuCash database was denied")]
    AccessDenied,

    #[error("Account not found: {name}")]
    AccountNotFound { name: String },

    #[error("The GnuCash database is locked by another session")]
    DatabaseLocked,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::AccessDenied => ErrorCode::AccessDenied,
            CoreError::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            CoreError::DatabaseLocked => ErrorCode::DatabaseLocked,
            CoreError::Store(_) => ErrorCode::StoreError,
            CoreError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::AccessDenied => ErrorSeverity::Warning,
            CoreError::AccountNotFound { .. } => ErrorSeverity::Info,
            CoreError::DatabaseLocked => ErrorSeverity::Warning,
            CoreError::Store(_) => ErrorSeverity::Error,
            CoreError::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::AccountNotFound { name } => {
                details = details
                    .with_detail(serde_json::json!({ "account_name": name }))
                    .with_suggestion(format!(
                        "Check if the account '{}' exists in your GnuCash book.",
                        name
                    ))
                    .with_suggestion(
                        "Use the /api/accounts endpoint to list all accounts.".to_string(),
                    );
            }
            CoreError::DatabaseLocked => {
                details = details
                    .with_suggestion(
                        "Close GnuCash or wait for the other session to finish.".to_string(),
                    )
                    .with_suggestion(
                        "Retry with open_if_lock=true to open the book anyway.".to_string(),
                    );
            }
            CoreError::AccessDenied => {
                details = details.with_suggestion(
                    "Check the configured database location and its permissions.".to_string(),
                );
            }
            CoreError::Store(err) => {
                details = details.with_detail(serde_json::json!({ "kind": err.kind() }));
            }
            CoreError::Internal { .. } => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::AccessDenied.to_string(), "ACCESS_DENIED");
        assert_eq!(ErrorCode::DatabaseLocked.to_string(), "DATABASE_LOCKED");
        assert_eq!(ErrorCode::AccountNotFound.to_string(), "ACCOUNT_NOT_FOUND");
    }

    #[test]
    fn test_store_error_keeps_its_message() {
        let error = CoreError::from(StoreError::Gnucash {
            message: "Unsupported table version".to_string(),
        });
        assert_eq!(error.to_string(), "Unsupported table version");
        assert_eq!(error.code(), ErrorCode::StoreError);
        assert_eq!(error.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_account_not_found_details() {
        let error = CoreError::AccountNotFound {
            name: "Assets:Checking".to_string(),
        };
        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::AccountNotFound);
        assert!(details.message.contains("Assets:Checking"));
        assert_eq!(
            details.details,
            Some(serde_json::json!({ "account_name": "Assets:Checking" }))
        );
        assert_eq!(details.suggestions.len(), 2);
    }

    #[test]
    fn test_locked_details_mention_override() {
        let details = CoreError::DatabaseLocked.to_details();
        assert!(details.suggestions.iter().any(|s| s.contains("open_if_lock")));
    }

    #[test]
    fn test_details_serialize_screaming_code() {
        let json = serde_json::to_value(CoreError::AccessDenied.to_details()).unwrap();
        assert_eq!(json["code"], "ACCESS_DENIED");
        assert!(json.get("details").is_none());
    }
}
