//! Error types
//!
//! Three layers:
//! - `RemoteError`: the document store call itself failed
//! - `ValidationError`: user input rejected before anything is touched
//! - `SyncError`: what the sync engine reports to its callers

use reqwest::StatusCode;
use thiserror::Error;

/// Errors talking to the remote document store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Request never produced a response (DNS, TLS, timeout, ...)
    #[error("Request to document store failed: {0}")]
    Transport(String),

    /// Store answered with a non-2xx status
    #[error("Document store returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Response body was not the expected document shape
    #[error("Could not decode document store response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether the store rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            RemoteError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// Suggestion shown next to the error, if there is an obvious fix
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            _ if self.is_unauthorized() => {
                Some("Check the master key: ninjabucks config set master_key <key>")
            }
            RemoteError::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
                Some("Check the bin id: ninjabucks config set bin_id <id>")
            }
            RemoteError::Transport(_) => Some("Check your network connection and try again."),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            RemoteError::Decode(error.to_string())
        } else {
            RemoteError::Transport(error.to_string())
        }
    }
}

/// Input rejected before any mutation or network call
///
/// The `Display` text is shown to the user as-is.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a name")]
    EmptyName,

    #[error("Please enter value over 0")]
    NegativeBalance(i64),

    #[error("Please enter amount greater than 0!")]
    NonPositiveAmount(i64),
}

/// Errors reported by the sync engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Reading the latest document failed; local state was left alone
    #[error("Failed to load ninjas: {0}")]
    Load(#[source] RemoteError),

    /// Writing the document failed; local state was not rolled back
    #[error("Failed to save ninjas: {0}")]
    Save(#[source] RemoteError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Position does not exist in the current roster
    #[error("No ninja at position {index} (roster has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Balance change would not fit in an i64
    #[error("Balance of ninja at position {index} would overflow")]
    BalanceOverflow { index: usize },

    /// Background save queue is gone (runtime shutting down)
    #[error("Save queue is no longer running")]
    QueueClosed,
}

impl SyncError {
    /// Whether this came from bad user input rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }

    /// The underlying store error, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            SyncError::Load(e) | SyncError::Save(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(ValidationError::EmptyName.to_string(), "Please enter a name");
        assert_eq!(
            ValidationError::NegativeBalance(-1).to_string(),
            "Please enter value over 0"
        );
        assert_eq!(
            ValidationError::NonPositiveAmount(0).to_string(),
            "Please enter amount greater than 0!"
        );
    }

    #[test]
    fn test_validation_converts_into_sync_error() {
        let err: SyncError = ValidationError::EmptyName.into();
        assert!(err.is_validation());
        assert!(err.remote().is_none());
        assert_eq!(err.to_string(), "Please enter a name");
    }

    #[test]
    fn test_unauthorized_classification() {
        let err = RemoteError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "invalid key".to_string(),
        };
        assert!(err.is_unauthorized());
        assert!(err.recovery_suggestion().unwrap().contains("master_key"));

        let err = RemoteError::Status {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert!(!err.is_unauthorized());
        assert!(err.recovery_suggestion().unwrap().contains("bin_id"));
    }

    #[test]
    fn test_load_error_display() {
        let err = SyncError::Load(RemoteError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        });

        let msg = err.to_string();
        assert!(msg.contains("Failed to load"));
        assert!(msg.contains("500"));
        assert!(err.remote().is_some());
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = SyncError::IndexOutOfRange { index: 3, len: 1 };
        assert_eq!(err.to_string(), "No ninja at position 3 (roster has 1)");
    }
}
