//! Errors that can happen during a sync run
//!
//! Every failure belongs to one of a few kinds, so that callers can decide what to do without parsing messages.
//! Item-level kinds (`MalformedInput`, `TransportFailure`, `PersistenceFailure`) are downgraded to a counted
//! outcome by the reconcilers and the orchestrator. `FatalSetupFailure` aborts the whole run.

use thiserror::Error;

use crate::sync::RunState;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A source contact cannot yield even a minimal valid record
    #[error("malformed contact {contact}: {reason}")]
    MalformedInput { contact: String, reason: String },

    /// A network call failed, either because of the transport or because of an unexpected HTTP status
    #[error("{context}: {reason}")]
    TransportFailure { context: String, reason: String },

    /// A local database statement failed
    #[error("{context}: {reason}")]
    PersistenceFailure { context: String, reason: String },

    /// Authentication, source fetch or destination setup failed
    #[error("{reason}")]
    FatalSetupFailure { reason: String },

    #[error("operation requires state {expected:?}, but the run is {actual:?}")]
    InvalidState { expected: RunState, actual: RunState },
}

/// The kind of a [`SyncError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    TransportFailure,
    PersistenceFailure,
    FatalSetupFailure,
    InvalidState,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::MalformedInput { .. } => ErrorKind::MalformedInput,
            SyncError::TransportFailure { .. } => ErrorKind::TransportFailure,
            SyncError::PersistenceFailure { .. } => ErrorKind::PersistenceFailure,
            SyncError::FatalSetupFailure { .. } => ErrorKind::FatalSetupFailure,
            SyncError::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::FatalSetupFailure | ErrorKind::InvalidState)
    }

    pub fn malformed<C: ToString, R: ToString>(contact: C, reason: R) -> Self {
        SyncError::MalformedInput { contact: contact.to_string(), reason: reason.to_string() }
    }

    pub fn transport<C: ToString, R: ToString>(context: C, reason: R) -> Self {
        SyncError::TransportFailure { context: context.to_string(), reason: reason.to_string() }
    }

    pub fn persistence<C: ToString, R: ToString>(context: C, reason: R) -> Self {
        SyncError::PersistenceFailure { context: context.to_string(), reason: reason.to_string() }
    }

    pub fn setup<R: ToString>(reason: R) -> Self {
        SyncError::FatalSetupFailure { reason: reason.to_string() }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        let context = match err.url() {
            Some(url) => format!("HTTP request to {}", url),
            None => "HTTP request".to_string(),
        };
        let reason = if err.is_timeout() {
            format!("timed out ({})", err)
        } else {
            err.to_string()
        };
        SyncError::TransportFailure { context, reason }
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        SyncError::persistence("database statement", err)
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::setup(format!("invalid URL: {}", err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::setup(format!("invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::setup(format!("I/O error: {}", err))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
