//! Error types and handling infrastructure for ghd.
//!
//! Library code returns [`GhdError`] through the crate-wide [`Result`] alias; the
//! binary wraps it in `anyhow` at the top level.
//!
//! ## Categories
//!
//! - **Wiring errors** ([`SignalError`], [`GhdError::UnknownView`]) indicate a
//!   programming mistake and are returned immediately at construction time.
//! - **Provider errors** come from the deployment data source and are shown to the
//!   user in an acknowledgement popover.
//! - **Terminal errors** wrap the underlying I/O failure.

use crate::signal::HandlerId;
use thiserror::Error;

/// Misuse of the signal API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// `disconnect` was called with an id that is not (or no longer) registered
    #[error("handler {0:?} is not connected")]
    NotConnected(HandlerId),

    /// A signal was asked to forward to itself
    #[error("a signal cannot be connected to itself")]
    SelfConnection,
}

/// The main error type for ghd operations.
#[derive(Error, Debug)]
pub enum GhdError {
    /// Terminal I/O failed (raw mode, writes, size queries)
    #[error("Terminal operation failed: {message}")]
    Terminal {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Signal wiring error
    #[error("Signal wiring error: {0}")]
    Signal(#[from] SignalError),

    /// A multi-view was asked to show a key that was never registered
    #[error("Unknown view: {view}")]
    UnknownView { view: String },

    /// The deployment data provider failed
    #[error("{message}")]
    Provider { message: String },

    /// The input thread hung up
    #[error("Input channel closed")]
    InputClosed,

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// UI state errors
    #[error("UI operation failed: {message}")]
    Ui { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for ghd operations.
pub type Result<T> = std::result::Result<T, GhdError>;

impl GhdError {
    /// Create a Terminal error from an io::Error with additional context
    pub fn terminal(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Terminal {
            message: message.into(),
            source,
        }
    }

    /// Create an UnknownView error from any debuggable view key
    pub fn unknown_view(view: &impl std::fmt::Debug) -> Self {
        Self::UnknownView {
            view: format!("{view:?}"),
        }
    }

    /// Create a Provider error with a user-facing message
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a Config error with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a Ui error with a descriptive message
    pub fn ui(message: impl Into<String>) -> Self {
        Self::Ui {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// True for errors that indicate broken wiring rather than a runtime failure
    pub fn is_wiring_error(&self) -> bool {
        matches!(self, Self::Signal(_) | Self::UnknownView { .. })
    }
}

impl From<std::io::Error> for GhdError {
    fn from(err: std::io::Error) -> Self {
        Self::Terminal {
            message: "I/O operation failed".to_string(),
            source: err,
        }
    }
}
