//! Error taxonomy for tree operations
//!
//! Every failure in Grove degrades to "the operation did not happen". The
//! variants below carry the short string code that is handed to the
//! instance's `error` callback (see [`Error::code`]).

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Grove error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Markup parsing error: {message}")]
    Markup { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Tree Operation Errors
    // ─────────────────────────────────────────────────────────────
    /// A rule or metadata constraint rejected the operation.
    #[error("{code}")]
    Validation { code: String },

    /// The instance is frozen.
    #[error("LOCKED")]
    Locked,

    /// The operation makes no sense for the node it targets.
    #[error("{code}")]
    InvalidOperation { code: String },

    /// An asynchronous load failed or timed out.
    #[error("{code}: {message}")]
    Transport { code: &'static str, message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn markup(message: impl Into<String>) -> Self {
        Self::Markup {
            message: message.into(),
        }
    }

    pub fn validation(code: impl Into<String>) -> Self {
        Self::Validation { code: code.into() }
    }

    pub fn invalid_operation(code: impl Into<String>) -> Self {
        Self::InvalidOperation { code: code.into() }
    }

    /// The referenced node does not exist in the instance.
    pub fn unknown_node(id: impl std::fmt::Display) -> Self {
        tracing::debug!("Unknown node referenced: {}", id);
        Self::invalid_operation("NODE: NOT FOUND")
    }

    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::Transport {
            code: "LOAD: FAILED",
            message: message.into(),
        }
    }

    pub fn load_timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            code: "LOAD: TIMEOUT",
            message: message.into(),
        }
    }

    /// Short string code passed to the `error` callback.
    pub fn code(&self) -> String {
        match self {
            Error::Io(_) => "IO".to_string(),
            Error::Json(_) => "PARSE: INVALID JSON".to_string(),
            Error::Markup { .. } => "PARSE: INVALID MARKUP".to_string(),
            Error::Config { .. } => "CONFIG".to_string(),
            Error::ChannelClosed => "CHANNEL CLOSED".to_string(),
            Error::Validation { code } | Error::InvalidOperation { code } => code.clone(),
            Error::Locked => "LOCKED".to_string(),
            Error::Transport { code, .. } => (*code).to_string(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Tree operation errors never corrupt state, so they are all
    /// recoverable; infrastructure errors are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::Locked
                | Error::InvalidOperation { .. }
                | Error::Transport { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
