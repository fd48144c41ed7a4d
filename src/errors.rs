use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AuditError {
    /// Resource not found error.
    NotFound(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Error interacting with an external API.
    ExternalApi(String),
    /// Internal error.
    Internal(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AuditError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AuditError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AuditError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AuditError::ExternalApi(msg) => write!(f, "External API error: {}", msg),
            AuditError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AuditError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AuditError {}

impl From<reqwest::Error> for AuditError {
    /// Converts a `reqwest::Error` into an `AuditError`.
    fn from(err: reqwest::Error) -> Self {
        AuditError::ExternalApi(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AuditError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AuditError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    #[allow(dead_code)]
    fn with_context<F>(self, f: F) -> Result<T, AuditError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AuditError> {
    fn context(self, context: impl Into<String>) -> Result<T, AuditError> {
        self.map_err(|e| AuditError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AuditError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AuditError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
