use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Structured context shared by every API failure kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// HTTP status code, when the failure came from a response
    pub status_code: Option<u16>,
    /// Raw server body (parsed JSON, or `{"error": <text>}` for non-JSON bodies)
    pub response_body: Option<Value>,
    /// Where the error was raised (e.g., "transport", "request_model")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_response_body(mut self, body: Value) -> Self {
        self.response_body = Some(body);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Discriminant of [`Error`], for branching without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    InsufficientCredits,
    RateLimit,
    Validation,
    Api,
    Connection,
    Timeout,
    Configuration,
    Usage,
    Cancelled,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::InsufficientCredits => "InsufficientCreditsError",
            ErrorKind::RateLimit => "RateLimitError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Api => "APIError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Usage => "UsageError",
            ErrorKind::Cancelled => "CancelledError",
            ErrorKind::Io => "IoError",
        };
        f.write_str(name)
    }
}

/// Unified error type for the PixelDojo client.
///
/// The first seven variants form the API failure taxonomy and are classified
/// once, at the network boundary. The rest cover local concerns.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}{message}", status_prefix(.context))]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("{}{message}{}", status_prefix(.context), remaining_suffix(.credits_remaining))]
    InsufficientCredits {
        message: String,
        credits_remaining: Option<f64>,
        credits_required: Option<f64>,
        context: ErrorContext,
    },

    #[error("{}{message}{}", status_prefix(.context), retry_after_suffix(.retry_after))]
    RateLimit {
        message: String,
        /// Seconds, from the `Retry-After` header
        retry_after: Option<f64>,
        context: ErrorContext,
    },

    #[error("{}{message}", status_prefix(.context))]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("{}{message}", status_prefix(.context))]
    Api {
        message: String,
        context: ErrorContext,
    },

    #[error("{}{message}", status_prefix(.context))]
    Connection {
        message: String,
        context: ErrorContext,
    },

    #[error("{}{message}", status_prefix(.context))]
    Timeout {
        message: String,
        timeout: Duration,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Usage error: {message}")]
    Usage { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_prefix(ctx: &ErrorContext) -> String {
    match ctx.status_code {
        Some(status) => format!("[{}] ", status),
        None => String::new(),
    }
}

// `{:?}` keeps the trailing ".0" on whole numbers (30.0, not 30).
fn remaining_suffix(remaining: &Option<f64>) -> String {
    match remaining {
        Some(r) => format!(" (remaining: {:?})", r),
        None => String::new(),
    }
}

fn retry_after_suffix(retry_after: &Option<f64>) -> String {
    match retry_after {
        Some(secs) if *secs > 0.0 => format!(" (retry after {:?}s)", secs),
        _ => String::new(),
    }
}

impl Error {
    pub fn authentication(message: impl Into<String>, context: ErrorContext) -> Self {
        Error::Authentication {
            message: message.into(),
            context,
        }
    }

    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        Error::Validation {
            message: message.into(),
            field: field.map(str::to_string),
            context: ErrorContext::new().with_source("request_model"),
        }
    }

    pub fn api(message: impl Into<String>, context: ErrorContext) -> Self {
        Error::Api {
            message: message.into(),
            context,
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Error::Connection {
            message: message.into(),
            context: ErrorContext::new().with_source("transport"),
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Error::Timeout {
            message: format!("Request timed out after {:?}s", timeout.as_secs_f64()),
            timeout,
            context: ErrorContext::new().with_source("transport"),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::InsufficientCredits { .. } => ErrorKind::InsufficientCredits,
            Error::RateLimit { .. } => ErrorKind::RateLimit,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Api { .. } => ErrorKind::Api,
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Usage { .. } => ErrorKind::Usage,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Context for the API taxonomy kinds; `None` for local errors.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Authentication { context, .. }
            | Error::InsufficientCredits { context, .. }
            | Error::RateLimit { context, .. }
            | Error::Validation { context, .. }
            | Error::Api { context, .. }
            | Error::Connection { context, .. }
            | Error::Timeout { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.context().and_then(|c| c.status_code)
    }

    pub fn response_body(&self) -> Option<&Value> {
        self.context().and_then(|c| c.response_body.as_ref())
    }

    /// Human-readable message without the status prefix or kind suffix.
    pub fn message(&self) -> String {
        match self {
            Error::Authentication { message, .. }
            | Error::InsufficientCredits { message, .. }
            | Error::RateLimit { message, .. }
            | Error::Validation { message, .. }
            | Error::Api { message, .. }
            | Error::Connection { message, .. }
            | Error::Timeout { message, .. }
            | Error::Configuration { message }
            | Error::Usage { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Only connection failures and generic API errors are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connection { .. } | Error::Api { .. })
    }

    pub fn credits_remaining(&self) -> Option<f64> {
        match self {
            Error::InsufficientCredits {
                credits_remaining, ..
            } => *credits_remaining,
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<f64> {
        match self {
            Error::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
