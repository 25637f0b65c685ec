use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The error type for awsrpc operations.
///
/// Every failure surfaced to a caller is one `Error`: credential supply,
/// request assembly, transport, decode and service failures alike. Service
/// failures carry the structured [`ApiError`] returned by [`Error::api_error`].
#[derive(Error, Debug)]
#[error("{message}{}", render_context(.context))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
    context: Vec<String>,
    api: Option<Box<ApiError>>,
}

fn render_context(context: &[String]) -> String {
    if context.is_empty() {
        return String::new();
    }
    format!(" ({})", context.join(", "))
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable credential values were found.
    CredentialUnavailable,

    /// A profile section exists but lacks a required key.
    ProfileIncomplete,

    /// The instance metadata service reported no active role.
    NoDefaultCredentials,

    /// Credentials are expired
    CredentialExpired,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Request cannot be assembled or signed.
    RequestInvalid,

    /// The transport failed to deliver the request or read the response.
    Transport,

    /// The service answered with an error status.
    Service,

    /// A value of an unsupported type reached a scalar position.
    Unsupported,

    /// The payload member has a type that cannot become a body.
    PayloadType,

    /// A response body could not be decoded.
    Decode,

    /// Unexpected errors (I/O, invariants broken, etc.)
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CredentialUnavailable => write!(f, "credentials unavailable"),
            ErrorKind::ProfileIncomplete => write!(f, "profile incomplete"),
            ErrorKind::NoDefaultCredentials => write!(f, "no default credentials"),
            ErrorKind::CredentialExpired => write!(f, "expired credentials"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::Transport => write!(f, "transport failure"),
            ErrorKind::Service => write!(f, "service error"),
            ErrorKind::Unsupported => write!(f, "unsupported value"),
            ErrorKind::PayloadType => write!(f, "unknown payload type"),
            ErrorKind::Decode => write!(f, "decode failure"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// A structured error returned by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code of the response.
    pub status: u16,
    /// Service error code, for example `Throttling`.
    pub code: String,
    /// Error type as reported by the service (`Sender`, `Receiver`, `__type`).
    pub error_type: String,
    /// Human readable message.
    pub message: String,
    /// Request id assigned by the service.
    pub request_id: String,
    /// Whether the retry policy considers this error transient.
    pub retryable: bool,
    /// Delay to wait before the next attempt.
    pub retry_delay: Duration,
    /// Number of retries already performed when this error was observed.
    pub retry_count: u32,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = if self.code.is_empty() {
            "UnknownError"
        } else {
            &self.code
        };
        write!(f, "{code}: ")?;
        if self.message.is_empty() {
            write!(f, "status code {}", self.status)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if !self.request_id.is_empty() {
            write!(f, " (request id: {})", self.request_id)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            context: Vec::new(),
            api: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a `key: value` style context entry rendered after the message.
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.context.push(context.to_string());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the plain message without context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the attached context entries.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// The service error carried by this error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        self.api.as_deref()
    }

    /// Mutable access to the service error, used by retry classification.
    pub fn api_error_mut(&mut self) -> Option<&mut ApiError> {
        self.api.as_deref_mut()
    }

    /// Only service errors explicitly marked retryable are retried.
    pub fn is_retryable(&self) -> bool {
        self.api.as_ref().is_some_and(|api| api.retryable)
    }

    /// Check if this is a credential error
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CredentialUnavailable
                | ErrorKind::ProfileIncomplete
                | ErrorKind::NoDefaultCredentials
                | ErrorKind::CredentialExpired
        )
    }
}

// Convenience constructors
impl Error {
    /// Create a credential unavailable error
    pub fn credential_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialUnavailable, message)
    }

    /// Create a profile incomplete error
    pub fn profile_incomplete(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProfileIncomplete, message)
    }

    /// Create a no default credentials error
    pub fn no_default_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoDefaultCredentials, message)
    }

    /// Create a credential expired error
    pub fn credential_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialExpired, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create an unsupported value error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// Create a payload type error
    pub fn payload_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadType, message)
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Wrap a service error.
    pub fn service(api: ApiError) -> Self {
        Self {
            kind: ErrorKind::Service,
            message: api.to_string(),
            source: None,
            context: Vec::new(),
            api: Some(Box::new(api)),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::decode(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
