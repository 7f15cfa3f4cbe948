//! Error types for the `domain` layer.
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums. The `source` field holds the original error that caused the domain error,
/// so that `web` can report it without depending on `reqwest` or `serde_json` directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Other(String),
}

/// Failures while talking to the upstream content source. Any of these leaves the
/// cache contents untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Timeout,
    InvalidResponse,
}

impl Error {
    pub fn is_fetch_error(&self) -> bool {
        matches!(self.error_kind, DomainErrorKind::External(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            DomainErrorKind::External(ExternalErrorKind::Network) => {
                write!(f, "failed to fetch memes")?
            }
            DomainErrorKind::External(ExternalErrorKind::Timeout) => {
                write!(f, "timed out fetching memes")?
            }
            DomainErrorKind::External(ExternalErrorKind::InvalidResponse) => {
                write!(f, "failed to parse memes response")?
            }
            DomainErrorKind::Internal(InternalErrorKind::Config) => {
                write!(f, "invalid configuration")?
            }
            DomainErrorKind::Internal(InternalErrorKind::Other(message)) => {
                write!(f, "{message}")?
            }
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        let error_kind = if err.is_builder() {
            DomainErrorKind::Internal(InternalErrorKind::Config)
        } else if err.is_timeout() {
            DomainErrorKind::External(ExternalErrorKind::Timeout)
        } else if err.is_status() || err.is_decode() {
            DomainErrorKind::External(ExternalErrorKind::InvalidResponse)
        } else {
            DomainErrorKind::External(ExternalErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::External(ExternalErrorKind::InvalidResponse),
        }
    }
}
