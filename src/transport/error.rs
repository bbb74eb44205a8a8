//! Error types exposed by the REST transport.

use thiserror::Error;

/// Errors surfaced while talking to a REST endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a status outside the success set.
    #[error("{method} {url} failed: {status_line}")]
    Status {
        /// HTTP method of the failed request.
        method: String,
        /// Absolute URL of the failed request.
        url: String,
        /// Numeric HTTP status code.
        status: u16,
        /// Status line, e.g. `400 Bad Request`.
        status_line: String,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The request never produced a response.
    #[error("network error for {url}: {message}")]
    Network {
        /// Absolute URL of the failed request.
        url: String,
        /// Transport-level error detail.
        message: String,
    },

    /// The request or response body was not a valid structured document.
    #[error("malformed body for {url}: {message}")]
    Decode {
        /// Absolute URL of the request.
        url: String,
        /// Decoder detail.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to configure HTTP client: {message}")]
    Client {
        /// Builder error detail.
        message: String,
    },
}

impl TransportError {
    /// Returns true when the server answered and refused the request, so it
    /// may succeed if the operator edits the request and submits again.
    ///
    /// A [`TransportError::Network`] failure is never retryable: the server
    /// may have acted on a request whose response was lost.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Returns true when the request may have reached the server even
    /// though no response was read.
    #[must_use]
    pub const fn is_unconfirmed(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns the HTTP status when the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
