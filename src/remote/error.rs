use thiserror::Error;

/// Errors returned by [`CountClient`](super::CountClient).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Rejected before any request was sent.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The counter does not exist on the server.
    #[error("Counter '{id}' not found")]
    NotFound { id: String },

    /// The request could not complete (connect, transport, timeout).
    #[error("Request to '{url}' failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with an unexpected status.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not `{ "value": n }`.
    #[error("Malformed response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client itself could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl RemoteError {
    /// Short machine-readable kind, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::Validation(_) => "validation_error",
            RemoteError::NotFound { .. } => "not_found",
            RemoteError::Network { .. } => "network_error",
            RemoteError::Status { .. } => "status_error",
            RemoteError::Decode { .. } => "decode_error",
            RemoteError::Client(_) => "client_error",
        }
    }
}
