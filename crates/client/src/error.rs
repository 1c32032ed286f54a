use thiserror::Error;

/// Errors returned by a stream load commit.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url {url:?}: expected an http:// or https:// url")]
    InvalidUrl { url: String },

    /// Nothing to send. Checked before any I/O happens.
    #[error("no rows to commit")]
    EmptyPayload,

    /// Connection, timeout or request construction failure.
    #[error("stream load request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("stream load returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// A redirect from the FE could not be followed.
    #[error("stream load redirect from {url} failed: {reason}")]
    Redirect { url: String, reason: String },

    #[error("failed to decode stream load response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The load was received but Doris refused it.
    #[error("stream load rejected with status {status:?}: {message}")]
    Rejected {
        status: String,
        message: String,
        error_url: Option<String>,
    },
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

impl ClientError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { code, .. } => Some(*code),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether sending the same request again can succeed.
    ///
    /// Errors with an HTTP status are not covered here; callers decide
    /// those against their own list of retryable codes.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(err) => !err.is_builder(),
            ClientError::Decode { .. } => true,
            ClientError::Status { .. }
            | ClientError::InvalidUrl { .. }
            | ClientError::EmptyPayload
            | ClientError::Redirect { .. }
            | ClientError::Rejected { .. } => false,
        }
    }
}
