use thiserror::Error;

/// Failures surfaced by the webhook hook and its collaborators.
///
/// Each variant identifies the stage that failed: configuration, connection
/// lookup, or transport. Collaborator errors are passed through unchanged.
#[derive(Debug, Error)]
pub enum HookError {
    /// No usable webhook token could be resolved.
    #[error("Cannot get token: {0}")]
    Configuration(String),

    /// The referenced connection does not exist in any source.
    #[error("connection '{0}' is not defined")]
    NotFound(String),

    /// The connection exists but its record could not be interpreted.
    #[error("connection '{name}' is invalid: {reason}")]
    InvalidConnection { name: String, reason: String },

    /// A proxy entry with an unknown scheme key or an unusable URL.
    #[error("invalid proxy '{url}': {reason}")]
    InvalidProxy {
        url: String,
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Connection-level failure talking to the endpoint.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{status}:{reason}")]
    HttpStatus {
        status: u16,
        reason: String,
        body: String,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = HookError> = std::result::Result<T, E>;
