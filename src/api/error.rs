use thiserror::Error;

/// Everything that can go wrong talking to the ChronoScope backend.
///
/// The UI collapses all variants into one message per operation; the variant
/// is what ends up in the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl ApiError {
    /// Short label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Client(_) => "client",
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
