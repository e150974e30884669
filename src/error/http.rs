use thiserror::Error;

/// Failures raised while talking to the target.
///
/// Only `BuildClient` is fatal. The remaining variants describe a single
/// request and are absorbed into that request's outcome.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid HTTP method '{method}': {reason}")]
    InvalidMethod { method: String, reason: String },
    #[error("Invalid header name '{name}': {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderName,
    },
    #[error("Invalid value for header '{name}': {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("Failed to build request: {source}")]
    BuildRequest {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response body: {source}")]
    ReadBody {
        #[source]
        source: reqwest::Error,
    },
    #[cfg(test)]
    #[error("Simulated failure: {message}")]
    Simulated { message: &'static str },
}

impl HttpError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            HttpError::BuildClient { source }
            | HttpError::BuildRequest { source }
            | HttpError::Transport { source }
            | HttpError::ReadBody { source } => source.is_timeout(),
            HttpError::InvalidMethod { .. }
            | HttpError::InvalidHeaderName { .. }
            | HttpError::InvalidHeaderValue { .. } => false,
            #[cfg(test)]
            HttpError::Simulated { .. } => false,
        }
    }
}
