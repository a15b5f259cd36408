//! Errors raised while talking to the CxSAST reporting API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credentials or the bearer token.
    #[error("authentication rejected by {url} (HTTP {status})")]
    Authentication { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        ApiError::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn decode(url: &str, message: impl Into<String>) -> Self {
        ApiError::Decode {
            url: url.to_string(),
            message: message.into(),
        }
    }
}
