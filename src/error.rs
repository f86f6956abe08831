use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a status >= 400. `body` is its decoded
    /// error object when the payload was valid JSON.
    #[error("HTTP error: {status}")]
    Backend {
        status: StatusCode,
        body: Option<Value>,
    },

    #[error("missing or non-string mongo_id")]
    MissingDocumentId,

    #[error("missing query parameter: {0}")]
    MissingQueryParameter(&'static str),

    #[error("invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("failed to load config: {0}")]
    Config(#[from] twelf::Error),

    #[error("failed to load root certificates from {path}: {reason}")]
    Certificates { path: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
