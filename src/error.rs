//! Library-wide error type.
//!
//! Every remote call fails fast: a non-2xx response becomes
//! [`Error::Status`] and is never retried.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("error {action}: {status} {reason}")]
    Status {
        action: String,
        status: StatusCode,
        reason: String,
    },

    #[error("unsupported format: {0}")]
    Format(String),

    #[error("rdf error: {0}")]
    Rdf(String),

    #[error("generator error: {0}")]
    Generate(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<oxrdf::IriParseError> for Error {
    fn from(e: oxrdf::IriParseError) -> Self {
        Error::Rdf(e.to_string())
    }
}
