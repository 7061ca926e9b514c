//! Library error type

use reqwest::StatusCode;

/// Errors surfaced by the CMS clients, renderers and controllers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure talking to the CMS
    #[error("CMS request failed: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// The CMS answered with a non-success status
    #[error("CMS returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A CMS payload could not be decoded
    #[error("invalid CMS payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A timestamp in a CMS record could not be parsed
    #[error("invalid date {value:?}")]
    InvalidDate { value: String },

    /// A cursor was not produced by the client it was handed to
    #[error("invalid pagination cursor {0:?}")]
    Cursor(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn http(message: impl Into<String>, source: reqwest::Error) -> Self {
        Error::Http {
            message: message.into(),
            source,
        }
    }

    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http { .. } => true,
            Error::Status { status, .. } => status.is_server_error() || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
