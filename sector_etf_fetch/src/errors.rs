//! Error types for the page client.

/// Errors that can occur while fetching a page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The URL could not be parsed.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The request failed before a response arrived (network error, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    HttpStatus { status: u16, body: String },
}

impl Error {
    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidUrl { .. } => None,
        }
    }
}
