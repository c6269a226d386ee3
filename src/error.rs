use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Invalid URL")]
    InvalidUrl(String),

    #[error("Not an HTML page")]
    UnsupportedContentType { content_type: String, url: String },

    #[error("HTTP {status}")]
    HttpError { status: u16, url: String },

    #[error("Connection failed: {cause}")]
    ConnectionError { cause: String, url: String },

    #[error("Failed to parse: {message}")]
    ParseError { message: String, url: String },
}

/// Serialisable form of a [`PreviewError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ErrorRecord {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            url: None,
        }
    }
}

impl PreviewError {
    /// The URL the failed request was made for.
    pub fn url(&self) -> &str {
        match self {
            PreviewError::InvalidUrl(url)
            | PreviewError::UnsupportedContentType { url, .. }
            | PreviewError::HttpError { url, .. }
            | PreviewError::ConnectionError { url, .. }
            | PreviewError::ParseError { url, .. } => url,
        }
    }

    /// Invalid URLs and non-HTML responses are reported without the URL.
    pub fn to_record(&self) -> ErrorRecord {
        let url = match self {
            PreviewError::InvalidUrl(_) | PreviewError::UnsupportedContentType { .. } => None,
            _ => Some(self.url().to_string()),
        };
        ErrorRecord {
            error: self.to_string(),
            url,
        }
    }

    pub fn log(&self) {
        match self {
            PreviewError::InvalidUrl(url) => {
                warn!(url = %url, "URL is missing a scheme or host");
            }
            PreviewError::UnsupportedContentType { content_type, url } => {
                warn!(url = %url, content_type = %content_type, "Invalid content type received");
            }
            PreviewError::HttpError { status, url } => {
                warn!(url = %url, status = *status, "Page returned a non-success status");
            }
            PreviewError::ConnectionError { cause, url } => {
                error!(url = %url, error = %cause, "Content fetch failed");
            }
            PreviewError::ParseError { message, url } => {
                error!(url = %url, error = %message, "Metadata extraction failed");
            }
        }
    }
}

/// Describe a transport failure the way it is reported to callers.
pub(crate) fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return "timed out".to_string();
    }
    let mut source: &dyn std::error::Error = e;
    while let Some(inner) = source.source() {
        source = inner;
    }
    source.to_string()
}
