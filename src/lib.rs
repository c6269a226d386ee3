//! Link preview metadata extraction.
//!
//! Given a URL, [`PreviewService`] produces either a [`PreviewMetadata`] record
//! suitable for rendering a preview card, or a [`PreviewError`]. YouTube and
//! X/Twitter links are answered from their oEmbed endpoints when possible; every
//! other page (and any provider lookup that comes back empty) is fetched and
//! scanned for Open Graph, Twitter card and `<title>` metadata.

use serde::{Deserialize, Serialize};

mod error;
mod extractor;
mod fetcher;
#[cfg(feature = "logging")]
mod logging;
mod preview_service;
pub mod providers;
mod utils;

pub use error::{ErrorRecord, PreviewError};
pub use extractor::MetadataExtractor;
pub use fetcher::{Fetcher, FetcherConfig, OEmbedResponse, MAX_HTML_BYTES};
#[cfg(feature = "logging")]
pub use logging::{log_error_card, log_preview_card, setup_logging, LogConfig};
pub use preview_service::{PreviewService, PreviewServiceConfig, DEFAULT_TIMEOUT};
pub use providers::{ProviderAdapter, ProviderError, ProviderOutcome};

/// Preview card fields.
///
/// Text fields are never absent: anything no source filled is an empty string.
/// `author` and `video_id` only exist when a provider adapter built the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewMetadata {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
    pub site_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub favicon: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub video_id: Option<String>,
}

impl Default for PreviewMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            image: String::new(),
            url: String::new(),
            site_name: String::new(),
            kind: "website".to_string(),
            favicon: String::new(),
            author: None,
            video_id: None,
        }
    }
}

/// The single record emitted per invocation: preview fields or an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PreviewOutput {
    Preview(PreviewMetadata),
    Error(ErrorRecord),
}

impl From<Result<PreviewMetadata, PreviewError>> for PreviewOutput {
    fn from(result: Result<PreviewMetadata, PreviewError>) -> Self {
        match result {
            Ok(preview) => PreviewOutput::Preview(preview),
            Err(e) => PreviewOutput::Error(e.to_record()),
        }
    }
}

/// Which extraction strategy a URL is routed to first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    VideoSharing,
    Microblogging,
    Generic,
}

// Plain substring tests against the whole string, so a provider domain in a
// path or query also matches.
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

pub fn is_twitter_url(url: &str) -> bool {
    url.contains("twitter.com") || url.contains("x.com")
}

/// Classify a URL; the first matching provider wins.
pub fn classify_url(url: &str) -> ProviderKind {
    if is_youtube_url(url) {
        ProviderKind::VideoSharing
    } else if is_twitter_url(url) {
        ProviderKind::Microblogging
    } else {
        ProviderKind::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_provider_hosts() {
        assert_eq!(
            classify_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            ProviderKind::VideoSharing
        );
        assert_eq!(
            classify_url("https://youtu.be/dQw4w9WgXcQ"),
            ProviderKind::VideoSharing
        );
        assert_eq!(
            classify_url("https://twitter.com/rustlang/status/1"),
            ProviderKind::Microblogging
        );
        assert_eq!(
            classify_url("https://x.com/rustlang/status/1"),
            ProviderKind::Microblogging
        );
        assert_eq!(
            classify_url("https://www.rust-lang.org/"),
            ProviderKind::Generic
        );
    }

    #[test]
    fn test_video_sharing_checked_first() {
        assert_eq!(
            classify_url("https://youtube.com/watch?v=dQw4w9WgXcQ&from=x.com"),
            ProviderKind::VideoSharing
        );
    }

    // Substring matching is inherited behaviour: these are not provider pages
    // but still take the provider path (and fall back when the lookup fails).
    #[test]
    fn test_substring_matches_outside_host() {
        assert_eq!(
            classify_url("https://example.com/share?u=youtube.com/x"),
            ProviderKind::VideoSharing
        );
        assert_eq!(
            classify_url("https://www.dropbox.com/s/abc"),
            ProviderKind::Microblogging
        );
    }

    #[test]
    fn test_default_metadata_shape() {
        let value = serde_json::to_value(PreviewMetadata::default()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["type"], "website");
        assert_eq!(object["title"], "");
        assert!(!object.contains_key("author"));
        assert!(!object.contains_key("video_id"));
        assert_eq!(object.len(), 7);
    }

    #[test]
    fn test_output_is_either_preview_or_error() {
        let output = PreviewOutput::from(Err(PreviewError::HttpError {
            status: 404,
            url: "https://example.com/missing".to_string(),
        }));
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["error"], "HTTP 404");
        assert_eq!(json["url"], "https://example.com/missing");
        assert!(json.get("title").is_none());
    }
}
