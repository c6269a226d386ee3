//! Provider adapters
//!
//! An adapter answers a preview from a provider's own oEmbed endpoint instead of
//! scraping the page. A failed lookup is never reported to the caller: it turns
//! into [`ProviderOutcome::NotFound`] and the page is scraped instead.

use crate::{PreviewMetadata, ProviderKind};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub mod twitter;
pub mod youtube;

pub use twitter::TwitterAdapter;
pub use youtube::{extract_youtube_id, YouTubeAdapter};

/// Reasons an adapter produced nothing.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no video id in URL")]
    NoVideoId,

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Result of consulting an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Found(PreviewMetadata),
    NotFound,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str;

    async fn lookup(&self, url: &str, timeout: Duration) -> Result<PreviewMetadata, ProviderError>;
}

/// Fallback policy: every [`ProviderError`] means "scrape the page instead".
pub async fn consult(
    adapter: &dyn ProviderAdapter,
    url: &str,
    timeout: Duration,
) -> ProviderOutcome {
    match adapter.lookup(url, timeout).await {
        Ok(preview) => {
            debug!(provider = adapter.name(), url = %url, "Provider lookup succeeded");
            ProviderOutcome::Found(preview)
        }
        Err(e) => {
            debug!(
                provider = adapter.name(),
                url = %url,
                error = %e,
                "Provider lookup failed, falling back to page scraping"
            );
            ProviderOutcome::NotFound
        }
    }
}

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Remove anything shaped like a tag. Entities are left as they are.
pub fn strip_tags(html: &str) -> String {
    TAG_PATTERN.replace_all(html, "").into_owned()
}
