use super::{strip_tags, ProviderAdapter, ProviderError};
use crate::{Fetcher, PreviewMetadata, ProviderKind};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

pub const TWITTER_OEMBED_ENDPOINT: &str = "https://publish.twitter.com/oembed";
pub const TWITTER_FAVICON: &str = "https://abs.twimg.com/favicons/twitter.3.ico";

/// Looks posts up through the publish.twitter.com oEmbed endpoint.
///
/// The endpoint returns no image, so `image` is always empty.
#[derive(Clone)]
pub struct TwitterAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl TwitterAdapter {
    pub fn with_endpoint(fetcher: Fetcher, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for TwitterAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Microblogging
    }

    fn name(&self) -> &'static str {
        "Twitter"
    }

    #[instrument(level = "debug", skip(self))]
    async fn lookup(&self, url: &str, timeout: Duration) -> Result<PreviewMetadata, ProviderError> {
        debug!(tweet_url = %url, "Fetching Twitter oEmbed data");
        let oembed = self
            .fetcher
            .fetch_oembed(&self.endpoint, &[("url", url)], timeout)
            .await?;

        let title = oembed
            .author_name
            .clone()
            .unwrap_or_else(|| "Tweet".to_string());

        Ok(PreviewMetadata {
            title,
            description: strip_tags(oembed.html.as_deref().unwrap_or_default()),
            image: String::new(),
            url: url.to_string(),
            site_name: "X (Twitter)".to_string(),
            kind: "article".to_string(),
            favicon: TWITTER_FAVICON.to_string(),
            author: Some(oembed.author_name.unwrap_or_default()),
            video_id: None,
        })
    }
}
