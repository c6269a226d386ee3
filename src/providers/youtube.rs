use super::{ProviderAdapter, ProviderError};
use crate::{Fetcher, PreviewMetadata, ProviderKind};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, instrument};

pub const YOUTUBE_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";
pub const YOUTUBE_FAVICON: &str =
    "https://www.youtube.com/s/desktop/9c0f82da/img/favicon_144x144.png";

static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})",
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/v/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("video id pattern is valid"))
    .collect()
});

/// First 11-character video id found in any of the supported URL shapes.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Looks videos up through YouTube's oEmbed endpoint.
#[derive(Clone)]
pub struct YouTubeAdapter {
    fetcher: Fetcher,
    endpoint: String,
}

impl YouTubeAdapter {
    pub fn with_endpoint(fetcher: Fetcher, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for YouTubeAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::VideoSharing
    }

    fn name(&self) -> &'static str {
        "YouTube"
    }

    #[instrument(level = "debug", skip(self))]
    async fn lookup(&self, url: &str, timeout: Duration) -> Result<PreviewMetadata, ProviderError> {
        let video_id = extract_youtube_id(url).ok_or(ProviderError::NoVideoId)?;
        debug!(video_id = %video_id, "Fetching YouTube oEmbed data");

        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        let oembed = self
            .fetcher
            .fetch_oembed(
                &self.endpoint,
                &[("url", watch_url.as_str()), ("format", "json")],
                timeout,
            )
            .await?;

        // No existence check: maxresdefault is not published for every video.
        let image = oembed
            .thumbnail_url
            .unwrap_or_default()
            .replace("hqdefault", "maxresdefault");
        let description = format!("By {}", oembed.author_name.as_deref().unwrap_or("Unknown"));
        let author = oembed.author_name.unwrap_or_default();

        Ok(PreviewMetadata {
            title: oembed.title.unwrap_or_default(),
            description,
            image,
            url: url.to_string(),
            site_name: "YouTube".to_string(),
            kind: "video".to_string(),
            favicon: YOUTUBE_FAVICON.to_string(),
            author: Some(author),
            video_id: Some(video_id),
        })
    }
}
