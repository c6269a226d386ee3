use crate::providers::{
    self, twitter::TWITTER_OEMBED_ENDPOINT, youtube::YOUTUBE_OEMBED_ENDPOINT, ProviderAdapter,
    ProviderOutcome, TwitterAdapter, YouTubeAdapter,
};
use crate::{
    classify_url, Fetcher, MetadataExtractor, PreviewError, PreviewMetadata, PreviewOutput,
    ProviderKind,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// PreviewService turns one URL into one preview record.
///
/// Provider URLs are tried against their oEmbed endpoint first. Every other URL,
/// and every provider URL whose lookup came back empty, is fetched and scanned.
#[derive(Clone)]
pub struct PreviewService {
    fetcher: Fetcher,
    extractor: MetadataExtractor,
    providers: Vec<Arc<dyn ProviderAdapter>>,
    timeout: Duration,
}

impl Default for PreviewService {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewService {
    pub fn new() -> Self {
        Self::new_with_config(PreviewServiceConfig::default())
    }

    pub fn new_with_config(config: PreviewServiceConfig) -> Self {
        debug!(
            timeout_secs = config.timeout.as_secs_f64(),
            "Initializing PreviewService"
        );

        let fetcher = config.fetcher.unwrap_or_default();
        let providers: Vec<Arc<dyn ProviderAdapter>> = vec![
            Arc::new(YouTubeAdapter::with_endpoint(
                fetcher.clone(),
                config.youtube_endpoint,
            )),
            Arc::new(TwitterAdapter::with_endpoint(
                fetcher.clone(),
                config.twitter_endpoint,
            )),
        ];

        Self {
            fetcher,
            extractor: MetadataExtractor::new(),
            providers,
            timeout: config.timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn provider_for(&self, kind: ProviderKind) -> Option<&dyn ProviderAdapter> {
        self.providers
            .iter()
            .find(|p| p.kind() == kind)
            .map(|p| p.as_ref())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn generate_preview(&self, url: &str) -> Result<PreviewMetadata, PreviewError> {
        debug!("Starting preview generation for URL: {}", url);

        let parsed = validate_url(url)?;

        let kind = classify_url(url);
        if let Some(provider) = self.provider_for(kind) {
            debug!(provider = provider.name(), "Detected provider URL, trying oEmbed");
            if let ProviderOutcome::Found(preview) =
                providers::consult(provider, url, self.timeout).await
            {
                return Ok(preview);
            }
        }

        debug!("Using generic page scraping");
        let html = self.fetcher.fetch_html(&parsed, url, self.timeout).await?;
        Ok(self.extractor.extract(&html, url))
    }

    /// Like [`generate_preview`](Self::generate_preview), folded into the output record.
    pub async fn preview_output(&self, url: &str) -> PreviewOutput {
        let result = self.generate_preview(url).await;
        if let Err(e) = &result {
            e.log();
        }
        PreviewOutput::from(result)
    }
}

/// A URL must parse and carry both a scheme and a non-empty host.
fn validate_url(url: &str) -> Result<Url, PreviewError> {
    let parsed = Url::parse(url).map_err(|_| PreviewError::InvalidUrl(url.to_string()))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(PreviewError::InvalidUrl(url.to_string())),
    }
}

pub struct PreviewServiceConfig {
    pub timeout: Duration,
    pub fetcher: Option<Fetcher>,
    pub youtube_endpoint: String,
    pub twitter_endpoint: String,
}

impl Default for PreviewServiceConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            fetcher: None,
            youtube_endpoint: YOUTUBE_OEMBED_ENDPOINT.to_string(),
            twitter_endpoint: TWITTER_OEMBED_ENDPOINT.to_string(),
        }
    }
}

impl PreviewServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_youtube_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.youtube_endpoint = endpoint.into();
        self
    }

    pub fn with_twitter_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.twitter_endpoint = endpoint.into();
        self
    }
}
