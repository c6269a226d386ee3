use crate::error::describe_transport_error;
use crate::providers::ProviderError;
use crate::PreviewError;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE},
    Client,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

/// Upper bound on the number of page bytes handed to the scanner.
pub const MAX_HTML_BYTES: usize = 500 * 1024;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fields read from a provider's oEmbed response. Missing or `null` entries are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OEmbedResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// Creates a fetcher with custom configuration.
///
/// # Examples
/// ```ignore
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     max_body_bytes: 64 * 1024,
///     ..FetcherConfig::default()
/// });
/// ```
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    /// Sent with page requests only; oEmbed calls use the client defaults.
    pub page_headers: HeaderMap,
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        let mut page_headers = HeaderMap::new();
        page_headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        page_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        page_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        page_headers.insert(CONNECTION, HeaderValue::from_static("close"));

        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            page_headers,
            max_body_bytes: MAX_HTML_BYTES,
        }
    }
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    page_headers: HeaderMap,
    max_body_bytes: usize,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default())
    }

    pub fn new_with_config(config: FetcherConfig) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to create HTTP client");
                panic!("Failed to initialize HTTP client: {}", e);
            });

        Self {
            client,
            page_headers: config.page_headers,
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Fetch a page and return at most `max_body_bytes` of it as text.
    ///
    /// Invalid UTF-8 sequences are dropped. Errors carry `request_url` exactly as the
    /// caller wrote it.
    #[instrument(level = "debug", skip(self, url, request_url), fields(url = %request_url))]
    pub async fn fetch_html(
        &self,
        url: &Url,
        request_url: &str,
        timeout: Duration,
    ) -> Result<String, PreviewError> {
        let request_url = request_url.to_string();

        let mut response = self
            .client
            .get(url.clone())
            .headers(self.page_headers.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %request_url, "Failed to send request");
                PreviewError::ConnectionError {
                    cause: describe_transport_error(&e),
                    url: request_url.clone(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::HttpError {
                status: status.as_u16(),
                url: request_url,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") {
            return Err(PreviewError::UnsupportedContentType {
                content_type,
                url: request_url,
            });
        }

        let mut body = Vec::new();
        while body.len() < self.max_body_bytes {
            let chunk = response.chunk().await.map_err(|e| {
                error!(error = %e, url = %request_url, "Failed to read response body");
                if e.is_timeout() {
                    PreviewError::ConnectionError {
                        cause: describe_transport_error(&e),
                        url: request_url.clone(),
                    }
                } else {
                    PreviewError::ParseError {
                        message: e.to_string(),
                        url: request_url.clone(),
                    }
                }
            })?;
            let Some(chunk) = chunk else {
                break;
            };
            let remaining = self.max_body_bytes - body.len();
            body.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
        }

        debug!(url = %request_url, content_length = body.len(), "Successfully fetched webpage");
        Ok(decode_dropping_invalid(&body))
    }

    /// GET a provider's oEmbed endpoint and decode its JSON body.
    #[instrument(level = "debug", skip(self, query))]
    pub async fn fetch_oembed(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<OEmbedResponse, ProviderError> {
        let response = self
            .client
            .get(endpoint)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(ProviderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let oembed = response
            .json::<OEmbedResponse>()
            .await
            .map_err(ProviderError::Decode)?;

        debug!(endpoint = %endpoint, "Successfully fetched oEmbed data");
        Ok(oembed)
    }
}

/// UTF-8 decode that skips invalid byte sequences, including a character cut
/// off at the body cap.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_drops_invalid_sequences() {
        assert_eq!(decode_dropping_invalid(b"caf\xff\xfe"), "caf");
        assert_eq!(decode_dropping_invalid(b"a\x80b\xc3"), "ab");
        assert_eq!(decode_dropping_invalid("café".as_bytes()), "café");
        // A literal replacement character in the source is kept.
        assert_eq!(decode_dropping_invalid("x\u{FFFD}y".as_bytes()), "x\u{FFFD}y");
    }

    #[test]
    fn test_decode_drops_character_cut_at_cap() {
        let body = "héllo".as_bytes();
        assert_eq!(decode_dropping_invalid(&body[..2]), "h");
    }

    #[test]
    fn test_default_page_headers() {
        let config = FetcherConfig::default();
        assert_eq!(config.max_body_bytes, MAX_HTML_BYTES);
        assert_eq!(config.page_headers[ACCEPT_ENCODING], "identity");
        assert_eq!(config.page_headers[ACCEPT_LANGUAGE], "en-US,en;q=0.5");
    }
}
