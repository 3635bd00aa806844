//! Bing Web Search (v7) adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use tracing::debug;

use super::error::{ErrorContext, SearchError};
use super::{SearchHit, SearchProvider, SearchQuery};

pub const DEFAULT_BASE_URL: &str = "https://api.bing.microsoft.com/v7.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum allowed response body (2MB).
const MAX_RESPONSE_LEN: usize = 2 * 1_024 * 1_024;

const PROVIDER: &str = "bing";

#[derive(Debug, Clone)]
pub struct BingWebSearchAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl BingWebSearchAdapter {
    /// Create from API key with the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        Self::with_config(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, SearchError> {
        let api_key = std::env::var("BING_SEARCH_API_KEY")
            .map_err(|_| SearchError::config("BING_SEARCH_API_KEY not set"))?;

        let base_url =
            std::env::var("BING_SEARCH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let timeout = std::env::var("BING_SEARCH_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self::with_config(api_key, base_url, timeout)
    }

    /// Create with custom configuration.
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::config("search API key is empty"));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&api_key)
            .map_err(|_| SearchError::config("Invalid API key format"))?;
        headers.insert("Ocp-Apim-Subscription-Key", key);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| SearchError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn extract_request_id(headers: &HeaderMap) -> Option<String> {
        headers
            .get("BingAPIs-TraceId")
            .or_else(|| headers.get("x-request-id"))
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchApiResponse {
    web_pages: Option<WebPages>,
}

#[derive(Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Deserialize)]
struct WebPage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiError>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

// =============================================================================
// SEARCH PROVIDER IMPL
// =============================================================================

#[async_trait]
impl SearchProvider for BingWebSearchAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
        let count = query.count.to_string();
        let mut response = self
            .client
            .get(self.search_url())
            .query(&[("q", query.query.as_str()), ("count", count.as_str())])
            .send()
            .await?;

        let status = response.status();
        let request_id = Self::extract_request_id(response.headers());

        // Stream response to enforce size limit
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let new_len = bytes.len() + chunk.len();
            if new_len > MAX_RESPONSE_LEN {
                return Err(SearchError::provider(
                    PROVIDER,
                    format!("Response too large: {new_len} bytes"),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let ctx = ErrorContext::new().with_status(status.as_u16());
        let ctx = match &request_id {
            Some(id) => ctx.with_request_id(id),
            None => ctx,
        };

        if !status.is_success() {
            let parsed = serde_json::from_slice::<ApiErrorResponse>(&bytes).ok();
            let api_error = parsed.and_then(|p| p.error.or_else(|| p.errors.into_iter().next()));
            return Err(match api_error {
                Some(error) => {
                    let ctx = match error.code {
                        Some(code) => ctx.with_code(code),
                        None => ctx,
                    };
                    let message = error
                        .message
                        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                    SearchError::provider_with_context(PROVIDER, message, ctx)
                }
                None => SearchError::provider_with_context(
                    PROVIDER,
                    format!("HTTP {}", status.as_u16()),
                    ctx,
                ),
            });
        }

        let parsed: SearchApiResponse = serde_json::from_slice(&bytes)
            .map_err(|e| SearchError::provider(PROVIDER, format!("Invalid JSON: {e}")))?;

        let hits: Vec<SearchHit> = parsed
            .web_pages
            .map(|pages| pages.value)
            .unwrap_or_default()
            .into_iter()
            .take(query.count)
            .map(|page| SearchHit {
                title: page.name,
                snippet: page.snippet,
                url: page.url,
            })
            .collect();

        debug!(
            query = %query.query,
            hits = hits.len(),
            request_id = request_id.as_deref().unwrap_or(""),
            "bing search completed"
        );
        Ok(hits)
    }
}
