//! Exa search client
//!
//! Web search using the Exa API. Requires an Exa API key.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{truncate_chars, SearchClient, SearchResult, MAX_SNIPPET_CHARS};
use crate::config::ExaConfig;
use crate::{Error, Result};

/// Exa search request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest<'a> {
    query: &'a str,
    num_results: usize,
    use_autoprompt: bool,
    contents: ExaContents,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: ExaTextOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextOptions {
    max_characters: u32,
}

/// Exa search response structures
#[derive(Debug, Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExaResult {
    title: Option<String>,
    #[serde(default)]
    url: String,
    text: Option<String>,
    score: Option<f64>,
    published_date: Option<String>,
}

impl From<ExaResult> for SearchResult {
    fn from(r: ExaResult) -> Self {
        SearchResult {
            title: r.title.unwrap_or_default(),
            url: r.url,
            snippet: r
                .text
                .map(|t| truncate_chars(&t, MAX_SNIPPET_CHARS))
                .unwrap_or_default(),
            score: r.score.unwrap_or(0.0),
            published_date: r.published_date,
        }
    }
}

/// Exa search client
#[derive(Clone)]
pub struct ExaSearchClient {
    client: Client,
    config: ExaConfig,
}

impl ExaSearchClient {
    /// Create a new Exa search client
    pub fn new(config: ExaConfig) -> Result<Self> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(Error::Config(
                "API key is required. Provide it explicitly or set EXA_API_KEY.".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        let mut key = header::HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SearchClient for ExaSearchClient {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("Query cannot be empty".to_string()));
        }

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let request = ExaSearchRequest {
            query,
            num_results,
            use_autoprompt: self.config.use_autoprompt,
            contents: ExaContents {
                text: ExaTextOptions {
                    max_characters: self.config.max_characters,
                },
            },
        };

        debug!("Sending Exa search: query={:?}, num_results={}", query, num_results);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Exa search timed out: {}", e))
                } else {
                    Error::Provider(format!("Exa search request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Exa rate limit exceeded: {}", text);
            }
            return Err(Error::Provider(format!(
                "Exa search failed with status {}: {}",
                status, text
            )));
        }

        let exa_response = response
            .json::<ExaSearchResponse>()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse Exa response: {}", e)))?;

        let results: Vec<SearchResult> = exa_response
            .results
            .into_iter()
            .take(num_results)
            .map(SearchResult::from)
            .collect();

        debug!("Exa search returned {} results", results.len());

        Ok(results)
    }
}
