//! Search client trait and result types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum snippet length, in characters, kept from each result
pub const MAX_SNIPPET_CHARS: usize = 500;

/// Text fed back to the model when a search finds nothing
pub const NO_RESULTS_MESSAGE: &str = "No search results found.";

/// A ranked result from the search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the page (may be empty)
    pub title: String,
    /// URL of the page
    pub url: String,
    /// Page text excerpt, at most [`MAX_SNIPPET_CHARS`] characters
    pub snippet: String,
    /// Provider relevance score
    pub score: f64,
    /// Publication date as reported by the provider, unvalidated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// A hosted web search backend
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a query and return up to `num_results` results in provider order.
    ///
    /// Fails with `InvalidInput` on an empty query and with a provider error
    /// on transport or API failure.
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>>;
}

/// Cut `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Render results as a compact numbered block for inclusion in a prompt
pub fn format_results_for_prompt(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut output = String::from("Search results:\n\n");

    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, result.title));
        output.push_str(&format!("   URL: {}\n", result.url));
        if !result.snippet.is_empty() {
            output.push_str(&format!("   Content: {}\n", result.snippet));
        }
        output.push('\n');
    }

    output
}
