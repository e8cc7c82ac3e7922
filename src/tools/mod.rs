//! Tools module - the web search capability offered to the model
//!
//! - **traits**: the `SearchClient` trait, `SearchResult` and the prompt formatter
//! - **exa_search**: Exa API adapter (requires `EXA_API_KEY`)
//! - **web_search**: the `web_search` tool schema and execution

mod exa_search;
mod traits;
mod web_search;

pub use exa_search::ExaSearchClient;
pub use traits::{
    format_results_for_prompt, truncate_chars, SearchClient, SearchResult, MAX_SNIPPET_CHARS,
    NO_RESULTS_MESSAGE,
};
pub use web_search::{ToolResult, WebSearchTool, DEFAULT_NUM_RESULTS, WEB_SEARCH_TOOL};
