//! # Jarvis
//!
//! A conversational assistant served over HTTP that can consult the web.
//!
//! ## Features
//!
//! - **Gemini Integration:** answers come from Google's Gemini models
//! - **Live Web Search:** the model may call Exa search for fresh information
//! - **Bounded Tool Loop:** at most a fixed number of search rounds per query
//! - **HTTP Gateway:** a small JSON API plus an embedded chat page

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
