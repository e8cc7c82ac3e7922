//! Scripted model and search fakes shared by unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::agent::provider::LanguageModel;
use crate::agent::types::{Message, ModelReply, ToolDefinition};
use crate::error::{Error, Result};
use crate::tools::{SearchClient, SearchResult};

/// One scripted model response
pub enum Step {
    Reply(ModelReply),
    Fail(String),
}

/// A call the scripted model received
pub struct ModelCall {
    pub messages: Vec<Message>,
    pub tools_offered: usize,
}

/// Model that plays back a script, then repeats `repeat` (or fails) once it
/// runs out.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Step>>,
    repeat: Option<ModelReply>,
    pub calls: Mutex<Vec<ModelCall>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Step>) -> Self {
        ScriptedModel {
            script: Mutex::new(script.into()),
            repeat: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(replies: Vec<ModelReply>) -> Self {
        Self::new(replies.into_iter().map(Step::Reply).collect())
    }

    pub fn always(reply: ModelReply) -> Self {
        ScriptedModel {
            repeat: Some(reply),
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ModelReply> {
        self.calls.lock().unwrap().push(ModelCall {
            messages: messages.to_vec(),
            tools_offered: tools.len(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Fail(msg)) => Err(Error::Provider(msg)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| Error::Provider("script exhausted".to_string())),
        }
    }
}

/// Search client that records queries and returns canned results, or fails
/// when `results` is `None`.
pub struct RecordingSearch {
    results: Option<Vec<SearchResult>>,
    pub queries: Mutex<Vec<String>>,
}

impl RecordingSearch {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        RecordingSearch {
            results: Some(results),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        RecordingSearch {
            results: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchClient for RecordingSearch {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.results {
            Some(results) => Ok(results.iter().take(num_results).cloned().collect()),
            None => Err(Error::Provider("search backend unavailable".to_string())),
        }
    }
}

pub fn sample_result(title: &str, url: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: format!("About {}", title),
        score: 0.8,
        published_date: None,
    }
}
