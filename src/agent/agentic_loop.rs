//! Agent loop engine.
//!
//! Runs one user query through the model, executing `web_search` whenever the
//! model asks for it, until the model produces a plain-text answer or the
//! search round cap is hit.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::client::GeminiClient;
use crate::agent::conversation::ConversationBuffer;
use crate::agent::prompts::system_prompt;
use crate::agent::provider::LanguageModel;
use crate::agent::types::*;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tools::{ExaSearchClient, SearchClient, WebSearchTool, DEFAULT_NUM_RESULTS, WEB_SEARCH_TOOL};

/// Answer returned when the model never produces text
pub const FALLBACK_RESPONSE: &str = "Unable to generate a response.";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configurable limits for the agent loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Maximum search rounds before the model must answer without tools.
    pub max_tool_rounds: u32,
    /// Results fetched per search.
    pub num_results: usize,
    /// Language the system prompt asks the model to answer in.
    pub language: String,
    /// Text returned when the loop ends without a usable answer.
    pub fallback_message: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            num_results: DEFAULT_NUM_RESULTS,
            language: "Korean".to_string(),
            fallback_message: FALLBACK_RESPONSE.to_string(),
        }
    }
}

impl From<&Config> for LoopConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_tool_rounds: config.agent.max_tool_rounds,
            num_results: config.search.num_results,
            language: config.agent.language.clone(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Trace / output
// ---------------------------------------------------------------------------

/// How the loop finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Model answered with text.
    Completed,
    /// Model answered with empty text; fallback used.
    EmptyResponse,
    /// Model kept asking for tools past the round cap. The text sent with
    /// the last request is the answer, or the fallback when there was none.
    ToolLimitReached,
    /// Model asked for a tool we don't offer. Answered like `ToolLimitReached`.
    UnknownTool(String),
}

/// Summary of a single run.
#[derive(Debug, Clone)]
pub struct LoopTrace {
    pub model_calls: u32,
    pub tool_rounds: u32,
    pub outcome: LoopOutcome,
    pub total_duration_ms: u64,
}

/// The result of running the agent loop.
#[derive(Debug, Clone)]
pub struct AgentOutput {
    /// The final answer.
    pub response: String,
    /// Structured trace of the run.
    pub trace: LoopTrace,
    /// The conversation buffer at the end of the run.
    pub messages: Vec<Message>,
}

enum LoopState {
    AwaitingModel,
    AwaitingTool(ToolInvocation),
    Done(String),
}

// ---------------------------------------------------------------------------
// Agent loop
// ---------------------------------------------------------------------------

/// Drives a model and the web search tool to answer one query at a time.
///
/// Holds no per-run state, so a single instance can serve concurrent runs.
pub struct AgentLoop {
    llm: Arc<dyn LanguageModel>,
    search: WebSearchTool,
    tools: Vec<ToolDefinition>,
    system_prompt: String,
    config: LoopConfig,
}

impl AgentLoop {
    /// Create a loop over the given clients
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchClient>,
        config: LoopConfig,
    ) -> Result<Self> {
        let system_prompt = system_prompt(&config.language)?;
        Ok(Self {
            llm,
            search: WebSearchTool::new(search, config.num_results),
            tools: vec![WebSearchTool::definition()],
            system_prompt,
            config,
        })
    }

    /// Build the hosted clients from configuration. Fails with
    /// [`Error::Config`] when either credential is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let llm = Arc::new(GeminiClient::new(config.llm.clone())?);
        let search = Arc::new(ExaSearchClient::new(config.search.clone())?);
        info!(
            "Agent ready: model={}, max_tool_rounds={}",
            llm.model(),
            config.agent.max_tool_rounds
        );
        Self::new(llm, search, LoopConfig::from(config))
    }

    /// Answer `user_query`, returning only the final text
    pub async fn answer(&self, user_query: &str) -> Result<String> {
        Ok(self.run(user_query).await?.response)
    }

    /// Run the loop for one query.
    ///
    /// Model failures abort the run as [`Error::Agent`]. Search failures are
    /// folded into the conversation and never escape.
    pub async fn run(&self, user_query: &str) -> Result<AgentOutput> {
        if user_query.trim().is_empty() {
            return Err(Error::InvalidInput("Query cannot be empty".to_string()));
        }

        let start = Instant::now();
        let mut buffer = ConversationBuffer::new(self.system_prompt.as_str(), user_query);
        let mut state = LoopState::AwaitingModel;
        let mut model_calls: u32 = 0;
        let mut tool_rounds: u32 = 0;
        let mut outcome = LoopOutcome::Completed;

        info!("Agent run started: query_len={}", user_query.chars().count());

        let answer = loop {
            state = match state {
                LoopState::AwaitingModel => {
                    let tools_allowed = tool_rounds < self.config.max_tool_rounds;
                    let offered: &[ToolDefinition] = if tools_allowed { &self.tools[..] } else { &[] };

                    model_calls += 1;
                    debug!(
                        "Model call {} (tool rounds so far: {}, tools offered: {})",
                        model_calls,
                        tool_rounds,
                        offered.len()
                    );

                    let reply = self
                        .llm
                        .invoke(buffer.messages(), offered)
                        .await
                        .map_err(Error::agent)?;

                    let next = match &reply {
                        ModelReply::Text(text) => LoopState::Done(text.clone()),
                        ModelReply::ToolCall { invocation, .. }
                            if invocation.name == WEB_SEARCH_TOOL && tools_allowed =>
                        {
                            LoopState::AwaitingTool(invocation.clone())
                        }
                        ModelReply::ToolCall { text, invocation }
                            if invocation.name == WEB_SEARCH_TOOL =>
                        {
                            warn!(
                                "Model requested search after {} rounds; stopping",
                                tool_rounds
                            );
                            outcome = LoopOutcome::ToolLimitReached;
                            LoopState::Done(text.clone())
                        }
                        ModelReply::ToolCall { text, invocation } => {
                            warn!("Model requested unknown tool '{}'", invocation.name);
                            outcome = LoopOutcome::UnknownTool(invocation.name.clone());
                            LoopState::Done(text.clone())
                        }
                    };

                    buffer.push(reply.into_message()).map_err(Error::agent)?;
                    next
                }
                LoopState::AwaitingTool(invocation) => {
                    tool_rounds += 1;
                    info!(
                        "Search round {}/{}",
                        tool_rounds, self.config.max_tool_rounds
                    );

                    let result = self.search.execute(&invocation).await;
                    buffer
                        .push(Message::tool(&invocation, result.content))
                        .map_err(Error::agent)?;
                    LoopState::AwaitingModel
                }
                LoopState::Done(text) => break text,
            };
        };

        let response = if answer.trim().is_empty() {
            if outcome == LoopOutcome::Completed {
                outcome = LoopOutcome::EmptyResponse;
            }
            self.config.fallback_message.clone()
        } else {
            answer
        };

        let trace = LoopTrace {
            model_calls,
            tool_rounds,
            outcome,
            total_duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Agent run finished: outcome={:?}, model_calls={}, tool_rounds={}, duration={}ms",
            trace.outcome, trace.model_calls, trace.tool_rounds, trace.total_duration_ms
        );

        Ok(AgentOutput {
            response,
            trace,
            messages: buffer.into_messages(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::*;
    use serde_json::json;

    fn search_call(id: &str, query: &str) -> ModelReply {
        ModelReply::tool_call(ToolInvocation::new(id, WEB_SEARCH_TOOL, json!({"query": query})))
    }

    fn agent(model: &Arc<ScriptedModel>, search: &Arc<RecordingSearch>) -> AgentLoop {
        AgentLoop::new(model.clone(), search.clone(), LoopConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_any_call() {
        let model = Arc::new(ScriptedModel::replies(vec![]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));
        let agent = agent(&model, &search);

        for query in ["", "   ", "\n\t"] {
            let err = agent.run(query).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert_eq!(model.call_count(), 0);
        assert_eq!(search.call_count(), 0);
    }

    #[tokio::test]
    async fn test_direct_answer_skips_search() {
        let model = Arc::new(ScriptedModel::replies(vec![ModelReply::Text(
            "Paris is the capital of France.".into(),
        )]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));

        let output = agent(&model, &search).run("Capital of France?").await.unwrap();

        assert_eq!(output.response, "Paris is the capital of France.");
        assert_eq!(output.trace.outcome, LoopOutcome::Completed);
        assert_eq!(output.trace.model_calls, 1);
        assert_eq!(search.call_count(), 0);

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[0].tools_offered, 1);
        assert_eq!(calls[0].messages[0].role, Role::System);
        assert!(calls[0].messages[0].content.contains("Answer in Korean."));
        assert_eq!(calls[0].messages[1], Message::user("Capital of France?"));
    }

    #[tokio::test]
    async fn test_search_round_feeds_results_back() {
        let model = Arc::new(ScriptedModel::replies(vec![
            search_call("call-1", "seoul weather today"),
            ModelReply::Text("It is sunny in Seoul.".into()),
        ]));
        let search = Arc::new(RecordingSearch::with_results(vec![
            sample_result("Seoul forecast", "https://weather.example/seoul"),
            sample_result("KMA", "https://kma.example"),
        ]));

        let output = agent(&model, &search).run("What's the weather in Seoul?").await.unwrap();

        assert_eq!(output.response, "It is sunny in Seoul.");
        assert_eq!(output.trace.tool_rounds, 1);
        assert_eq!(
            *search.queries.lock().unwrap(),
            vec!["seoul weather today".to_string()]
        );

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let second = &calls[1].messages;
        assert_eq!(second.len(), 4);
        assert!(second[2].tool_invocation.is_some());
        let tool_msg = &second[3];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call-1"));
        assert!(tool_msg.content.starts_with("Search results:"));
        assert!(tool_msg.content.contains("1. Seoul forecast"));
        assert!(tool_msg.content.contains("https://kma.example"));

        // final buffer ends on the assistant's text answer
        assert_eq!(output.messages.len(), 5);
        assert_eq!(output.messages[4], Message::assistant("It is sunny in Seoul."));
    }

    #[tokio::test]
    async fn test_search_failure_is_not_fatal() {
        let model = Arc::new(ScriptedModel::replies(vec![
            search_call("call-1", "latest news"),
            ModelReply::Text("I couldn't search, but here is what I know.".into()),
        ]));
        let search = Arc::new(RecordingSearch::failing());

        let output = agent(&model, &search).run("Any news?").await.unwrap();

        assert_eq!(output.response, "I couldn't search, but here is what I know.");
        assert_eq!(search.call_count(), 1);
        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let tool_msg = calls[1].messages.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert!(tool_msg
            .content
            .starts_with("An error occurred during search:"));
        assert!(tool_msg.content.contains("search backend unavailable"));
    }

    #[tokio::test]
    async fn test_model_failure_aborts_run() {
        let model = Arc::new(ScriptedModel::new(vec![Step::Fail("quota exceeded".into())]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));

        let err = agent(&model, &search).run("hello").await.unwrap_err();

        match err {
            Error::Agent(inner) => {
                assert!(matches!(*inner, Error::Provider(ref m) if m == "quota exceeded"))
            }
            other => panic!("expected agent failure, got {:?}", other),
        }
        assert_eq!(search.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_after_search_aborts_run() {
        let model = Arc::new(ScriptedModel::new(vec![
            Step::Reply(search_call("call-1", "q")),
            Step::Fail("connection reset".into()),
        ]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));

        let err = agent(&model, &search).run("hello").await.unwrap_err();
        assert!(matches!(err, Error::Agent(_)));
        assert_eq!(search.call_count(), 1);
    }

    #[tokio::test]
    async fn test_round_cap_guarantees_termination() {
        let model = Arc::new(ScriptedModel::always(search_call("loop", "again")));
        let search = Arc::new(RecordingSearch::with_results(vec![]));
        let config = LoopConfig {
            max_tool_rounds: 3,
            ..Default::default()
        };
        let agent = AgentLoop::new(model.clone(), search.clone(), config).unwrap();

        let output = agent.run("keep searching").await.unwrap();

        assert_eq!(output.response, FALLBACK_RESPONSE);
        assert_eq!(output.trace.outcome, LoopOutcome::ToolLimitReached);
        assert_eq!(output.trace.tool_rounds, 3);
        assert_eq!(search.call_count(), 3);
        assert_eq!(model.call_count(), 4);

        let calls = model.calls.lock().unwrap();
        assert!(calls[..3].iter().all(|c| c.tools_offered == 1));
        assert_eq!(calls[3].tools_offered, 0);
    }

    #[tokio::test]
    async fn test_answer_after_cap_is_used() {
        let model = Arc::new(ScriptedModel::replies(vec![
            search_call("a", "one"),
            ModelReply::Text("Final answer without more searching.".into()),
        ]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));
        let config = LoopConfig {
            max_tool_rounds: 1,
            ..Default::default()
        };
        let agent = AgentLoop::new(model.clone(), search.clone(), config).unwrap();

        let output = agent.run("question").await.unwrap();
        assert_eq!(output.response, "Final answer without more searching.");
        assert_eq!(output.trace.outcome, LoopOutcome::Completed);
        assert_eq!(model.calls.lock().unwrap()[1].tools_offered, 0);
    }

    #[tokio::test]
    async fn test_empty_text_uses_fallback() {
        let model = Arc::new(ScriptedModel::replies(vec![ModelReply::Text("  ".into())]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));

        let output = agent(&model, &search).run("hi").await.unwrap();
        assert_eq!(output.response, FALLBACK_RESPONSE);
        assert_eq!(output.trace.outcome, LoopOutcome::EmptyResponse);
    }

    #[tokio::test]
    async fn test_unknown_tool_without_text_uses_fallback() {
        let model = Arc::new(ScriptedModel::replies(vec![ModelReply::tool_call(
            ToolInvocation::new("c", "calculator", json!({"expr": "1+1"})),
        )]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));

        let output = agent(&model, &search).run("1+1?").await.unwrap();
        assert_eq!(output.response, FALLBACK_RESPONSE);
        assert_eq!(
            output.trace.outcome,
            LoopOutcome::UnknownTool("calculator".into())
        );
        assert_eq!(search.call_count(), 0);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_with_text_answers_with_text() {
        let model = Arc::new(ScriptedModel::replies(vec![ModelReply::ToolCall {
            text: "1+1 is 2.".into(),
            invocation: ToolInvocation::new("c", "calculator", json!({"expr": "1+1"})),
        }]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));

        let output = agent(&model, &search).run("1+1?").await.unwrap();
        assert_eq!(output.response, "1+1 is 2.");
        assert_eq!(
            output.trace.outcome,
            LoopOutcome::UnknownTool("calculator".into())
        );
        assert_eq!(search.call_count(), 0);
    }

    #[tokio::test]
    async fn test_text_sent_with_search_call_is_kept() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::ToolCall {
                text: "Let me check the news.".into(),
                invocation: ToolInvocation::new("call-1", WEB_SEARCH_TOOL, json!({"query": "news"})),
            },
            ModelReply::Text("Here is the news.".into()),
        ]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));

        let output = agent(&model, &search).run("news?").await.unwrap();
        assert_eq!(output.response, "Here is the news.");

        let calls = model.calls.lock().unwrap();
        let assistant = &calls[1].messages[2];
        assert_eq!(assistant.content, "Let me check the news.");
        assert!(assistant.tool_invocation.is_some());
    }

    #[tokio::test]
    async fn test_text_with_search_call_past_cap_is_answer() {
        let model = Arc::new(ScriptedModel::replies(vec![
            search_call("a", "one"),
            ModelReply::ToolCall {
                text: "Based on what I found, it is sunny.".into(),
                invocation: ToolInvocation::new("b", WEB_SEARCH_TOOL, json!({"query": "two"})),
            },
        ]));
        let search = Arc::new(RecordingSearch::with_results(vec![]));
        let config = LoopConfig {
            max_tool_rounds: 1,
            ..Default::default()
        };
        let agent = AgentLoop::new(model.clone(), search.clone(), config).unwrap();

        let output = agent.run("weather?").await.unwrap();
        assert_eq!(output.response, "Based on what I found, it is sunny.");
        assert_eq!(output.trace.outcome, LoopOutcome::ToolLimitReached);
        assert_eq!(search.call_count(), 1);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let err = AgentLoop::from_config(&Config::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_loop_config_from_config() {
        let mut config = Config::default();
        config.agent.max_tool_rounds = 2;
        config.agent.language = "English".into();
        config.search.num_results = 3;
        let loop_config = LoopConfig::from(&config);
        assert_eq!(loop_config.max_tool_rounds, 2);
        assert_eq!(loop_config.num_results, 3);
        assert_eq!(loop_config.language, "English");
        assert_eq!(loop_config.fallback_message, FALLBACK_RESPONSE);
    }
}
