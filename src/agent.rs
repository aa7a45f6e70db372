//! Tool-dispatching chat agent.
//!
//! One call to [`ChatAgent::respond`] drives a single turn through
//! `Idle → AwaitingModel → (ToolRequested → ExecutingTool → AwaitingModel)* → Responding → Idle`.
//! When the tool budget runs out, `ToolRequested` is followed by one more
//! `AwaitingModel` for a final answer with no tools on offer.
//! The model alone decides whether to call tools; the agent only validates,
//! dispatches, and bounds the number of calls.

use crate::ai::client::{GenerationClient, GenerationRequest, Message, Part, ToolCall};
use crate::ai::prompts;
use crate::ai::speech::{self, SpeechSynthesizer};
use crate::ai::tools::{self, ToolCatalog, ToolOutput};
use crate::config::Config;
use crate::core::conversation::{ConversationState, Role};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    AwaitingModel,
    ToolRequested,
    ExecutingTool,
    Responding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    /// The model kept asking for tools past the configured bound.
    ToolLimitReached,
    /// The model could not be reached or gave an empty answer; the reply is
    /// a generic apology.
    Failed,
}

#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub call: ToolCall,
    pub output: Option<ToolOutput>,
    pub error: Option<String>,
}

impl ToolInvocation {
    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    /// `data:audio/wav;base64,...` when speech is configured and succeeded.
    pub audio: Option<String>,
    pub tool_invocations: Vec<ToolInvocation>,
    pub trace: Vec<AgentState>,
    pub outcome: TurnOutcome,
}

pub struct ChatAgent {
    client: GenerationClient,
    catalog: Arc<ToolCatalog>,
    model: String,
    max_tool_calls: usize,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl ChatAgent {
    pub fn new(client: GenerationClient, catalog: Arc<ToolCatalog>, config: &Config) -> Self {
        Self {
            client,
            catalog,
            model: config.model.clone(),
            max_tool_calls: config.max_tool_calls,
            speech: None,
        }
    }

    pub fn with_speech(mut self, synth: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(synth);
        self
    }

    pub fn with_max_tool_calls(mut self, max: usize) -> Self {
        self.max_tool_calls = max;
        self
    }

    /// Answers `query` within `session`. Always appends a complete exchange to
    /// the session, either the answer or an apology, and never returns an error.
    pub async fn respond(&self, session: &mut ConversationState, query: &str) -> AgentReply {
        let mut turn = TurnRun::new(session, query);
        let declarations = self.catalog.declarations();

        let outcome = loop {
            turn.enter(AgentState::AwaitingModel);
            let request = GenerationRequest::chat(&self.model, prompts::ASSISTANT_SYSTEM, turn.contents.clone(), declarations.clone());

            let result = match self.client.generate(request).await {
                Ok(r) => r,
                Err(e) => {
                    log::error!("Chat turn failed in session {}: {}", session.session_id, e);
                    turn.text = prompts::TURN_FAILED.to_string();
                    break TurnOutcome::Failed;
                }
            };

            if result.tool_calls.is_empty() {
                turn.text = result.text.unwrap_or_default().trim().to_string();
                if turn.text.is_empty() {
                    log::warn!("Model returned an empty answer in session {}", session.session_id);
                    turn.text = prompts::EMPTY_ANSWER.to_string();
                    break TurnOutcome::Failed;
                }
                break TurnOutcome::Answered;
            }

            turn.enter(AgentState::ToolRequested);
            if turn.invocations.len() + result.tool_calls.len() > self.max_tool_calls {
                log::warn!(
                    "🛑 Tool budget of {} exhausted in session {}; asking for a final answer",
                    self.max_tool_calls,
                    session.session_id
                );
                turn.enter(AgentState::AwaitingModel);
                turn.text = self.best_effort_answer(&turn.contents).await;
                if turn.text.is_empty() {
                    turn.text = prompts::TOOL_LIMIT_FALLBACK.to_string();
                }
                break TurnOutcome::ToolLimitReached;
            }

            let mut call_parts: Vec<Part> = result.text.iter().map(|t| Part::Text(t.clone())).collect();
            call_parts.extend(result.tool_calls.iter().cloned().map(Part::ToolCall));
            turn.contents.push(Message { role: Role::Model, parts: call_parts });

            let mut result_parts = Vec::with_capacity(result.tool_calls.len());
            for call in result.tool_calls {
                turn.enter(AgentState::ExecutingTool);
                log::info!("🔧 Executing tool {}", call.name);
                let outcome = self.catalog.execute(&call).await;
                if let Err(e) = &outcome {
                    log::warn!("   Tool {} failed: {}", call.name, e);
                }
                result_parts.push(Part::ToolResult { name: call.name.clone(), response: tools::result_payload(&outcome) });
                let (output, error) = match outcome {
                    Ok(o) => (Some(o), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                turn.invocations.push(ToolInvocation { call, output, error });
            }
            turn.contents.push(Message { role: Role::User, parts: result_parts });
        };

        turn.enter(AgentState::Responding);
        let audio = match (&self.speech, outcome) {
            (Some(synth), TurnOutcome::Answered | TurnOutcome::ToolLimitReached) => {
                speech::render_reply(synth, &turn.text).await
            }
            _ => None,
        };

        session.record_exchange(query, &turn.text);
        turn.enter(AgentState::Idle);

        AgentReply {
            text: turn.text,
            audio,
            tool_invocations: turn.invocations,
            trace: turn.trace,
            outcome,
        }
    }

    /// One last request with no tools on offer, so the model must answer
    /// from what it has already gathered.
    async fn best_effort_answer(&self, contents: &[Message]) -> String {
        let mut contents = contents.to_vec();
        contents.push(Message::user(prompts::TOOL_LIMIT_NOTICE));
        let request = GenerationRequest::chat(&self.model, prompts::ASSISTANT_SYSTEM, contents, Vec::new());
        match self.client.generate(request).await {
            Ok(r) => r.text.map(|t| t.trim().to_string()).unwrap_or_default(),
            Err(e) => {
                log::warn!("Final answer after tool limit failed: {e}");
                String::new()
            }
        }
    }
}

/// Working state of one in-flight turn.
struct TurnRun {
    contents: Vec<Message>,
    invocations: Vec<ToolInvocation>,
    trace: Vec<AgentState>,
    text: String,
}

impl TurnRun {
    fn new(session: &ConversationState, query: &str) -> Self {
        let mut contents: Vec<Message> = session.turns().iter().map(Message::from).collect();
        contents.push(Message::user(query));
        Self { contents, invocations: Vec::new(), trace: vec![AgentState::Idle], text: String::new() }
    }

    fn enter(&mut self, state: AgentState) {
        log::debug!("agent state -> {state:?}");
        self.trace.push(state);
    }
}
