use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Chat history for one session. Append-only; owned by whoever drives the
/// session, so separate sessions never share state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self { session_id: Uuid::new_v4().to_string(), turns: Vec::new() }
    }

    /// A session that opens with the assistant's greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut state = Self::new();
        state.push(Role::Model, greeting);
        state
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub(crate) fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn { role, text: text.into() });
    }

    /// Appends a completed exchange. Both turns land together so a session
    /// never holds a dangling user message.
    pub(crate) fn record_exchange(&mut self, query: &str, answer: &str) {
        self.push(Role::User, query);
        self.push(Role::Model, answer);
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
