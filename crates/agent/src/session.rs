use uuid::Uuid;

use crate::model::CapabilityCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Call(CapabilityCall),
    CallResult { name: String, result: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model_call(call: CapabilityCall) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Call(call)],
        }
    }

    /// Results are reported back on the user side of the conversation.
    pub fn call_result(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::CallResult {
                name: name.into(),
                result: result.into(),
            }],
        }
    }
}

/// Conversation state for one generation. Owned by the caller, who resets it
/// before each top-level prompt and must not run two generations on it at once.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    history: Vec<Turn>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.history
    }

    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    pub fn reset(&mut self) {
        self.id = Uuid::new_v4();
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
