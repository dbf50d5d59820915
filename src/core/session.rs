use std::fmt;

use crate::core::conversation::Conversation;
use crate::core::models::ModelRegistry;

/// Where a session is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No token has been accepted; only the token gate is reachable.
    Unauthenticated,

    /// Authenticated and waiting for user input.
    Idle,

    /// A user message was appended and its reply has not been recorded yet.
    AwaitingReply,
}

/// A one-shot error message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Values a session returns to on application reset.
#[derive(Debug, Clone)]
struct SessionDefaults {
    model: String,
    system_prompt: String,
}

/// State of one browser session. Mutated only through
/// [`crate::core::actions::apply_action`].
pub struct Session {
    model: String,
    conversation: Conversation,
    awaiting_reply: bool,
    token: Option<String>,
    identity: Option<String>,
    notices: Vec<Notice>,
    defaults: SessionDefaults,
}

impl Session {
    pub fn bootstrap(registry: &ModelRegistry, system_prompt: &str) -> Self {
        let defaults = SessionDefaults {
            model: registry.default_model().name.clone(),
            system_prompt: system_prompt.to_string(),
        };
        Self {
            model: defaults.model.clone(),
            conversation: Conversation::new(&defaults.system_prompt),
            awaiting_reply: false,
            token: None,
            identity: None,
            notices: Vec::new(),
            defaults,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.token, self.awaiting_reply) {
            (None, _) => SessionPhase::Unauthenticated,
            (Some(_), true) => SessionPhase::AwaitingReply,
            (Some(_), false) => SessionPhase::Idle,
        }
    }

    /// Display name of the active model.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Account name reported by the hub when the token was accepted.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Drain notices so each is shown exactly once.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub(crate) fn set_identity(&mut self, identity: Option<String>) {
        self.identity = identity;
    }

    pub(crate) fn clear_token(&mut self) {
        self.token = None;
        self.identity = None;
        self.awaiting_reply = false;
    }

    pub(crate) fn set_model(&mut self, model: String) {
        self.model = model;
    }

    pub(crate) fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub(crate) fn set_awaiting_reply(&mut self, awaiting: bool) {
        self.awaiting_reply = awaiting;
    }

    /// Back to bootstrap state: token, model, conversation and flag all reset.
    pub(crate) fn reset_application(&mut self) {
        self.model = self.defaults.model.clone();
        self.conversation = Conversation::new(&self.defaults.system_prompt);
        self.awaiting_reply = false;
        self.token = None;
        self.identity = None;
        self.notices.clear();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.model)
            .field("messages", &self.conversation.len())
            .field("awaiting_reply", &self.awaiting_reply)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("identity", &self.identity)
            .finish()
    }
}
