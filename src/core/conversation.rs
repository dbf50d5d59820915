use crate::api::ChatMessage;
use crate::core::message::Message;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Ordered, append-only message history. The first entry is always the
/// system message the conversation was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>, model: impl Into<String>) {
        self.messages.push(Message::assistant(content, model));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system_message(&self) -> &Message {
        &self.messages[0]
    }

    /// Messages after the system prompt, in order.
    pub fn transcript(&self) -> &[Message] {
        &self.messages[1..]
    }

    pub fn last(&self) -> &Message {
        // never empty: the system message is always present
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing beyond the system prompt has been exchanged.
    pub fn is_empty(&self) -> bool {
        self.messages.len() == 1
    }

    pub fn api_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(Message::to_api).collect()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;

    #[test]
    fn starts_with_only_the_system_message() {
        let conversation = Conversation::default();
        assert_eq!(conversation.len(), 1);
        assert!(conversation.is_empty());
        assert_eq!(conversation.system_message().role, Role::System);
        assert_eq!(
            conversation.system_message().content,
            "You are a helpful assistant."
        );
        assert!(conversation.transcript().is_empty());
    }

    #[test]
    fn appends_preserve_order_and_keep_system_first() {
        let mut conversation = Conversation::new("Be brief.");
        conversation.push_user("Hello");
        conversation.push_assistant("Hi!", "Model A");
        conversation.push_user("Bye");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(conversation.transcript().len(), 3);
        assert_eq!(conversation.last().content, "Bye");
        assert!(!conversation.is_empty());
    }

    #[test]
    fn api_messages_include_system_prompt() {
        let mut conversation = Conversation::new("Be brief.");
        conversation.push_user("Hello");

        let api = conversation.api_messages();
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[0].content, "Be brief.");
        assert_eq!(api[1].role, "user");
    }
}
