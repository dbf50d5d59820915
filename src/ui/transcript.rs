//! Conversation → HTML fragment.

use crate::core::conversation::Conversation;
use crate::core::message::{Message, Role};
use crate::ui::markup::{escape_text, render_markdown};

pub const CONTAINER_ID: &str = "conversation-container";

const TRANSCRIPT_STYLE: &str = r#"<style>
    .conversation-container {
        font-family: Arial, sans-serif;
        background-color: transparent;
        overflow-y: auto;
        width: 100%;
        height: 400px;
    }
    .message {
        margin-bottom: 15px;
        padding: 10px;
        border-radius: 10px;
    }
    .message.user {
        background-color: #f0f0f0;
        color: #000;
    }
    .message.user .content {
        white-space: pre-wrap;
    }
    .message.assistant {
        background-color: transparent;
        color: #f0f0f0;
        border: 1px solid #f0f0f0;
    }
    .role {
        font-weight: bold;
    }
</style>
"#;

fn role_label(message: &Message) -> String {
    match (message.role, message.model.as_deref()) {
        (Role::Assistant, Some(model)) => {
            format!("{} ({}):", message.role.label(), escape_text(model))
        }
        (role, _) => format!("{}:", role.label()),
    }
}

fn render_message(out: &mut String, message: &Message) {
    let role_class = match message.role {
        Role::User => "user",
        _ => "assistant",
    };
    let body = match message.role {
        Role::User => escape_text(&message.content),
        _ => render_markdown(&message.content),
    };

    out.push_str(&format!(
        "<div class='message {role_class}'><span class='role'>{}</span><div class='content'>{}</div></div>\n\n",
        role_label(message),
        body
    ));
}

/// Render every message after the system prompt, oldest first, followed by a
/// script that keeps the newest message in view.
pub fn render_transcript(conversation: &Conversation) -> String {
    let mut out = String::from(TRANSCRIPT_STYLE);
    out.push_str(&format!(
        "<div class=\"conversation-container\" id=\"{CONTAINER_ID}\">\n"
    ));

    for message in conversation
        .messages()
        .iter()
        .filter(|message| !message.role.is_system())
    {
        render_message(&mut out, message);
    }

    out.push_str(&format!(
        "</div>\n<script>\n    var conversationContainer = document.getElementById('{CONTAINER_ID}');\n    conversationContainer.scrollTop = conversationContainer.scrollHeight;\n</script>\n"
    ));
    out
}
