//! Session state transitions.
//!
//! Every user interaction and every remote outcome is expressed as a
//! [`SessionAction`]. Applying an action mutates the [`Session`] and may ask the
//! caller to perform remote work through a [`SessionCommand`]; the outcome of
//! that work is fed back as another action.

use tracing::{debug, warn};

use crate::api::inference::{InferenceError, Reply};
use crate::api::ChatMessage;
use crate::core::models::ModelRegistry;
use crate::core::session::{Notice, Session, SessionPhase};

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process that request.";
pub const BLANK_TOKEN_ERROR: &str = "The token cannot be blank";

pub enum SessionAction {
    SubmitToken {
        token: String,
    },
    TokenVerified {
        token: String,
        identity: String,
    },
    TokenRejected {
        message: String,
    },
    ApplyModel {
        model: String,
    },
    SubmitMessage {
        text: String,
    },
    ReplyReceived {
        result: Result<Reply, InferenceError>,
    },
    ResetToken,
    ResetApplication,
}

/// Everything needed to ask the inference API for the next reply.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    pub token: String,
    pub model_id: String,
    pub messages: Vec<ChatMessage>,
}

pub enum SessionCommand {
    VerifyToken { token: String },
    RequestReply(ReplyRequest),
}

pub fn apply_action(
    session: &mut Session,
    registry: &ModelRegistry,
    action: SessionAction,
) -> Option<SessionCommand> {
    match action {
        SessionAction::SubmitToken { token } => {
            let token = token.trim();
            if token.is_empty() {
                session.push_notice(Notice::error(BLANK_TOKEN_ERROR));
                return None;
            }
            Some(SessionCommand::VerifyToken {
                token: token.to_string(),
            })
        }

        SessionAction::TokenVerified { token, identity } => {
            debug!(%identity, "token accepted");
            session.set_token(token);
            session.set_identity(Some(identity));
            None
        }

        SessionAction::TokenRejected { message } => {
            session.push_notice(Notice::error(format!("Invalid token: {message}")));
            None
        }

        SessionAction::ApplyModel { model } => {
            if session.phase() == SessionPhase::Unauthenticated {
                return None;
            }
            if !registry.contains(&model) {
                session.push_notice(Notice::error(format!("Unknown model: {model}")));
                return None;
            }
            debug!(%model, "model applied");
            session.set_model(model);
            None
        }

        SessionAction::SubmitMessage { text } => submit_message(session, registry, text),

        SessionAction::ReplyReceived { result } => {
            record_reply(session, result);
            None
        }

        SessionAction::ResetToken => {
            session.clear_token();
            None
        }

        SessionAction::ResetApplication => {
            session.reset_application();
            None
        }
    }
}

fn submit_message(
    session: &mut Session,
    registry: &ModelRegistry,
    text: String,
) -> Option<SessionCommand> {
    if text.trim().is_empty() {
        return None;
    }

    match session.phase() {
        SessionPhase::Unauthenticated => return None,
        SessionPhase::AwaitingReply => {
            session.push_notice(Notice::error(
                "Still waiting for the previous reply; message not sent.",
            ));
            return None;
        }
        SessionPhase::Idle => {}
    }

    let token = session.token()?.to_string();
    let model_id = registry
        .provider_id(session.model())
        .unwrap_or(registry.default_model().id.as_str())
        .to_string();

    session.conversation_mut().push_user(text);
    session.set_awaiting_reply(true);

    Some(SessionCommand::RequestReply(ReplyRequest {
        token,
        model_id,
        messages: session.conversation().api_messages(),
    }))
}

fn record_reply(session: &mut Session, result: Result<Reply, InferenceError>) {
    if !session.is_awaiting_reply() {
        debug!("dropping reply for a session that is no longer waiting");
        return;
    }

    let model = session.model().to_string();
    match result {
        Ok(reply) => session.conversation_mut().push_assistant(reply.content, model),
        Err(err) => {
            warn!(error = %err, %model, "chat completion failed");
            session.push_notice(Notice::error(format!("Error generating response: {err}")));
            session
                .conversation_mut()
                .push_assistant(FALLBACK_REPLY, model);
        }
    }
    session.set_awaiting_reply(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::message::Role;
    use crate::utils::test_utils::{create_authenticated_session, create_test_session};

    const MISTRAL: &str = "Mistral - 7B - Instruct - Version 0.3";
    const LLAMA: &str = "Llama 3.1 - 70B - Instruct";

    fn registry() -> ModelRegistry {
        ModelRegistry::from_config(&Config::default()).expect("registry")
    }

    fn ok_reply(content: &str) -> Result<Reply, InferenceError> {
        Ok(Reply {
            content: content.to_string(),
        })
    }

    #[test]
    fn blank_token_is_rejected_without_mutation() {
        let registry = registry();
        let mut session = create_test_session();

        for candidate in ["", "   "] {
            let command = apply_action(
                &mut session,
                &registry,
                SessionAction::SubmitToken {
                    token: candidate.to_string(),
                },
            );
            assert!(command.is_none());
        }

        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
        assert!(session.token().is_none());
        let notices = session.take_notices();
        assert_eq!(notices.len(), 2);
        assert!(notices
            .iter()
            .all(|n| n.text == "The token cannot be blank"));
    }

    #[test]
    fn token_is_stored_only_after_verification() {
        let registry = registry();
        let mut session = create_test_session();

        let command = apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitToken {
                token: "  hf_abc  ".to_string(),
            },
        );
        match command {
            Some(SessionCommand::VerifyToken { token }) => assert_eq!(token, "hf_abc"),
            _ => panic!("expected a verification command"),
        }
        assert!(session.token().is_none());

        apply_action(
            &mut session,
            &registry,
            SessionAction::TokenVerified {
                token: "hf_abc".to_string(),
                identity: "ada".to_string(),
            },
        );
        assert_eq!(session.token(), Some("hf_abc"));
        assert_eq!(session.identity(), Some("ada"));
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn rejected_token_reports_provider_text() {
        let registry = registry();
        let mut session = create_test_session();

        apply_action(
            &mut session,
            &registry,
            SessionAction::TokenRejected {
                message: "401 Invalid credentials".to_string(),
            },
        );

        assert!(session.token().is_none());
        assert_eq!(
            session.take_notices(),
            vec![Notice::error("Invalid token: 401 Invalid credentials")]
        );
    }

    #[test]
    fn hello_round_trip_tags_reply_with_selected_model() {
        let registry = registry();
        let mut session = create_authenticated_session();
        assert!(!session.is_awaiting_reply());

        let command = apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "Hello".to_string(),
            },
        );
        let request = match command {
            Some(SessionCommand::RequestReply(request)) => request,
            _ => panic!("expected a reply request"),
        };
        assert!(session.is_awaiting_reply());
        assert_eq!(session.phase(), SessionPhase::AwaitingReply);
        assert_eq!(request.token, "hf_test");
        assert_eq!(request.model_id, "mistralai/Mistral-7B-Instruct-v0.3");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "Hello");

        apply_action(
            &mut session,
            &registry,
            SessionAction::ReplyReceived {
                result: ok_reply("Hi! How can I help?"),
            },
        );

        assert!(!session.is_awaiting_reply());
        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Hello");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "Hi! How can I help?");
        assert_eq!(messages[2].model.as_deref(), Some(MISTRAL));
    }

    #[test]
    fn failed_inference_still_appends_exactly_one_reply() {
        let registry = registry();
        let mut session = create_authenticated_session();

        apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "Hello".to_string(),
            },
        );
        apply_action(
            &mut session,
            &registry,
            SessionAction::ReplyReceived {
                result: Err(InferenceError::Provider {
                    status: 500,
                    message: "boom".to_string(),
                }),
            },
        );

        assert!(!session.is_awaiting_reply());
        let transcript = session.conversation().transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, FALLBACK_REPLY);

        let notices = session.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(
            notices[0].text,
            "Error generating response: provider returned 500: boom"
        );
    }

    #[test]
    fn submitted_text_is_kept_as_typed() {
        let registry = registry();
        let mut session = create_authenticated_session();

        let command = apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "  Hello\n".to_string(),
            },
        );

        let Some(SessionCommand::RequestReply(request)) = command else {
            panic!("expected a reply request");
        };
        assert_eq!(request.messages[1].content, "  Hello\n");
        assert_eq!(session.conversation().last().content, "  Hello\n");
    }

    #[test]
    fn empty_or_unauthenticated_submissions_are_ignored() {
        let registry = registry();

        let mut session = create_authenticated_session();
        let command = apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "  ".to_string(),
            },
        );
        assert!(command.is_none());
        assert!(session.conversation().is_empty());
        assert!(!session.is_awaiting_reply());

        let mut anonymous = create_test_session();
        let command = apply_action(
            &mut anonymous,
            &registry,
            SessionAction::SubmitMessage {
                text: "Hello".to_string(),
            },
        );
        assert!(command.is_none());
        assert!(anonymous.conversation().is_empty());
    }

    #[test]
    fn second_submission_while_waiting_is_refused() {
        let registry = registry();
        let mut session = create_authenticated_session();

        apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "first".to_string(),
            },
        );
        let command = apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "second".to_string(),
            },
        );

        assert!(command.is_none());
        assert_eq!(session.conversation().transcript().len(), 1);
        assert_eq!(session.take_notices().len(), 1);
    }

    #[test]
    fn stale_reply_is_dropped() {
        let registry = registry();
        let mut session = create_authenticated_session();

        apply_action(
            &mut session,
            &registry,
            SessionAction::ReplyReceived {
                result: ok_reply("unexpected"),
            },
        );
        assert!(session.conversation().is_empty());
    }

    #[test]
    fn model_changes_only_on_apply_and_only_to_known_models() {
        let registry = registry();
        let mut session = create_authenticated_session();

        apply_action(
            &mut session,
            &registry,
            SessionAction::ApplyModel {
                model: "GPT-9".to_string(),
            },
        );
        assert_eq!(session.model(), MISTRAL);
        assert_eq!(session.take_notices().len(), 1);

        apply_action(
            &mut session,
            &registry,
            SessionAction::ApplyModel {
                model: LLAMA.to_string(),
            },
        );
        assert_eq!(session.model(), LLAMA);

        let command = apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "Hello".to_string(),
            },
        );
        match command {
            Some(SessionCommand::RequestReply(request)) => {
                assert_eq!(request.model_id, "meta-llama/Llama-3.1-70B-Instruct")
            }
            _ => panic!("expected a reply request"),
        }
        apply_action(
            &mut session,
            &registry,
            SessionAction::ReplyReceived {
                result: ok_reply("hey"),
            },
        );
        assert_eq!(
            session.conversation().last().model.as_deref(),
            Some(LLAMA)
        );
    }

    #[test]
    fn reset_token_keeps_conversation_and_model() {
        let registry = registry();
        let mut session = create_authenticated_session();
        apply_action(
            &mut session,
            &registry,
            SessionAction::ApplyModel {
                model: LLAMA.to_string(),
            },
        );
        apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "Hello".to_string(),
            },
        );
        apply_action(
            &mut session,
            &registry,
            SessionAction::ReplyReceived {
                result: ok_reply("Hi"),
            },
        );

        apply_action(&mut session, &registry, SessionAction::ResetToken);

        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
        assert!(session.token().is_none());
        assert_eq!(session.model(), LLAMA);
        assert_eq!(session.conversation().transcript().len(), 2);
    }

    #[test]
    fn reset_application_restores_bootstrap_defaults() {
        let registry = registry();
        let mut session = create_authenticated_session();
        apply_action(
            &mut session,
            &registry,
            SessionAction::ApplyModel {
                model: LLAMA.to_string(),
            },
        );
        apply_action(
            &mut session,
            &registry,
            SessionAction::SubmitMessage {
                text: "Hello".to_string(),
            },
        );

        apply_action(&mut session, &registry, SessionAction::ResetApplication);

        let fresh = create_test_session();
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
        assert_eq!(session.model(), fresh.model());
        assert_eq!(session.conversation(), fresh.conversation());
        assert!(!session.is_awaiting_reply());
        assert!(session.token().is_none());
    }
}
