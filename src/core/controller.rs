use std::sync::Arc;

use tracing::{debug, info};

use crate::api::hub::TokenVerifier;
use crate::api::inference::{ClientError, CompletionConnector, InferenceError, Reply};
use crate::core::actions::{apply_action, ReplyRequest, SessionAction, SessionCommand};
use crate::core::models::ModelRegistry;
use crate::core::session::Session;

/// Applies actions to sessions and performs the remote work they request.
#[derive(Clone)]
pub struct SessionController {
    registry: Arc<ModelRegistry>,
    verifier: Arc<dyn TokenVerifier>,
    connector: Arc<dyn CompletionConnector>,
}

impl SessionController {
    pub fn new(
        registry: Arc<ModelRegistry>,
        verifier: Arc<dyn TokenVerifier>,
        connector: Arc<dyn CompletionConnector>,
    ) -> Self {
        Self {
            registry,
            verifier,
            connector,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Apply `action`, then keep executing follow-up commands until the
    /// session settles. Remote calls run while the caller holds the session.
    pub async fn dispatch(&self, session: &mut Session, action: SessionAction) {
        let mut pending = apply_action(session, &self.registry, action);
        while let Some(command) = pending.take() {
            let outcome = self.execute(command).await;
            pending = apply_action(session, &self.registry, outcome);
        }
    }

    /// Check that an authenticated client handle can be built for the session.
    pub fn check_client(&self, session: &Session) -> Result<(), ClientError> {
        self.connector.connect(session.token()).map(|_| ())
    }

    async fn execute(&self, command: SessionCommand) -> SessionAction {
        match command {
            SessionCommand::VerifyToken { token } => match self.verifier.whoami(&token).await {
                Ok(identity) => {
                    info!(user = %identity.name, "token validated");
                    SessionAction::TokenVerified {
                        token,
                        identity: identity.name,
                    }
                }
                Err(err) => {
                    info!(error = %err, "token rejected");
                    SessionAction::TokenRejected {
                        message: err.to_string(),
                    }
                }
            },
            SessionCommand::RequestReply(request) => SessionAction::ReplyReceived {
                result: self.request_reply(request).await,
            },
        }
    }

    async fn request_reply(&self, request: ReplyRequest) -> Result<Reply, InferenceError> {
        let backend = self.connector.connect(Some(&request.token))?;
        debug!(model = %request.model_id, "requesting reply");
        backend.complete(&request.model_id, &request.messages).await
    }
}
