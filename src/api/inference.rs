//! Non-streaming chat completions against the hosted inference API.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::debug;

use crate::api::{summarize_error_body, ChatMessage, ChatRequest, ChatResponse};
use crate::core::message::Role;
use crate::utils::url::construct_api_url;

pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// The first choice returned by the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
}

/// Failures while building an authenticated client handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No token has been accepted for this session.
    MissingToken,

    /// The token contains bytes that cannot travel in an HTTP header.
    InvalidToken,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::MissingToken => {
                write!(f, "Hugging Face token not found. Please enter it below.")
            }
            ClientError::InvalidToken => write!(
                f,
                "Error connecting to Hugging Face Hub: the token contains characters that are not allowed in a request header"
            ),
        }
    }
}

impl Error for ClientError {}

/// Categorized failures of a completion request.
#[derive(Debug)]
pub enum InferenceError {
    /// No client handle could be built.
    Client(ClientError),

    /// Network-level failure; no response was received.
    Transport(reqwest::Error),

    /// The provider answered with a non-success status.
    Provider { status: u16, message: String },

    /// The provider answered 2xx with a body we cannot use.
    Malformed(String),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Client(err) => write!(f, "{err}"),
            InferenceError::Transport(err) => write!(f, "request failed: {err}"),
            InferenceError::Provider { status, message } => {
                write!(f, "provider returned {status}: {message}")
            }
            InferenceError::Malformed(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}

impl Error for InferenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InferenceError::Client(err) => Some(err),
            InferenceError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClientError> for InferenceError {
    fn from(err: ClientError) -> Self {
        InferenceError::Client(err)
    }
}

/// An authenticated handle able to produce one reply for a conversation.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Reply, InferenceError>;
}

/// Builds completion handles from a session's token.
pub trait CompletionConnector: Send + Sync {
    fn connect(&self, token: Option<&str>) -> Result<Arc<dyn CompletionBackend>, ClientError>;
}

/// Process-wide settings for reaching the inference endpoint.
#[derive(Clone)]
pub struct InferenceGateway {
    http: reqwest::Client,
    base_url: String,
    max_tokens: u32,
}

impl InferenceGateway {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            max_tokens,
        }
    }

    pub fn client(&self, token: Option<&str>) -> Result<InferenceClient, ClientError> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingToken)?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidToken)?;
        authorization.set_sensitive(true);

        Ok(InferenceClient {
            http: self.http.clone(),
            chat_url: construct_api_url(&self.base_url, "chat/completions"),
            authorization,
            max_tokens: self.max_tokens,
        })
    }
}

impl CompletionConnector for InferenceGateway {
    fn connect(&self, token: Option<&str>) -> Result<Arc<dyn CompletionBackend>, ClientError> {
        Ok(Arc::new(self.client(token)?))
    }
}

pub struct InferenceClient {
    http: reqwest::Client,
    chat_url: String,
    authorization: HeaderValue,
    max_tokens: u32,
}

impl InferenceClient {
    pub async fn chat_completion(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Reply, InferenceError> {
        let request = ChatRequest {
            model: model_id,
            messages,
            max_tokens: self.max_tokens,
            stream: false,
        };

        debug!(
            url = %self.chat_url,
            model = model_id,
            messages = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(&self.chat_url)
            .header(AUTHORIZATION, self.authorization.clone())
            .json(&request)
            .send()
            .await
            .map_err(InferenceError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(InferenceError::Provider {
                status: status.as_u16(),
                message: summarize_error_body(&error_text),
            });
        }

        let body = response.text().await.map_err(InferenceError::Transport)?;
        parse_reply(&body)
    }
}

#[async_trait]
impl CompletionBackend for InferenceClient {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<Reply, InferenceError> {
        self.chat_completion(model_id, messages).await
    }
}

fn parse_reply(body: &str) -> Result<Reply, InferenceError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|err| InferenceError::Malformed(err.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| InferenceError::Malformed("response contained no choices".to_string()))?;

    if let Some(reason) = choice.finish_reason.as_deref() {
        debug!(finish_reason = reason, "chat completion finished");
    }

    let role = match choice.message.role.as_deref() {
        None => Role::Assistant,
        Some(role) => Role::from_api_role(role).map_err(InferenceError::Malformed)?,
    };
    if role != Role::Assistant {
        return Err(InferenceError::Malformed(format!(
            "unexpected reply role: {}",
            role.as_str()
        )));
    }

    let content = choice
        .message
        .content
        .ok_or_else(|| InferenceError::Malformed("reply had no content".to_string()))?;

    Ok(Reply { content })
}
