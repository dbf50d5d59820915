//! Token validation against the Hugging Face hub.

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::api::{summarize_error_body, WhoAmI};
use crate::utils::url::construct_api_url;

pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

#[derive(Debug)]
pub enum HubError {
    /// The request never produced a response.
    Transport(reqwest::Error),

    /// The hub answered with a non-success status.
    Rejected { status: u16, message: String },

    /// The hub answered 2xx but the body was not an identity document.
    Malformed(String),
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubError::Transport(err) => write!(f, "could not reach the hub: {err}"),
            HubError::Rejected { status, message } => write!(f, "{status} {message}"),
            HubError::Malformed(detail) => write!(f, "unexpected hub response: {detail}"),
        }
    }
}

impl Error for HubError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HubError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Checks whether a candidate token identifies a hub account.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn whoami(&self, token: &str) -> Result<WhoAmI, HubError>;
}

#[derive(Clone)]
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
}

impl HubClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for HubClient {
    async fn whoami(&self, token: &str) -> Result<WhoAmI, HubError> {
        let url = construct_api_url(&self.base_url, "api/whoami-v2");
        debug!(%url, "checking token identity");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(HubError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(HubError::Rejected {
                status: status.as_u16(),
                message: summarize_error_body(&body),
            });
        }

        let body = response.text().await.map_err(HubError::Transport)?;
        serde_json::from_str::<WhoAmI>(&body).map_err(|err| HubError::Malformed(err.to_string()))
    }
}
