use std::time::Duration;

use crate::api::hub::DEFAULT_HUB_URL;
use crate::api::inference::{DEFAULT_INFERENCE_URL, DEFAULT_MAX_TOKENS};
use crate::core::config::data::{Config, ModelEntry};
use crate::core::conversation::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;

/// Models offered when the configuration does not list its own.
pub const BUILTIN_MODELS: &[(&str, &str)] = &[
    (
        "Mistral - 7B - Instruct - Version 0.3",
        "mistralai/Mistral-7B-Instruct-v0.3",
    ),
    (
        "Llama 3.1 - 70B - Instruct",
        "meta-llama/Llama-3.1-70B-Instruct",
    ),
];

impl Config {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn hub_url(&self) -> &str {
        self.hub_url.as_deref().unwrap_or(DEFAULT_HUB_URL)
    }

    pub fn inference_url(&self) -> &str {
        self.inference_url.as_deref().unwrap_or(DEFAULT_INFERENCE_URL)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(
            self.session_idle_secs
                .unwrap_or(DEFAULT_SESSION_IDLE_SECS)
                .max(1),
        )
    }

    pub fn model_entries(&self) -> Vec<ModelEntry> {
        if !self.models.is_empty() {
            return self.models.clone();
        }
        BUILTIN_MODELS
            .iter()
            .map(|(name, id)| ModelEntry {
                name: (*name).to_string(),
                id: (*id).to_string(),
            })
            .collect()
    }
}
