use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One selectable model: the name shown in the selector and the identifier
/// sent to the inference API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Address the web server listens on (e.g., "127.0.0.1:8501")
    pub bind: Option<String>,
    /// Base URL of the hub used for token validation
    pub hub_url: Option<String>,
    /// Base URL of the OpenAI-compatible inference router
    pub inference_url: Option<String>,
    /// Cap on generated tokens per reply
    pub max_tokens: Option<u32>,
    /// System message every conversation starts with
    pub system_prompt: Option<String>,
    /// Display name of the model selected for new sessions
    pub default_model: Option<String>,
    /// Tracing filter used when RUST_LOG is not set (e.g., "info", "chatpane=debug")
    pub log_level: Option<String>,
    /// Seconds a session may sit unused before it is discarded
    pub session_idle_secs: Option<u64>,
    /// Replaces the built-in model list when non-empty
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
