//! The fixed set of models a session can choose from.

use std::collections::HashSet;

use crate::core::config::{Config, ConfigError, ModelEntry};

/// Display name → provider model identifier, in selector order. Built once at
/// startup and shared read-only by every session.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
    default_index: usize,
}

impl ModelRegistry {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.model_entries(), config.default_model.as_deref())
    }

    pub fn new(entries: Vec<ModelEntry>, default_model: Option<&str>) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: None,
            message,
        };

        if entries.is_empty() {
            return Err(invalid("at least one model must be configured".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.name.trim().is_empty() || entry.id.trim().is_empty() {
                return Err(invalid(format!(
                    "model entries need a name and an id (got name '{}', id '{}')",
                    entry.name, entry.id
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(invalid(format!("duplicate model name '{}'", entry.name)));
            }
        }

        let default_index = match default_model {
            Some(name) => entries
                .iter()
                .position(|entry| entry.name == name)
                .ok_or_else(|| invalid(format!("default model '{name}' is not in the model list")))?,
            None => 0,
        };

        Ok(Self {
            entries,
            default_index,
        })
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn provider_id(&self, name: &str) -> Option<&str> {
        self.get(name).map(|entry| entry.id.as_str())
    }

    pub fn default_model(&self) -> &ModelEntry {
        &self.entries[self.default_index]
    }
}
