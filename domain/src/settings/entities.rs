//! User-editable council settings

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Council members used when nothing else is configured
pub const DEFAULT_COUNCIL_MODELS: [&str; 4] = [
    "openai/gpt-5.1",
    "google/gemini-3-pro-preview",
    "anthropic/claude-sonnet-4.5",
    "x-ai/grok-4",
];

/// Chairman used when nothing else is configured
pub const DEFAULT_CHAIRMAN_MODEL: &str = "google/gemini-3-pro-preview";

/// Settings validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("At least one council model is required")]
    EmptyCouncil,

    #[error("Chairman model cannot be empty")]
    EmptyChairman,
}

/// Which models sit on the council and who chairs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub council_models: Vec<String>,
    #[serde(default)]
    pub chairman_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            council_models: DEFAULT_COUNCIL_MODELS.iter().map(|m| m.to_string()).collect(),
            chairman_model: DEFAULT_CHAIRMAN_MODEL.to_string(),
        }
    }
}

impl Settings {
    pub fn new(council_models: Vec<String>, chairman_model: impl Into<String>) -> Self {
        Self {
            council_models,
            chairman_model: chairman_model.into(),
        }
    }

    /// Trim entries and drop blank ones. A blank chairman falls back to the
    /// first council model, then to `previous_chairman`.
    pub fn normalized(&self, previous_chairman: Option<&str>) -> Self {
        let council_models: Vec<String> = self
            .council_models
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        let chairman = self.chairman_model.trim();
        let chairman_model = if !chairman.is_empty() {
            chairman.to_string()
        } else {
            council_models
                .first()
                .map(String::as_str)
                .or(previous_chairman.map(str::trim).filter(|c| !c.is_empty()))
                .unwrap_or_default()
                .to_string()
        };

        Self {
            council_models,
            chairman_model,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.council_models.iter().all(|m| m.trim().is_empty()) {
            return Err(SettingsError::EmptyCouncil);
        }
        if self.chairman_model.trim().is_empty() {
            return Err(SettingsError::EmptyChairman);
        }
        Ok(())
    }

    /// Fill missing fields from the defaults (used when reading partial
    /// settings from storage).
    pub fn or_defaults(self) -> Self {
        let defaults = Settings::default();
        Self {
            council_models: if self.council_models.is_empty() {
                defaults.council_models
            } else {
                self.council_models
            },
            chairman_model: if self.chairman_model.trim().is_empty() {
                defaults.chairman_model
            } else {
                self.chairman_model
            },
        }
    }

    pub fn is_council_member(&self, model: &str) -> bool {
        self.council_models.iter().any(|m| m == model)
    }
}
