use serde::{Deserialize, Serialize};

use crate::types::Preferences;

/// Body of every `POST /api/preferences` response.
///
/// `preferences` carries the reconciled document on success and is absent
/// on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl SaveResponse {
    pub fn saved(preferences: Preferences) -> Self {
        Self {
            success: true,
            message: "Preferências salvas com sucesso!".to_string(),
            preferences: Some(preferences),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            preferences: None,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
