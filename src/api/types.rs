// api/types.rs
// Practice API request/response shapes and error definitions

use crate::audio::{AudioError, AudioPayload};
use crate::models::{ConversationTurn, Drill, PronunciationMistake, Scenario};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `POST /v1/speech`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAnalysisRequest {
    pub audio_data: AudioPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationReport {
    /// 0.0 - 1.0
    pub accuracy: f32,
    #[serde(default)]
    pub mistakes: Vec<PronunciationMistake>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAnalysis {
    pub transcript: String,
    pub pronunciation: PronunciationReport,
}

/// `POST /v1/reply`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterReplyRequest {
    pub scenario_id: String,
    pub user_message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterReply {
    pub reply: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_prompt: Option<String>,
}

/// `POST /v1/drills/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillRequest {
    pub mistakes: Vec<PronunciationMistake>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillSet {
    pub drills: Vec<Drill>,
}

/// `GET /v1/scenarios`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCatalog {
    pub scenarios: Vec<Scenario>,
}

/// Practice API error types with retry classification
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Service temporarily unavailable (circuit open)")]
    CircuitOpen,
}

impl ApiError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True for failures that say something about backend health
    pub fn counts_against_backend(&self) -> bool {
        !matches!(
            self,
            ApiError::Cancelled | ApiError::InvalidAudio(_) | ApiError::NotFound(_)
        )
    }
}

impl From<AudioError> for ApiError {
    fn from(err: AudioError) -> Self {
        ApiError::InvalidAudio(err.to_string())
    }
}
