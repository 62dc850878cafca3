pub mod buffer;

pub use buffer::AudioBuffer;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest utterance accepted for one speech-analysis call
pub const MAX_UTTERANCE_SECS: f32 = 60.0;

#[derive(Debug, Error, PartialEq)]
pub enum AudioError {
    #[error("Audio buffer is empty")]
    Empty,

    #[error("Utterance too long: {duration:.1}s > {max:.1}s")]
    TooLong { duration: f32, max: f32 },
}

/// Base64-encoded WAV, the `audioData` field of a speech request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioPayload(String);

impl AudioPayload {
    pub fn from_buffer(audio: &AudioBuffer) -> Result<Self, AudioError> {
        if audio.is_empty() {
            return Err(AudioError::Empty);
        }

        let duration = audio.effective_duration_secs();
        if duration > MAX_UTTERANCE_SECS {
            tracing::warn!(
                "Utterance too long: {:.1}s > {:.1}s",
                duration,
                MAX_UTTERANCE_SECS
            );
            return Err(AudioError::TooLong {
                duration,
                max: MAX_UTTERANCE_SECS,
            });
        }

        Ok(Self(BASE64_STANDARD.encode(audio.to_wav_bytes())))
    }

    /// Wrap an already-encoded payload
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn decode(&self) -> Option<Vec<u8>> {
        BASE64_STANDARD.decode(&self.0).ok()
    }
}
