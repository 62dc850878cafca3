// api/mod.rs
// Practice API - contracts and backends

pub mod catalog;
mod envelope;
mod http;
mod mock;
mod types;

pub use envelope::ApiResponse;
pub use http::HttpPracticeApi;
pub use mock::{MockDelays, MockPracticeApi};
pub use types::{
    ApiError, CharacterReply, CharacterReplyRequest, DrillRequest, DrillSet, PronunciationReport,
    ScenarioCatalog, SpeechAnalysis, SpeechAnalysisRequest,
};

use crate::models::{Drill, Scenario};
use async_trait::async_trait;

/// Backend operations the practice screens depend on
#[async_trait]
pub trait PracticeApi: Send + Sync {
    /// Transcribe an utterance and score its pronunciation
    async fn analyze_speech(
        &self,
        request: &SpeechAnalysisRequest,
    ) -> Result<SpeechAnalysis, ApiError>;

    /// Next line from the scenario's character
    async fn character_reply(
        &self,
        request: &CharacterReplyRequest,
    ) -> Result<CharacterReply, ApiError>;

    /// Targeted drills for the supplied mistakes
    async fn generate_drills(&self, request: &DrillRequest) -> Result<DrillSet, ApiError>;

    async fn get_drill(&self, drill_id: &str) -> Result<Drill, ApiError>;

    async fn list_scenarios(&self) -> Result<ScenarioCatalog, ApiError>;

    async fn get_scenario(&self, scenario_id: &str) -> Result<Scenario, ApiError>;

    /// Get backend name
    fn name(&self) -> &str;
}
