// api/http.rs
// REST backend for the practice API (/v1/*)

use super::{
    ApiError, CharacterReply, CharacterReplyRequest, DrillRequest, DrillSet, PracticeApi,
    ScenarioCatalog, SpeechAnalysis, SpeechAnalysisRequest,
};
use crate::models::{Drill, Scenario};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";
/// Transport-level ceiling; per-call timeouts are enforced by the client
const TRANSPORT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpPracticeApi {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpPracticeApi {
    pub fn new(base_url: &str, api_version: &str, api_token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(TRANSPORT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        let endpoint = format!(
            "{}/{}",
            base_url.trim().trim_end_matches('/'),
            api_version.trim().trim_matches('/')
        );

        tracing::info!("HTTP practice backend initialized: {}", endpoint);

        Self {
            client,
            endpoint,
            api_token: api_token.filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Each segment is percent-encoded, so ids cannot escape their collection
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ApiError::Network(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("Invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let request = self.authorize(self.client.get(self.url(segments)?));
        Self::send(request).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.authorize(self.client.post(self.url(segments)?).json(body));
        Self::send(request).await
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
            tracing::warn!("Practice API returned HTTP {}: {}", status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    fn clean_transcript(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[async_trait]
impl PracticeApi for HttpPracticeApi {
    async fn analyze_speech(
        &self,
        request: &SpeechAnalysisRequest,
    ) -> Result<SpeechAnalysis, ApiError> {
        if request.audio_data.is_empty() {
            return Err(ApiError::InvalidAudio("empty audio payload".to_string()));
        }

        let mut analysis: SpeechAnalysis = self.post_json(&["speech"], request).await?;
        analysis.transcript = Self::clean_transcript(&analysis.transcript);
        analysis.pronunciation.accuracy = analysis.pronunciation.accuracy.clamp(0.0, 1.0);
        Ok(analysis)
    }

    async fn character_reply(
        &self,
        request: &CharacterReplyRequest,
    ) -> Result<CharacterReply, ApiError> {
        self.post_json(&["reply"], request).await
    }

    async fn generate_drills(&self, request: &DrillRequest) -> Result<DrillSet, ApiError> {
        self.post_json(&["drills", "generate"], request).await
    }

    async fn get_drill(&self, drill_id: &str) -> Result<Drill, ApiError> {
        self.get_json(&["drills", drill_id]).await
    }

    async fn list_scenarios(&self) -> Result<ScenarioCatalog, ApiError> {
        self.get_json(&["scenarios"]).await
    }

    async fn get_scenario(&self, scenario_id: &str) -> Result<Scenario, ApiError> {
        self.get_json(&["scenarios", scenario_id]).await
    }

    fn name(&self) -> &str {
        "http"
    }
}
