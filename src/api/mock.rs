// api/mock.rs
// Canned practice backend with fixed response latency

use super::catalog;
use super::{
    ApiError, CharacterReply, CharacterReplyRequest, DrillRequest, DrillSet, PracticeApi,
    PronunciationReport, ScenarioCatalog, SpeechAnalysis, SpeechAnalysisRequest,
};
use crate::models::{Difficulty, Drill, DrillType, PronunciationMistake, Scenario, Severity};
use crate::util::generate_id;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDelays {
    pub speech: Duration,
    pub reply: Duration,
    pub drills: Duration,
    pub drill: Duration,
    pub scenarios: Duration,
    pub scenario: Duration,
}

impl MockDelays {
    pub fn zero() -> Self {
        Self {
            speech: Duration::ZERO,
            reply: Duration::ZERO,
            drills: Duration::ZERO,
            drill: Duration::ZERO,
            scenarios: Duration::ZERO,
            scenario: Duration::ZERO,
        }
    }
}

impl Default for MockDelays {
    fn default() -> Self {
        Self {
            speech: Duration::from_millis(1500),
            reply: Duration::from_millis(1000),
            drills: Duration::from_millis(800),
            drill: Duration::from_millis(500),
            scenarios: Duration::from_millis(600),
            scenario: Duration::from_millis(400),
        }
    }
}

pub struct MockPracticeApi {
    delays: MockDelays,
}

impl MockPracticeApi {
    pub fn new(delays: MockDelays) -> Self {
        tracing::info!("Mock practice backend initialized");
        Self { delays }
    }

    pub fn instant() -> Self {
        Self::new(MockDelays::zero())
    }

    async fn simulate_latency(delay: Duration) {
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    fn th_drill() -> Drill {
        Drill {
            id: generate_id("drill"),
            drill_type: DrillType::Pronunciation,
            content: "Practice the \"th\" sound in these words".to_string(),
            target_words: words(&["think", "through", "weather", "brother"]),
            difficulty: Difficulty::Intermediate,
        }
    }

    fn coffee_vowels_drill() -> Drill {
        Drill {
            id: generate_id("drill"),
            drill_type: DrillType::Pronunciation,
            content: "Focus on vowel sounds in coffee-related words".to_string(),
            target_words: words(&["coffee", "latte", "espresso", "cappuccino"]),
            difficulty: Difficulty::Beginner,
        }
    }

    /// Drill aimed at the words the user actually missed
    fn targeted_drill(mistakes: &[PronunciationMistake]) -> Option<Drill> {
        let worst = mistakes.iter().map(|m| m.severity).max()?;

        let mut target_words: Vec<String> = Vec::new();
        for mistake in mistakes {
            let word = mistake.word.to_lowercase();
            if !target_words.contains(&word) {
                target_words.push(word);
            }
        }

        let difficulty = match worst {
            Severity::High => Difficulty::Beginner,
            Severity::Medium => Difficulty::Intermediate,
            Severity::Low => Difficulty::Advanced,
        };

        Some(Drill {
            id: generate_id("drill"),
            drill_type: DrillType::Pronunciation,
            content: "Repeat the words you mispronounced, slowly and then at full speed".to_string(),
            target_words,
            difficulty,
        })
    }
}

impl Default for MockPracticeApi {
    fn default() -> Self {
        Self::new(MockDelays::default())
    }
}

#[async_trait]
impl PracticeApi for MockPracticeApi {
    async fn analyze_speech(
        &self,
        request: &SpeechAnalysisRequest,
    ) -> Result<SpeechAnalysis, ApiError> {
        if request.audio_data.is_empty() {
            return Err(ApiError::InvalidAudio("empty audio payload".to_string()));
        }

        tracing::debug!(
            "Mock speech analysis: {} payload bytes, target={:?}",
            request.audio_data.as_str().len(),
            request.target_text
        );
        Self::simulate_latency(self.delays.speech).await;

        Ok(SpeechAnalysis {
            transcript: "Hi, I'd like to order a large coffee please".to_string(),
            pronunciation: PronunciationReport {
                accuracy: 0.85,
                mistakes: vec![PronunciationMistake {
                    id: generate_id("mistake"),
                    word: "coffee".to_string(),
                    expected_phoneme: "kɔːfi".to_string(),
                    actual_phoneme: "kofi".to_string(),
                    timestamp: 2.5,
                    severity: Severity::Medium,
                }],
            },
        })
    }

    async fn character_reply(
        &self,
        request: &CharacterReplyRequest,
    ) -> Result<CharacterReply, ApiError> {
        tracing::debug!(
            "Mock reply for scenario '{}' ({} prior turns)",
            request.scenario_id,
            request.conversation_history.len()
        );
        Self::simulate_latency(self.delays.reply).await;

        Ok(CharacterReply {
            reply: "Great! One large coffee coming right up. Would you like that black or with cream and sugar?"
                .to_string(),
            suggestions: words(&[
                "I'll have it black, please",
                "Could I get some cream and sugar?",
                "Just a splash of milk, thanks",
            ]),
            next_prompt: Some(
                "Respond to the barista's question about how you'd like your coffee prepared."
                    .to_string(),
            ),
        })
    }

    async fn generate_drills(&self, request: &DrillRequest) -> Result<DrillSet, ApiError> {
        tracing::debug!("Mock drill generation for {} mistakes", request.mistakes.len());
        Self::simulate_latency(self.delays.drills).await;

        let mut drills: Vec<Drill> = Self::targeted_drill(&request.mistakes).into_iter().collect();
        drills.push(Self::th_drill());
        drills.push(Self::coffee_vowels_drill());
        Ok(DrillSet { drills })
    }

    async fn get_drill(&self, drill_id: &str) -> Result<Drill, ApiError> {
        Self::simulate_latency(self.delays.drill).await;

        if drill_id.trim().is_empty() {
            return Err(ApiError::NotFound("drill ''".to_string()));
        }
        Ok(Drill {
            id: drill_id.to_string(),
            ..Self::th_drill()
        })
    }

    async fn list_scenarios(&self) -> Result<ScenarioCatalog, ApiError> {
        Self::simulate_latency(self.delays.scenarios).await;
        Ok(ScenarioCatalog {
            scenarios: catalog::default_scenarios(),
        })
    }

    async fn get_scenario(&self, scenario_id: &str) -> Result<Scenario, ApiError> {
        Self::simulate_latency(self.delays.scenario).await;
        catalog::find_scenario(scenario_id)
            .ok_or_else(|| ApiError::NotFound(format!("scenario '{}'", scenario_id)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioPayload;
    use tokio::time::Instant;

    fn mistake(word: &str, severity: Severity) -> PronunciationMistake {
        PronunciationMistake {
            id: generate_id("mistake"),
            word: word.to_string(),
            expected_phoneme: String::new(),
            actual_phoneme: String::new(),
            timestamp: 0.0,
            severity,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_analysis_waits_configured_latency() {
        let api = MockPracticeApi::default();
        let request = SpeechAnalysisRequest {
            audio_data: AudioPayload::from_encoded("UklGRg=="),
            target_text: Some("a large coffee".to_string()),
        };

        let started = Instant::now();
        let analysis = api.analyze_speech(&request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));

        assert_eq!(analysis.pronunciation.mistakes.len(), 1);
        assert_eq!(analysis.pronunciation.mistakes[0].word, "coffee");
        assert!((0.0..=1.0).contains(&analysis.pronunciation.accuracy));
    }

    #[tokio::test]
    async fn test_empty_audio_is_rejected() {
        let api = MockPracticeApi::instant();
        let request = SpeechAnalysisRequest {
            audio_data: AudioPayload::from_encoded(""),
            target_text: None,
        };
        let result = api.analyze_speech(&request).await;
        assert!(matches!(result, Err(ApiError::InvalidAudio(_))));
    }

    #[tokio::test]
    async fn test_generate_drills_targets_mistakes() {
        let api = MockPracticeApi::instant();
        let request = DrillRequest {
            mistakes: vec![
                mistake("Coffee", Severity::Low),
                mistake("coffee", Severity::High),
                mistake("latte", Severity::Medium),
            ],
        };

        let set = api.generate_drills(&request).await.unwrap();
        assert_eq!(set.drills.len(), 3);
        assert_eq!(set.drills[0].target_words, vec!["coffee", "latte"]);
        assert_eq!(set.drills[0].difficulty, Difficulty::Beginner);
    }

    #[tokio::test]
    async fn test_generate_drills_without_mistakes_returns_canned() {
        let api = MockPracticeApi::instant();
        let set = api
            .generate_drills(&DrillRequest { mistakes: Vec::new() })
            .await
            .unwrap();
        assert_eq!(set.drills.len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_lookup() {
        let api = MockPracticeApi::instant();
        assert_eq!(api.list_scenarios().await.unwrap().scenarios.len(), 5);
        assert_eq!(api.get_scenario("phone-call").await.unwrap().difficulty, Difficulty::Advanced);
        assert!(matches!(
            api.get_scenario("moon-base").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_drill_keeps_requested_id() {
        let api = MockPracticeApi::instant();
        let drill = api.get_drill("sample-drill-1").await.unwrap();
        assert_eq!(drill.id, "sample-drill-1");
        assert!(!drill.target_words.is_empty());
    }
}
