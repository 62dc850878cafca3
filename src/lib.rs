pub mod api;
pub mod audio;
pub mod client;
pub mod config;
pub mod models;
pub mod session;
pub mod util;

use api::{
    ApiResponse, CharacterReply, CharacterReplyRequest, DrillRequest, PracticeApi,
    ScenarioCatalog, SpeechAnalysis, SpeechAnalysisRequest,
};
use audio::{AudioBuffer, AudioError, AudioPayload};
use chrono::Utc;
use client::PracticeClient;
use config::AppConfig;
use models::{Drill, PronunciationMistake, Scenario, Session, SubscriptionStatus, User};
use serde::Serialize;
use session::{Conversation, HistoryStats, SessionError, SessionStore, SessionSummary};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum PracticeError {
    #[error("{0}")]
    Api(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("Scenario '{0}' requires a premium subscription")]
    PremiumRequired(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Session state unavailable")]
    StateUnavailable,
}

/// What the results screen shows after a practice ends
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeOutcome {
    pub session: Session,
    pub summary: SessionSummary,
    pub drills: Vec<Drill>,
}

/// Everything the screens share, built once at startup and passed down.
pub struct AppContext {
    config: AppConfig,
    store: Arc<Mutex<SessionStore>>,
    conversation: Arc<Mutex<Conversation>>,
    client: PracticeClient,
}

impl AppContext {
    pub fn new(config: AppConfig, backend: Arc<dyn PracticeApi>) -> Self {
        let client = PracticeClient::new(backend, config.call_policies());
        let store = SessionStore::new(config.abandon_policy);

        Self {
            config,
            store: Arc::new(Mutex::new(store)),
            conversation: Arc::new(Mutex::new(Conversation::new())),
            client,
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let backend = client::registry::backend_from_config(&config);
        Self::new(config, backend)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &PracticeClient {
        &self.client
    }

    /// Onboarding: create a free account after checking the email
    pub fn register_user(&self, name: &str, email: &str) -> Result<User, PracticeError> {
        if !util::is_valid_email(email) {
            return Err(PracticeError::InvalidEmail(email.trim().to_string()));
        }

        let user = User {
            id: util::generate_id("user"),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            subscription_status: SubscriptionStatus::Free,
            created_at: Utc::now(),
        };
        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    pub async fn scenarios(&self, cancel: &CancellationToken) -> ApiResponse<ScenarioCatalog> {
        self.client.list_scenarios(cancel).await
    }

    pub async fn scenario(&self, scenario_id: &str, cancel: &CancellationToken) -> ApiResponse<Scenario> {
        self.client.get_scenario(scenario_id, cancel).await
    }

    pub async fn drill(&self, drill_id: &str, cancel: &CancellationToken) -> ApiResponse<Drill> {
        self.client.get_drill(drill_id, cancel).await
    }

    pub async fn start_practice(
        &self,
        scenario_id: &str,
        user: &User,
        cancel: &CancellationToken,
    ) -> Result<Session, PracticeError> {
        let scenario = self
            .client
            .get_scenario(scenario_id, cancel)
            .await
            .into_result()
            .map_err(PracticeError::Api)?;

        if !scenario.is_accessible_by(user) {
            tracing::info!("User {} hit the paywall on '{}'", user.id, scenario.id);
            return Err(PracticeError::PremiumRequired(scenario.id));
        }

        let session = self.lock_store()?.start_session(scenario, &user.id).clone();
        self.lock_conversation()?.clear();
        Ok(session)
    }

    /// Send one recorded utterance for scoring and fold the result into the session
    pub async fn submit_utterance(
        &self,
        audio: &AudioBuffer,
        target_text: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<SpeechAnalysis, PracticeError> {
        let session_id = {
            let mut store = self.lock_store()?;
            let session_id = store
                .current_session()
                .map(|s| s.id.clone())
                .ok_or(SessionError::NoActiveSession)?;
            store.set_recording(false);
            session_id
        };

        let request = SpeechAnalysisRequest {
            audio_data: AudioPayload::from_buffer(audio)?,
            target_text,
        };

        let analysis = self
            .client
            .analyze_speech(&request, cancel)
            .await
            .into_result()
            .map_err(PracticeError::Api)?;

        let mut store = self.lock_store()?;
        ensure_current(&store, &session_id, "utterance analysis")?;
        for mistake in &analysis.pronunciation.mistakes {
            store.add_mistake(mistake.clone())?;
        }
        let words = u32::try_from(util::count_words(&analysis.transcript)).unwrap_or(u32::MAX);
        store.record_words(words)?;

        tracing::info!(
            "Utterance scored: accuracy={:.2}, {} mistakes",
            analysis.pronunciation.accuracy,
            analysis.pronunciation.mistakes.len()
        );
        Ok(analysis)
    }

    /// One conversational turn with the scenario's character
    pub async fn send_message(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<CharacterReply, PracticeError> {
        let (session_id, scenario_id) = self
            .lock_store()?
            .current_session()
            .map(|s| (s.id.clone(), s.scenario_id.clone()))
            .ok_or(SessionError::NoActiveSession)?;
        let conversation_history = self.lock_conversation()?.turns().to_vec();

        let request = CharacterReplyRequest {
            scenario_id,
            user_message: message.trim().to_string(),
            conversation_history,
        };

        let reply = self
            .client
            .character_reply(&request, cancel)
            .await
            .into_result()
            .map_err(PracticeError::Api)?;

        // Held until the turns are recorded so a finish or restart cannot interleave
        let store = self.lock_store()?;
        ensure_current(&store, &session_id, "character reply")?;
        let mut conversation = self.lock_conversation()?;
        conversation.push_user(request.user_message);
        conversation.push_character(reply.reply.clone());
        Ok(reply)
    }

    pub fn pause_practice(&self) -> Result<(), PracticeError> {
        self.lock_store()?.pause_session();
        Ok(())
    }

    pub fn resume_practice(&self) -> Result<(), PracticeError> {
        self.lock_store()?.resume_session();
        Ok(())
    }

    pub fn set_recording(&self, is_recording: bool) -> Result<(), PracticeError> {
        self.lock_store()?.set_recording(is_recording);
        Ok(())
    }

    /// Leave without saving: nothing reaches history
    pub fn abandon_practice(&self) -> Result<(), PracticeError> {
        self.lock_store()?.clear_session();
        self.lock_conversation()?.clear();
        Ok(())
    }

    /// End the session, archive it, and fetch drills for its mistakes
    pub async fn finish_practice(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PracticeOutcome, PracticeError> {
        let session = self
            .lock_store()?
            .end_session()
            .cloned()
            .ok_or(SessionError::NoActiveSession)?;
        self.lock_conversation()?.clear();

        let summary = SessionSummary::from_session(&session);
        let request = DrillRequest {
            mistakes: session.mistakes.clone(),
        };

        let drills = match self.client.generate_drills(&request, cancel).await.into_result() {
            Ok(set) => set.drills,
            Err(e) => {
                tracing::warn!("Drill generation failed for session {}: {}", session.id, e);
                Vec::new()
            }
        };

        Ok(PracticeOutcome {
            session,
            summary,
            drills,
        })
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store
            .lock()
            .ok()
            .and_then(|store| store.current_session().cloned())
    }

    pub fn current_scenario(&self) -> Option<Scenario> {
        self.store
            .lock()
            .ok()
            .and_then(|store| store.current_scenario().cloned())
    }

    pub fn mistakes(&self) -> Vec<PronunciationMistake> {
        self.store
            .lock()
            .map(|store| store.mistakes().to_vec())
            .unwrap_or_default()
    }

    pub fn is_recording(&self) -> bool {
        self.store
            .lock()
            .map(|store| store.is_recording())
            .unwrap_or(false)
    }

    pub fn conversation(&self) -> Vec<models::ConversationTurn> {
        self.conversation
            .lock()
            .map(|c| c.turns().to_vec())
            .unwrap_or_default()
    }

    pub fn history(&self) -> Vec<Session> {
        self.store
            .lock()
            .map(|store| store.history().to_vec())
            .unwrap_or_default()
    }

    pub fn history_stats(&self) -> HistoryStats {
        self.store
            .lock()
            .map(|store| HistoryStats::from_history(store.history()))
            .unwrap_or_default()
    }

    pub fn clear_history(&self) -> Result<(), PracticeError> {
        self.lock_store()?.clear_history();
        Ok(())
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, SessionStore>, PracticeError> {
        self.store.lock().map_err(|_| PracticeError::StateUnavailable)
    }

    fn lock_conversation(&self) -> Result<MutexGuard<'_, Conversation>, PracticeError> {
        self.conversation
            .lock()
            .map_err(|_| PracticeError::StateUnavailable)
    }
}

/// Results that come back after their session was finished or replaced are dropped
fn ensure_current(
    store: &SessionStore,
    session_id: &str,
    what: &str,
) -> Result<(), PracticeError> {
    if store.current_session().map(|s| s.id.as_str()) == Some(session_id) {
        return Ok(());
    }
    tracing::warn!(
        "Session {} ended while waiting for {}; dropping result",
        session_id,
        what
    );
    Err(SessionError::NoActiveSession.into())
}

/// About 1.5s of a 16kHz tone, fed in 100ms frames like a microphone capture
fn demo_utterance() -> AudioBuffer {
    let samples: Vec<i16> = (0..24_000)
        .map(|i| ((i as f32 * 0.07).sin() * 6_000.0) as i16)
        .collect();
    let mut buffer = AudioBuffer::new(16_000, 1);
    for frame in samples.chunks(1_600) {
        buffer.append(frame);
    }
    buffer
}

/// Scripted practice run: pick a scenario, speak, chat, finish.
pub async fn run() -> Result<(), PracticeError> {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    let context = AppContext::from_config(AppConfig::from_env());
    let cancel = CancellationToken::new();
    tracing::info!(
        "Practicing against the '{}' backend ({:?} on restart)",
        context.client().backend_name(),
        context.config().abandon_policy
    );

    let user = context.register_user("Demo Learner", "demo@pronouncepal.com")?;

    let catalog = context
        .scenarios(&cancel)
        .await
        .into_result()
        .map_err(PracticeError::Api)?;
    for scenario in &catalog.scenarios {
        tracing::info!(
            "Scenario '{}': {} ({:?}, {}{})",
            scenario.id,
            scenario.title,
            scenario.difficulty,
            util::format_duration(scenario.estimated_minutes),
            if scenario.is_premium { ", premium" } else { "" }
        );
    }

    let scenario_id = catalog
        .scenarios
        .iter()
        .find(|s| s.is_accessible_by(&user))
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "coffee-shop".to_string());

    let session = context.start_practice(&scenario_id, &user, &cancel).await?;
    tracing::info!("Practicing '{}' in session {}", scenario_id, session.id);

    context.set_recording(true)?;
    let analysis = context
        .submit_utterance(
            &demo_utterance(),
            Some("Hi, I'd like to order a large coffee please".to_string()),
            &cancel,
        )
        .await?;
    tracing::info!(
        "Heard: \"{}\" (accuracy {:.0}%)",
        analysis.transcript,
        analysis.pronunciation.accuracy * 100.0
    );

    let reply = context.send_message(&analysis.transcript, &cancel).await?;
    tracing::info!("Character: {}", reply.reply);
    for suggestion in &reply.suggestions {
        tracing::info!("  try: {}", suggestion);
    }

    let outcome = context.finish_practice(&cancel).await?;
    tracing::info!(
        "Session {} finished: {} mistakes, accuracy {}%, {} drills",
        outcome.session.id,
        outcome.summary.mistake_count,
        outcome.summary.accuracy_pct,
        outcome.drills.len()
    );
    for drill in &outcome.drills {
        tracing::info!("Drill {}: {} [{}]", drill.id, drill.content, drill.target_words.join(", "));
    }

    let stats = context.history_stats();
    tracing::info!(
        "History: {} sessions, {} mistakes, {:.1} min practiced",
        stats.total_sessions,
        stats.total_mistakes,
        stats.total_minutes
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{ApiError, DrillSet, MockDelays, MockPracticeApi};
    use async_trait::async_trait;
    use models::SessionStatus;
    use session::AbandonPolicy;
    use std::time::Duration;

    fn context() -> AppContext {
        AppContext::new(AppConfig::default(), Arc::new(MockPracticeApi::instant()))
    }

    fn delayed_context(delays: MockDelays) -> AppContext {
        AppContext::new(AppConfig::default(), Arc::new(MockPracticeApi::new(delays)))
    }

    /// Mock backend whose character is unreachable
    struct ReplyOutageApi(MockPracticeApi);

    #[async_trait]
    impl PracticeApi for ReplyOutageApi {
        async fn analyze_speech(
            &self,
            request: &SpeechAnalysisRequest,
        ) -> Result<SpeechAnalysis, ApiError> {
            self.0.analyze_speech(request).await
        }

        async fn character_reply(
            &self,
            _request: &CharacterReplyRequest,
        ) -> Result<CharacterReply, ApiError> {
            Err(ApiError::Status {
                status: 503,
                message: "Character offline".to_string(),
            })
        }

        async fn generate_drills(&self, request: &DrillRequest) -> Result<DrillSet, ApiError> {
            self.0.generate_drills(request).await
        }

        async fn get_drill(&self, drill_id: &str) -> Result<Drill, ApiError> {
            self.0.get_drill(drill_id).await
        }

        async fn list_scenarios(&self) -> Result<ScenarioCatalog, ApiError> {
            self.0.list_scenarios().await
        }

        async fn get_scenario(&self, scenario_id: &str) -> Result<Scenario, ApiError> {
            self.0.get_scenario(scenario_id).await
        }

        fn name(&self) -> &str {
            "reply-outage"
        }
    }

    fn free_user(context: &AppContext) -> User {
        context.register_user("Ana", "ana@example.com").unwrap()
    }

    fn utterance() -> AudioBuffer {
        AudioBuffer::from_samples(vec![100; 16_000], 16_000, 1)
    }

    #[test]
    fn test_register_user_validates_email() {
        let context = context();
        let user = free_user(&context);
        assert_eq!(user.subscription_status, SubscriptionStatus::Free);
        assert!(matches!(
            context.register_user("Ana", "not-an-email"),
            Err(PracticeError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_premium_scenario_requires_subscription() {
        let context = context();
        let mut user = free_user(&context);
        let cancel = CancellationToken::new();

        let result = context.start_practice("job-interview", &user, &cancel).await;
        assert!(matches!(result, Err(PracticeError::PremiumRequired(id)) if id == "job-interview"));
        assert!(context.current_session().is_none());

        user.subscription_status = SubscriptionStatus::Premium;
        let session = context.start_practice("job-interview", &user, &cancel).await.unwrap();
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_unknown_scenario_surfaces_api_error() {
        let context = context();
        let user = free_user(&context);
        let result = context
            .start_practice("moon-base", &user, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(PracticeError::Api(msg)) if msg.contains("moon-base")));
    }

    #[tokio::test]
    async fn test_submit_utterance_records_mistakes_and_words() {
        let context = context();
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();
        context.set_recording(true).unwrap();

        let analysis = context.submit_utterance(&utterance(), None, &cancel).await.unwrap();

        assert!(!context.is_recording());
        assert_eq!(context.mistakes().len(), analysis.pronunciation.mistakes.len());
        assert_eq!(context.current_session().unwrap().words_spoken, 9);
    }

    #[tokio::test]
    async fn test_submit_utterance_without_session() {
        let context = context();
        let result = context
            .submit_utterance(&utterance(), None, &CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(PracticeError::Session(SessionError::NoActiveSession))
        ));
    }

    #[tokio::test]
    async fn test_submit_empty_audio_is_rejected_before_network() {
        let context = context();
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();

        let result = context
            .submit_utterance(&AudioBuffer::new(16_000, 1), None, &cancel)
            .await;
        assert!(matches!(result, Err(PracticeError::Audio(AudioError::Empty))));
        assert_eq!(
            context.client().success_count(client::Operation::AnalyzeSpeech),
            0
        );
    }

    #[tokio::test]
    async fn test_send_message_builds_history() {
        let context = context();
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();

        context.send_message("A large coffee, please", &cancel).await.unwrap();
        context.send_message("Black, please", &cancel).await.unwrap();

        let turns = context.conversation();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].message, "A large coffee, please");
        assert_eq!(turns[2].message, "Black, please");
    }

    #[tokio::test]
    async fn test_finish_practice_archives_and_returns_drills() {
        let context = context();
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();
        context.submit_utterance(&utterance(), None, &cancel).await.unwrap();
        context.send_message("Hello", &cancel).await.unwrap();

        let outcome = context.finish_practice(&cancel).await.unwrap();

        assert_eq!(outcome.session.status, SessionStatus::Completed);
        assert_eq!(outcome.summary.mistake_count, 1);
        assert_eq!(outcome.drills[0].target_words, vec!["coffee"]);
        assert!(context.current_session().is_none());
        assert!(context.conversation().is_empty());
        assert_eq!(context.history().len(), 1);
        assert_eq!(context.history_stats().total_mistakes, 1);
    }

    #[tokio::test]
    async fn test_finish_with_cancelled_token_still_archives() {
        let context = context();
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();

        cancel.cancel();
        let outcome = context.finish_practice(&cancel).await.unwrap();
        assert!(outcome.drills.is_empty());
        assert_eq!(context.history().len(), 1);
    }

    #[tokio::test]
    async fn test_abandon_practice_skips_history() {
        let context = context();
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();
        context.submit_utterance(&utterance(), None, &cancel).await.unwrap();

        context.abandon_practice().unwrap();
        assert!(context.current_session().is_none());
        assert!(context.history().is_empty());
        assert!(matches!(
            context.finish_practice(&cancel).await,
            Err(PracticeError::Session(SessionError::NoActiveSession))
        ));
    }

    #[test]
    fn test_from_config_wires_backend_and_policy() {
        let context = AppContext::from_config(AppConfig {
            mock_latency: false,
            abandon_policy: AbandonPolicy::Archive,
            ..AppConfig::default()
        });
        assert_eq!(context.client().backend_name(), "mock");
        assert_eq!(context.config().abandon_policy, AbandonPolicy::Archive);
    }

    #[test]
    fn test_demo_utterance_is_assembled_from_frames() {
        let audio = demo_utterance();
        assert_eq!(audio.samples.len(), 24_000);
        assert!((audio.effective_duration_secs() - 1.5).abs() < 1e-4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_for_replaced_session_is_dropped() {
        let context = delayed_context(MockDelays {
            reply: Duration::from_secs(2),
            ..MockDelays::zero()
        });
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();

        let (reply, restarted) = tokio::join!(
            context.send_message("A large coffee, please", &cancel),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                context.finish_practice(&cancel).await.unwrap();
                context
                    .start_practice("doctor-appointment", &user, &cancel)
                    .await
                    .unwrap()
            }
        );

        assert!(matches!(
            reply,
            Err(PracticeError::Session(SessionError::NoActiveSession))
        ));
        assert_eq!(context.current_session().unwrap().id, restarted.id);
        assert!(context.conversation().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_for_replaced_session_is_dropped() {
        let context = delayed_context(MockDelays {
            speech: Duration::from_secs(2),
            ..MockDelays::zero()
        });
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();

        let audio = utterance();
        let (analysis, _) = tokio::join!(
            context.submit_utterance(&audio, None, &cancel),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                context.finish_practice(&cancel).await.unwrap();
                context
                    .start_practice("doctor-appointment", &user, &cancel)
                    .await
                    .unwrap()
            }
        );

        assert!(matches!(
            analysis,
            Err(PracticeError::Session(SessionError::NoActiveSession))
        ));
        let current = context.current_session().unwrap();
        assert_eq!(current.scenario_id, "doctor-appointment");
        assert!(current.mistakes.is_empty());
        assert_eq!(current.words_spoken, 0);
        assert!(context.history()[0].mistakes.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reply_leaves_conversation_unchanged() {
        let context = AppContext::new(
            AppConfig::default(),
            Arc::new(ReplyOutageApi(MockPracticeApi::instant())),
        );
        let user = free_user(&context);
        let cancel = CancellationToken::new();
        context.start_practice("coffee-shop", &user, &cancel).await.unwrap();

        let result = context.send_message("A large coffee, please", &cancel).await;

        assert!(matches!(result, Err(PracticeError::Api(msg)) if msg == "HTTP 503: Character offline"));
        assert!(context.conversation().is_empty());
        assert_eq!(
            context.current_session().unwrap().status,
            SessionStatus::Active
        );
    }
}
