use crate::models::{PronunciationMistake, Scenario, Session, SessionStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub mod conversation;
pub mod progress;

pub use conversation::Conversation;
pub use progress::{HistoryStats, SessionSummary, WordCount};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active session")]
    NoActiveSession,
}

/// What `start_session` does with a session that was never ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbandonPolicy {
    /// Drop it without a trace
    #[default]
    Discard,
    /// Move it to history with status `abandoned`
    Archive,
}

/// In-memory record of the practice session in progress and the ones before it.
///
/// Holds at most one live (active or paused) session. Every mutation goes
/// through the methods below; nothing persists across restarts.
#[derive(Debug, Default)]
pub struct SessionStore {
    current_session: Option<Session>,
    current_scenario: Option<Scenario>,
    is_recording: bool,
    history: Vec<Session>,
    abandon_policy: AbandonPolicy,
}

impl SessionStore {
    pub fn new(abandon_policy: AbandonPolicy) -> Self {
        Self {
            abandon_policy,
            ..Self::default()
        }
    }

    pub fn start_session(&mut self, scenario: Scenario, user_id: &str) -> &Session {
        if let Some(mut previous) = self.current_session.take() {
            match self.abandon_policy {
                AbandonPolicy::Discard => {
                    tracing::warn!(
                        "Discarding unfinished session {} ({} mistakes)",
                        previous.id,
                        previous.mistakes.len()
                    );
                }
                AbandonPolicy::Archive => {
                    tracing::info!("Archiving unfinished session {} as abandoned", previous.id);
                    previous.status = SessionStatus::Abandoned;
                    previous.completed_at = Some(Utc::now());
                    self.history.insert(0, previous);
                }
            }
        }

        let session = Session {
            id: crate::util::generate_id("session"),
            scenario_id: scenario.id.clone(),
            user_id: user_id.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            status: SessionStatus::Active,
            mistakes: Vec::new(),
            words_spoken: 0,
        };

        tracing::info!(
            "Started session {} for scenario '{}' (user {})",
            session.id,
            scenario.id,
            user_id
        );

        self.current_scenario = Some(scenario);
        self.is_recording = false;
        self.current_session.insert(session)
    }

    /// Complete the current session and move it to the front of history
    pub fn end_session(&mut self) -> Option<&Session> {
        let mut session = self.current_session.take()?;
        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now());

        tracing::info!(
            "Session {} completed: {} mistakes, {} words",
            session.id,
            session.mistakes.len(),
            session.words_spoken
        );

        self.current_scenario = None;
        self.is_recording = false;
        self.add_to_history(session);
        self.history.first()
    }

    pub fn pause_session(&mut self) {
        self.set_status(SessionStatus::Paused);
        self.is_recording = false;
    }

    pub fn resume_session(&mut self) {
        self.set_status(SessionStatus::Active);
    }

    fn set_status(&mut self, status: SessionStatus) {
        if let Some(session) = self.current_session.as_mut() {
            tracing::debug!(
                "Session {}: {} -> {}",
                session.id,
                session.status.as_str(),
                status.as_str()
            );
            session.status = status;
        }
    }

    pub fn add_mistake(&mut self, mistake: PronunciationMistake) -> Result<(), SessionError> {
        let Some(session) = self.current_session.as_mut() else {
            tracing::warn!("Dropping mistake on '{}': no active session", mistake.word);
            return Err(SessionError::NoActiveSession);
        };

        tracing::debug!(
            "Session {}: mistake on '{}' ({:?})",
            session.id,
            mistake.word,
            mistake.severity
        );
        session.mistakes.push(mistake);
        Ok(())
    }

    pub fn record_words(&mut self, count: u32) -> Result<(), SessionError> {
        let session = self
            .current_session
            .as_mut()
            .ok_or(SessionError::NoActiveSession)?;
        session.words_spoken = session.words_spoken.saturating_add(count);
        Ok(())
    }

    pub fn set_recording(&mut self, is_recording: bool) {
        self.is_recording = is_recording;
    }

    /// Drop the current session without archiving it
    pub fn clear_session(&mut self) {
        if let Some(session) = self.current_session.take() {
            tracing::info!("Cleared session {} without archiving", session.id);
        }
        self.current_scenario = None;
        self.is_recording = false;
    }

    pub fn add_to_history(&mut self, session: Session) {
        self.history.insert(0, session);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current_session.as_ref()
    }

    pub fn current_scenario(&self) -> Option<&Scenario> {
        self.current_scenario.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn mistakes(&self) -> &[PronunciationMistake] {
        self.current_session
            .as_ref()
            .map(|session| session.mistakes.as_slice())
            .unwrap_or(&[])
    }

    /// Finished sessions, newest first
    pub fn history(&self) -> &[Session] {
        &self.history
    }
}
