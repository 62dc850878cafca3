use crate::models::{Session, SessionStatus, Severity};
use crate::util::calculate_accuracy;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;

/// Results card shown when a practice session ends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub scenario_id: String,
    pub mistake_count: usize,
    pub low_count: usize,
    pub medium_count: usize,
    pub high_count: usize,
    /// Distinct mistaken words in first-seen order
    pub mistaken_words: Vec<String>,
    pub duration_secs: i64,
    pub accuracy_pct: u32,
}

impl SessionSummary {
    pub fn from_session(session: &Session) -> Self {
        let count = |severity: Severity| {
            session
                .mistakes
                .iter()
                .filter(|m| m.severity == severity)
                .count()
        };

        let mut mistaken_words: Vec<String> = Vec::new();
        for mistake in &session.mistakes {
            if !mistaken_words.contains(&mistake.word) {
                mistaken_words.push(mistake.word.clone());
            }
        }

        let end = session.completed_at.unwrap_or_else(Utc::now);
        let duration_secs = (end - session.started_at).num_seconds().max(0);

        Self {
            session_id: session.id.clone(),
            scenario_id: session.scenario_id.clone(),
            mistake_count: session.mistakes.len(),
            low_count: count(Severity::Low),
            medium_count: count(Severity::Medium),
            high_count: count(Severity::High),
            mistaken_words,
            duration_secs,
            accuracy_pct: calculate_accuracy(
                session.mistakes.len(),
                session.words_spoken as usize,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u32,
}

/// Aggregates over session history for the dashboard and profile
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub total_mistakes: usize,
    pub total_minutes: f32,
    pub most_missed_words: Vec<WordCount>,
}

impl HistoryStats {
    const TOP_WORDS: usize = 5;

    pub fn from_history(history: &[Session]) -> Self {
        let completed_sessions = history
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .count();

        let total_secs: i64 = history
            .iter()
            .filter_map(|s| s.completed_at.map(|end| (end - s.started_at).num_seconds().max(0)))
            .sum();

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for mistake in history.iter().flat_map(|s| s.mistakes.iter()) {
            *counts.entry(mistake.word.as_str()).or_insert(0) += 1;
        }

        let mut most_missed_words: Vec<WordCount> = counts
            .into_iter()
            .map(|(word, count)| WordCount {
                word: word.to_string(),
                count,
            })
            .collect();
        most_missed_words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
        most_missed_words.truncate(Self::TOP_WORDS);

        Self {
            total_sessions: history.len(),
            completed_sessions,
            total_mistakes: history.iter().map(|s| s.mistakes.len()).sum(),
            total_minutes: total_secs as f32 / 60.0,
            most_missed_words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PronunciationMistake;
    use chrono::Duration;

    fn mistake(word: &str, severity: Severity) -> PronunciationMistake {
        PronunciationMistake {
            id: format!("mistake-{}", word),
            word: word.to_string(),
            expected_phoneme: String::new(),
            actual_phoneme: String::new(),
            timestamp: 0.0,
            severity,
        }
    }

    fn finished(words: &[&str], minutes: i64, status: SessionStatus) -> Session {
        let started_at = Utc::now() - Duration::minutes(minutes);
        Session {
            id: "s".to_string(),
            scenario_id: "coffee-shop".to_string(),
            user_id: "u1".to_string(),
            started_at,
            completed_at: Some(started_at + Duration::minutes(minutes)),
            status,
            mistakes: words.iter().map(|w| mistake(w, Severity::Low)).collect(),
            words_spoken: 10,
        }
    }

    #[test]
    fn test_summary_counts_and_accuracy() {
        let mut session = finished(&[], 2, SessionStatus::Completed);
        session.mistakes = vec![
            mistake("coffee", Severity::Medium),
            mistake("latte", Severity::High),
            mistake("coffee", Severity::Low),
        ];

        let summary = SessionSummary::from_session(&session);
        assert_eq!(summary.mistake_count, 3);
        assert_eq!((summary.low_count, summary.medium_count, summary.high_count), (1, 1, 1));
        assert_eq!(summary.mistaken_words, vec!["coffee", "latte"]);
        assert_eq!(summary.duration_secs, 120);
        assert_eq!(summary.accuracy_pct, 70);
    }

    #[test]
    fn test_history_stats() {
        let history = vec![
            finished(&["coffee", "latte"], 5, SessionStatus::Completed),
            finished(&["coffee"], 3, SessionStatus::Abandoned),
            finished(&["think"], 4, SessionStatus::Completed),
        ];

        let stats = HistoryStats::from_history(&history);
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.completed_sessions, 2);
        assert_eq!(stats.total_mistakes, 4);
        assert!((stats.total_minutes - 12.0).abs() < 0.01);
        assert_eq!(
            stats.most_missed_words[0],
            WordCount {
                word: "coffee".to_string(),
                count: 2
            }
        );
        assert_eq!(stats.most_missed_words[1].word, "latte");
    }

    #[test]
    fn test_history_stats_empty() {
        assert_eq!(HistoryStats::from_history(&[]), HistoryStats::default());
    }
}
