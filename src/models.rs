// models.rs
// Core data types shared by the session store and the practice API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    /// Replaced by a newer session before it was ended (archive policy only)
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

/// One practice attempt against a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub scenario_id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    #[serde(default)]
    pub mistakes: Vec<PronunciationMistake>,
    /// Transcript words recorded while the session was live
    #[serde(default)]
    pub words_spoken: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single detected deviation between expected and observed phonemes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationMistake {
    pub id: String,
    pub word: String,
    pub expected_phoneme: String,
    pub actual_phoneme: String,
    /// Offset in seconds within the utterance
    pub timestamp: f32,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(alias = "estimatedDuration")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub is_premium: bool,
}

impl Scenario {
    pub fn is_accessible_by(&self, user: &User) -> bool {
        !self.is_premium || user.is_premium()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillType {
    Pronunciation,
    Vocabulary,
    Conversation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drill {
    pub id: String,
    #[serde(rename = "type")]
    pub drill_type: DrillType,
    pub content: String,
    pub target_words: Vec<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Free,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_premium(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Premium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Character,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Speaker,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(status: SubscriptionStatus) -> User {
        User {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            subscription_status: status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_scenario_accepts_duration_alias() {
        let json = r#"{
            "id": "scenario-1",
            "title": "Coffee Shop Order",
            "description": "Practice ordering coffee",
            "difficulty": "beginner",
            "category": "Daily Life",
            "estimatedDuration": 5
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.estimated_minutes, 5);
        assert!(!scenario.is_premium, "Missing premium flag means free");
    }

    #[test]
    fn test_premium_gating() {
        let scenario = Scenario {
            id: "job-interview".to_string(),
            title: "Job Interview".to_string(),
            description: String::new(),
            difficulty: Difficulty::Intermediate,
            category: "Professional".to_string(),
            estimated_minutes: 10,
            is_premium: true,
        };

        assert!(!scenario.is_accessible_by(&user(SubscriptionStatus::Free)));
        assert!(scenario.is_accessible_by(&user(SubscriptionStatus::Premium)));
    }

    #[test]
    fn test_drill_type_field_name() {
        let drill = Drill {
            id: "drill-1".to_string(),
            drill_type: DrillType::Pronunciation,
            content: "Practice the th sound".to_string(),
            target_words: vec!["think".to_string()],
            difficulty: Difficulty::Beginner,
        };

        let value = serde_json::to_value(&drill).unwrap();
        assert_eq!(value["type"], "pronunciation");
        assert_eq!(value["targetWords"][0], "think");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
