use crate::models::{ConversationTurn, Speaker};

/// Running transcript of the user/character exchange in the current practice
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, message: impl Into<String>) {
        self.push(Speaker::User, message.into());
    }

    pub fn push_character(&mut self, message: impl Into<String>) {
        self.push(Speaker::Character, message.into());
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last_character_message(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == Speaker::Character)
            .map(|turn| turn.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    fn push(&mut self, role: Speaker, message: String) {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return;
        }
        self.turns.push(ConversationTurn {
            role,
            message: trimmed.to_string(),
        });
    }
}
