//! Conversation entries and their origin tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-conversation submission number.
///
/// A user entry and the reply it produced share the same sequence id.
pub type SequenceId = u64;

/// Origin of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user.
    User,
    /// Answer returned by the backend.
    Bot,
    /// Failure of the submission cycle.
    Error,
}

impl Role {
    /// CSS class used when the entry is rendered.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::User => "user-message",
            Self::Bot => "bot-message",
            Self::Error => "error-message",
        }
    }

    /// Whether this role answers a user entry.
    #[must_use]
    pub fn is_reply(self) -> bool {
        !matches!(self, Self::User)
    }
}

/// One line of the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Submission this entry belongs to.
    pub seq: SequenceId,
    /// Who produced the entry.
    pub role: Role,
    /// Displayed text.
    pub text: String,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub(crate) fn new(seq: SequenceId, role: Role, text: impl Into<String>) -> Self {
        Self {
            seq,
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Bot).unwrap(), "\"bot\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"error\"").unwrap(),
            Role::Error
        );
    }

    #[test]
    fn test_role_css_class() {
        assert_eq!(Role::User.css_class(), "user-message");
        assert_eq!(Role::Bot.css_class(), "bot-message");
        assert_eq!(Role::Error.css_class(), "error-message");
        assert!(!Role::User.is_reply());
        assert!(Role::Error.is_reply());
    }
}
