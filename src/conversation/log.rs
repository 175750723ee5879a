//! Append-only conversation log.

use thiserror::Error;

use super::entry::{ConversationEntry, Role, SequenceId};

/// Errors raised when a reply cannot be placed in the log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    /// No user entry carries this sequence id.
    #[error("no query with sequence id {0}")]
    UnknownSequence(SequenceId),
    /// The query already has its reply.
    #[error("query {0} already has a reply")]
    AlreadyAnswered(SequenceId),
    /// Replies must be tagged `bot` or `error`.
    #[error("a reply cannot be tagged as a user entry")]
    NotAReply,
}

/// Ordered log of entries for one conversation.
///
/// User entries are kept in submission order. Each reply is inserted directly
/// after the user entry it answers, so a slow reply never lands below a later
/// query. Nothing is ever edited or removed.
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
    last_seq: SequenceId,
}

impl ConversationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user entry and return its sequence id.
    pub fn append_query(&mut self, text: impl Into<String>) -> SequenceId {
        self.last_seq += 1;
        let seq = self.last_seq;
        self.entries
            .push(ConversationEntry::new(seq, Role::User, text));
        seq
    }

    /// Place the reply for `seq` right after its user entry.
    pub fn insert_reply(
        &mut self,
        seq: SequenceId,
        role: Role,
        text: impl Into<String>,
    ) -> Result<ConversationEntry, LogError> {
        if !role.is_reply() {
            return Err(LogError::NotAReply);
        }

        let position = self
            .entries
            .iter()
            .position(|e| e.seq == seq && e.role == Role::User)
            .ok_or(LogError::UnknownSequence(seq))?;

        if self
            .entries
            .get(position + 1)
            .is_some_and(|next| next.seq == seq)
        {
            return Err(LogError::AlreadyAnswered(seq));
        }

        let entry = ConversationEntry::new(seq, role, text);
        self.entries.insert(position + 1, entry.clone());
        Ok(entry)
    }

    /// The user entry for `seq`.
    #[must_use]
    pub fn query_for(&self, seq: SequenceId) -> Option<&ConversationEntry> {
        self.entries
            .iter()
            .find(|e| e.seq == seq && e.role == Role::User)
    }

    /// The reply for `seq`, if it has arrived.
    #[must_use]
    pub fn reply_for(&self, seq: SequenceId) -> Option<&ConversationEntry> {
        self.entries
            .iter()
            .find(|e| e.seq == seq && e.role.is_reply())
    }

    /// Sequence ids whose replies are still outstanding.
    #[must_use]
    pub fn pending(&self) -> Vec<SequenceId> {
        self.entries
            .iter()
            .filter(|e| e.role == Role::User && self.reply_for(e.seq).is_none())
            .map(|e| e.seq)
            .collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
