//! Chat UI controller: one submission cycle from form input to log entry.
//!
//! A cycle is split in two so the user entry can be shown before the backend
//! answers:
//!
//! 1. [`ChatController::submit`] trims the input, appends the `user` entry and
//!    clears the input. Empty input is ignored silently.
//! 2. [`ChatController::resolve`] sends the query and inserts exactly one `bot`
//!    or `error` entry right after the user entry.
//!
//! [`ChatController::dispatch`] runs step 2 on its own task so it always runs
//! to completion, and [`ChatController::submit_and_wait`] runs both inline.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend::{QueryBackend, QueryRequest};
use crate::conversation::{Conversation, ConversationEntry, LogError, Role, SequenceId};

/// Shown when the backend succeeds without an answer.
pub const FALLBACK_ANSWER: &str = "No response from the server.";

/// Prefix of every error entry.
pub const ERROR_PREFIX: &str = "Error: ";

/// A query whose user entry is in the log and whose reply is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub conversation_id: String,
    pub seq: SequenceId,
    pub query: String,
}

/// Drives submission cycles against a [`QueryBackend`].
#[derive(Clone)]
pub struct ChatController {
    backend: Arc<dyn QueryBackend>,
}

impl fmt::Debug for ChatController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatController").finish_non_exhaustive()
    }
}

impl ChatController {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    /// Accept the current input value.
    ///
    /// Returns `None` and leaves `input` untouched when it is empty after
    /// trimming. Otherwise the trimmed text is appended as a `user` entry and
    /// `input` is cleared.
    pub fn submit(&self, conversation: &Conversation, input: &mut String) -> Option<PendingQuery> {
        let query = input.trim();
        if query.is_empty() {
            return None;
        }
        let query = query.to_string();

        let seq = conversation.append_query(query.clone());
        input.clear();

        info!(
            name: "query.submitted",
            conversation_id = %conversation.id(),
            seq,
            "Query submitted"
        );
        debug!(conversation_id = %conversation.id(), seq, query = %query, "Query text");

        Some(PendingQuery {
            conversation_id: conversation.id().to_string(),
            seq,
            query,
        })
    }

    /// Send the query and insert its reply.
    pub async fn resolve(
        &self,
        conversation: &Conversation,
        pending: &PendingQuery,
    ) -> Result<ConversationEntry, LogError> {
        let request = QueryRequest::new(pending.query.clone());

        let (role, text) = match self.backend.query(&request).await {
            Ok(response) => {
                let text = response
                    .answer_text()
                    .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
                info!(
                    name: "query.answered",
                    conversation_id = %pending.conversation_id,
                    seq = pending.seq,
                    answer_length = text.len(),
                    "Query answered"
                );
                (Role::Bot, text)
            }
            Err(err) => {
                warn!(
                    name: "query.failed",
                    conversation_id = %pending.conversation_id,
                    seq = pending.seq,
                    kind = err.kind(),
                    error = %err,
                    "Query failed"
                );
                (Role::Error, format!("{ERROR_PREFIX}{err}"))
            }
        };

        conversation.insert_reply(pending.seq, role, text)
    }

    /// Resolve `pending` on a background task.
    ///
    /// A reply the log refuses is logged on the task, so callers may drop
    /// the handle.
    pub fn dispatch(
        &self,
        conversation: Conversation,
        pending: PendingQuery,
    ) -> JoinHandle<Result<ConversationEntry, LogError>> {
        let controller = self.clone();
        tokio::spawn(async move {
            let result = controller.resolve(&conversation, &pending).await;
            if let Err(err) = &result {
                error!(
                    name: "query.reply_rejected",
                    conversation_id = %pending.conversation_id,
                    seq = pending.seq,
                    error = %err,
                    "Reply could not be recorded"
                );
            }
            result
        })
    }

    /// Run a whole cycle inline.
    ///
    /// Returns `Ok(None)` when the input was empty.
    pub async fn submit_and_wait(
        &self,
        conversation: &Conversation,
        input: &mut String,
    ) -> Result<Option<ConversationEntry>, LogError> {
        match self.submit(conversation, input) {
            Some(pending) => self.resolve(conversation, &pending).await.map(Some),
            None => Ok(None),
        }
    }
}
