//! Conversation handles and the in-memory conversation store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::entry::{ConversationEntry, Role, SequenceId};
use super::log::{ConversationLog, LogError};

/// Default idle timeout (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// One open chat page.
///
/// Cloning is cheap; all clones share the same log.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

#[derive(Debug)]
struct ConversationInner {
    id: String,
    log: RwLock<ConversationLog>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
    /// Woken whenever a reply lands in the log.
    replied: Notify,
}

impl Conversation {
    fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(ConversationInner {
                id,
                log: RwLock::new(ConversationLog::new()),
                created_at: now,
                last_activity: RwLock::new(now),
                replied: Notify::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    fn log(&self) -> RwLockReadGuard<'_, ConversationLog> {
        self.inner.log.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn log_mut(&self) -> RwLockWriteGuard<'_, ConversationLog> {
        self.inner
            .log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a user entry, returning its sequence id.
    pub fn append_query(&self, text: impl Into<String>) -> SequenceId {
        let seq = self.log_mut().append_query(text);
        self.touch();
        seq
    }

    /// Insert the reply for `seq` and wake anyone waiting on it.
    pub fn insert_reply(
        &self,
        seq: SequenceId,
        role: Role,
        text: impl Into<String>,
    ) -> Result<ConversationEntry, LogError> {
        let entry = self.log_mut().insert_reply(seq, role, text)?;
        self.touch();
        self.inner.replied.notify_waiters();
        Ok(entry)
    }

    /// Snapshot of every entry in display order.
    #[must_use]
    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.log().entries().to_vec()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    #[must_use]
    pub fn query_for(&self, seq: SequenceId) -> Option<ConversationEntry> {
        self.log().query_for(seq).cloned()
    }

    #[must_use]
    pub fn reply_for(&self, seq: SequenceId) -> Option<ConversationEntry> {
        self.log().reply_for(seq).cloned()
    }

    #[must_use]
    pub fn pending(&self) -> Vec<SequenceId> {
        self.log().pending()
    }

    /// Wait until the reply for `seq` is in the log.
    ///
    /// Returns `None` when no query with that sequence id exists.
    pub async fn wait_for_reply(&self, seq: SequenceId) -> Option<ConversationEntry> {
        loop {
            // Registered before the check so a reply landing in between is not missed.
            let notified = self.inner.replied.notified();
            {
                let log = self.log();
                log.query_for(seq)?;
                if let Some(reply) = log.reply_for(seq) {
                    return Some(reply.clone());
                }
            }
            notified.await;
        }
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    /// Check if the conversation has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // A negative span means clock skew; treat it as fresh.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe store of open conversations.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<HashMap<String, Conversation>>>,
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Conversation>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Conversation>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh conversation id. Nothing is stored until [`Self::open`] is
    /// called with it.
    #[must_use]
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Create a conversation with a fresh id.
    #[must_use]
    pub fn create(&self) -> Conversation {
        let conversation = Conversation::new(Self::new_id());
        self.write()
            .insert(conversation.id().to_string(), conversation.clone());
        log_created(&conversation);
        conversation
    }

    /// Get the conversation for `id`, creating it on first use.
    ///
    /// Returns `None` when `id` is not a UUID. Ids are stored in their
    /// canonical hyphenated lowercase form.
    #[must_use]
    pub fn open(&self, id: &str) -> Option<Conversation> {
        let id = Uuid::parse_str(id).ok()?.to_string();
        let mut guard = self.write();
        if let Some(existing) = guard.get(&id) {
            return Some(existing.clone());
        }
        let conversation = Conversation::new(id.clone());
        guard.insert(id, conversation.clone());
        log_created(&conversation);
        Some(conversation)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Conversation> {
        self.write().remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Remove conversations idle longer than `timeout`.
    ///
    /// Returns the number of conversations removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|_, conversation| !conversation.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    /// Periodically drop idle conversations.
    pub fn spawn_expiry_sweeper(&self, idle_timeout: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = store.cleanup_expired_with_timeout(idle_timeout);
                if removed > 0 {
                    tracing::info!(
                        name: "conversation.expired",
                        removed,
                        remaining = store.len(),
                        "Expired idle conversations"
                    );
                }
            }
        })
    }
}

fn log_created(conversation: &Conversation) {
    tracing::debug!(
        name: "conversation.created",
        conversation_id = %conversation.id(),
        "Conversation created"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_lifecycle() {
        let store = ConversationStore::new();
        assert!(store.is_empty());

        let conversation = store.create();
        assert_eq!(store.len(), 1);
        assert!(conversation.is_empty());

        let seq = conversation.append_query("Hello");
        conversation.insert_reply(seq, Role::Bot, "Hi there!").unwrap();

        let retrieved = store.get(conversation.id()).unwrap();
        let entries = retrieved.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[1].role, Role::Bot);

        store.remove(conversation.id());
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = ConversationStore::new();
        let _ = store.create();
        std::thread::sleep(Duration::from_millis(20));
        let fresh = store.create();

        assert_eq!(
            store.cleanup_expired_with_timeout(Duration::from_millis(10)),
            1
        );
        assert_eq!(store.list_ids(), vec![fresh.id().to_string()]);
        assert_eq!(store.cleanup_expired_with_timeout(DEFAULT_IDLE_TIMEOUT), 0);
    }

    #[test]
    fn test_open_creates_once() {
        let store = ConversationStore::new();
        let id = ConversationStore::new_id();
        assert!(store.get(&id).is_none());

        let first = store.open(&id).unwrap();
        first.append_query("hi");
        let second = store.open(&id).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second.id(), id);
    }

    #[test]
    fn test_open_canonicalizes_and_rejects_non_uuid() {
        let store = ConversationStore::new();
        let upper = "67E55044-10B1-426F-9247-BB680E5FE0C8";

        let conversation = store.open(upper).unwrap();
        assert_eq!(conversation.id(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!(store.open("nope").is_none());
        assert!(store.open("").is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_reply_wakes_on_insert() {
        let store = ConversationStore::new();
        let conversation = store.create();
        let seq = conversation.append_query("q");

        let waiter = {
            let conversation = conversation.clone();
            tokio::spawn(async move { conversation.wait_for_reply(seq).await })
        };
        tokio::task::yield_now().await;
        conversation.insert_reply(seq, Role::Bot, "a").unwrap();

        let reply = waiter.await.unwrap().unwrap();
        assert_eq!(reply.text, "a");
        assert_eq!(reply.seq, seq);
    }

    #[tokio::test]
    async fn test_wait_for_unknown_reply() {
        let conversation = ConversationStore::new().create();
        assert!(conversation.wait_for_reply(42).await.is_none());
    }
}
