//! Conversation log and per-page conversation storage.
//!
//! Each open chat page owns one [`Conversation`]: an append-only, ordered log
//! of [`ConversationEntry`] values. The page is a projection of that log.
//!
//! # Architecture
//!
//! - [`ConversationEntry`] / [`Role`]: one tagged line of the chat
//! - [`ConversationLog`]: ordering rules (replies sit right after their query)
//! - [`ConversationStore`]: thread-safe store of open conversations
//!
//! # Example
//!
//! ```rust
//! use query_chat::conversation::{ConversationStore, Role};
//!
//! let store = ConversationStore::new();
//! let conversation = store.create();
//! let seq = conversation.append_query("Hello!");
//! conversation.insert_reply(seq, Role::Bot, "Hi!").unwrap();
//!
//! assert_eq!(conversation.len(), 2);
//! ```

mod entry;
mod log;
mod store;

pub use entry::{ConversationEntry, Role, SequenceId};
pub use log::{ConversationLog, LogError};
pub use store::{Conversation, ConversationStore, DEFAULT_IDLE_TIMEOUT};
