//! Query Chat
//!
//! A minimal chat front end for a question-answering backend. The user types a
//! question, it is appended to the conversation, posted to the backend's
//! `/query` endpoint, and the answer (or the failure) is appended below it.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server rendering HTML fragments for HTMX
//! - **Controller**: one submission cycle from form input to log entry
//! - **Backend client**: reqwest client for `POST /query`
//! - **UI**: server-rendered page projected from the conversation log
//!
//! # Modules
//!
//! - [`backend`]: `/query` wire types, client and failure taxonomy
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`controller`]: the chat submission cycle
//! - [`conversation`]: append-only conversation log and store
//! - [`server`]: routes and handlers
//! - [`ui`]: HTML rendering

pub mod backend;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod server;
pub mod ui;

use std::sync::Arc;

use crate::config::UiConfig;
use controller::ChatController;
use conversation::ConversationStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Open conversations, one per chat page.
    pub conversations: ConversationStore,
    /// Submission cycle driver.
    pub controller: ChatController,
    /// Page rendering settings.
    pub ui: Arc<UiConfig>,
}
