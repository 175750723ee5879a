use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::backend::HttpQueryClient;
use crate::config::AppConfig;
use crate::controller::ChatController;
use crate::conversation::{ConversationEntry, ConversationStore, LogError, SequenceId};
use crate::ui::{PageOptions, chat_page, entry_html, submitted_html};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let backend = HttpQueryClient::new(&config.backend.base_url)?;
    info!(
        name: "backend.config.loaded",
        endpoint = %backend.endpoint(),
        "Backend configuration loaded"
    );

    let conversations = ConversationStore::new();
    conversations.spawn_expiry_sweeper(
        config.conversation.idle_timeout(),
        config.conversation.sweep_interval(),
    );

    let state = AppState {
        conversations,
        controller: ChatController::new(Arc::new(backend)),
        ui: Arc::new(config.ui.clone()),
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.ui.static_dir);

    Router::new()
        // HTML pages
        .route("/", get(index_handler))
        .route("/c/{id}", get(conversation_handler))
        // HTMX fragments
        .route("/chat/submit", post(submit_handler))
        .route("/chat/{id}/replies/{seq}", get(reply_handler))
        // JSON API
        .route("/api/conversations/{id}/entries", get(api_get_entries))
        // Static assets
        .nest_service("/static", static_dir)
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Handler failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("conversation {0} not found")]
    ConversationNotFound(String),

    #[error("query {seq} not found in conversation {conversation_id}")]
    QueryNotFound {
        conversation_id: String,
        seq: SequenceId,
    },

    #[error(transparent)]
    Log(#[from] LogError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ConversationNotFound(_) | Self::QueryNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Log(_) => StatusCode::CONFLICT,
        };
        tracing::debug!(status = %status, error = %self, "Request rejected");
        (status, self.to_string()).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

fn render_page(
    state: &AppState,
    conversation_id: &str,
    entries: &[ConversationEntry],
) -> Html<String> {
    let options = PageOptions {
        title: &state.ui.title,
        htmx_src: &state.ui.htmx_src,
    };
    Html(chat_page(&options, conversation_id, entries))
}

/// GET / - Page for a new conversation.
///
/// Only the id is minted here; the conversation is stored on its first
/// query.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    render_page(&state, &ConversationStore::new_id(), &[])
}

/// GET /c/:id - Re-render an existing conversation.
async fn conversation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.conversations.get(&id) {
        Some(conversation) => {
            render_page(&state, conversation.id(), &conversation.entries()).into_response()
        }
        None => Redirect::to("/").into_response(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body posted by `#query-form`.
#[derive(Debug, Deserialize)]
struct SubmitForm {
    conversation_id: String,
    #[serde(default)]
    query: String,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// POST /chat/submit - Accept a query.
///
/// HTMX callers get the user entry plus a reply placeholder right away, while
/// the backend call runs on its own task. Plain form posts wait for the reply
/// and are redirected back to the conversation page. The conversation is
/// created by its first non-empty query.
async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SubmitForm>,
) -> Result<Response, ApiError> {
    let mut input = form.query;

    if input.trim().is_empty() {
        if is_htmx(&headers) {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
        let location = state
            .conversations
            .get(&form.conversation_id)
            .map_or_else(|| "/".to_string(), |c| format!("/c/{}", c.id()));
        return Ok(Redirect::to(&location).into_response());
    }

    let conversation = state
        .conversations
        .open(&form.conversation_id)
        .ok_or_else(|| ApiError::ConversationNotFound(form.conversation_id.clone()))?;

    if !is_htmx(&headers) {
        state
            .controller
            .submit_and_wait(&conversation, &mut input)
            .await?;
        return Ok(Redirect::to(&format!("/c/{}", conversation.id())).into_response());
    }

    let Some(pending) = state.controller.submit(&conversation, &mut input) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let user_entry = conversation
        .query_for(pending.seq)
        .ok_or_else(|| ApiError::QueryNotFound {
            conversation_id: pending.conversation_id.clone(),
            seq: pending.seq,
        })?;

    // Detached: the call runs to completion even if the page goes away.
    // Failures are logged by the task itself.
    drop(state.controller.dispatch(conversation.clone(), pending));

    Ok(Html(submitted_html(conversation.id(), &user_entry)).into_response())
}

/// GET /chat/:id/replies/:seq - Wait for a reply and render it.
async fn reply_handler(
    State(state): State<AppState>,
    Path((id, seq)): Path<(String, SequenceId)>,
) -> Result<Html<String>, ApiError> {
    let conversation = state
        .conversations
        .get(&id)
        .ok_or_else(|| ApiError::ConversationNotFound(id.clone()))?;

    let reply = conversation
        .wait_for_reply(seq)
        .await
        .ok_or(ApiError::QueryNotFound {
            conversation_id: id,
            seq,
        })?;

    Ok(Html(entry_html(&reply)))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/conversations/:id/entries - Conversation log as JSON.
async fn api_get_entries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ConversationEntry>>, ApiError> {
    state
        .conversations
        .get(&id)
        .map(|conversation| Json(conversation.entries()))
        .ok_or(ApiError::ConversationNotFound(id))
}
