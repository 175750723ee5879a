//! HTML fragments swapped into `#chat-container` by HTMX.

use crate::conversation::{ConversationEntry, Role, SequenceId};

/// Escape text for use in element content and quoted attributes.
#[must_use]
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// URL the placeholder for `seq` polls for its reply.
#[must_use]
pub fn reply_url(conversation_id: &str, seq: SequenceId) -> String {
    format!("/chat/{conversation_id}/replies/{seq}")
}

/// One rendered log line.
#[must_use]
pub fn entry_html(entry: &ConversationEntry) -> String {
    format!(
        r#"<div class="{class}" data-seq="{seq}" data-role="{role}">{text}</div>"#,
        class = entry.role.css_class(),
        seq = entry.seq,
        role = role_name(entry.role),
        text = html_escape(&entry.text),
    )
}

/// Placeholder that fetches the reply as soon as it is swapped in, then
/// replaces itself with it. It sits directly after its user entry.
#[must_use]
pub fn pending_html(conversation_id: &str, seq: SequenceId) -> String {
    format!(
        r#"<div class="pending-message" data-seq="{seq}" aria-busy="true" hx-get="{url}" hx-trigger="load" hx-swap="outerHTML">&hellip;</div>"#,
        url = html_escape(&reply_url(conversation_id, seq)),
    )
}

/// Response to an accepted submission: the user entry plus its placeholder.
#[must_use]
pub fn submitted_html(conversation_id: &str, user_entry: &ConversationEntry) -> String {
    let mut html = entry_html(user_entry);
    html.push_str(&pending_html(conversation_id, user_entry.seq));
    html
}

/// Render a whole log, with placeholders for replies still outstanding.
#[must_use]
pub fn log_html(conversation_id: &str, entries: &[ConversationEntry]) -> String {
    let mut html = String::new();
    for (i, entry) in entries.iter().enumerate() {
        html.push_str(&entry_html(entry));
        let answered = entries
            .get(i + 1)
            .is_some_and(|next| next.seq == entry.seq && next.role.is_reply());
        if entry.role == Role::User && !answered {
            html.push_str(&pending_html(conversation_id, entry.seq));
        }
    }
    html
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Bot => "bot",
        Role::Error => "error",
    }
}
