//! Full chat page.

use crate::conversation::ConversationEntry;

use super::fragments::{html_escape, log_html};

/// Values the page shell is rendered with.
#[derive(Debug, Clone)]
pub struct PageOptions<'a> {
    /// Document title and header text.
    pub title: &'a str,
    /// Script URL for the HTMX bundle.
    pub htmx_src: &'a str,
}

/// Render the page for a conversation.
///
/// The document exposes the three elements the chat relies on:
/// `#query-form`, `#query-input` and the scrollable `#chat-container`.
#[must_use]
pub fn chat_page(
    options: &PageOptions<'_>,
    conversation_id: &str,
    entries: &[ConversationEntry],
) -> String {
    let title = html_escape(options.title);
    let htmx_src = html_escape(options.htmx_src);
    let conversation_id_attr = html_escape(conversation_id);
    let log = log_html(conversation_id, entries);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <script src="{htmx_src}"></script>
    <link rel="stylesheet" href="/static/chat.css">
</head>
<body>
    <main class="chat">
        <header class="chat-header"><h1>{title}</h1></header>

        <div id="chat-container" class="chat-log" aria-live="polite" aria-label="Chat messages">{log}</div>

        <form
            id="query-form"
            class="chat-form"
            method="post"
            action="/chat/submit"
            hx-post="/chat/submit"
            hx-target="#chat-container"
            hx-swap="beforeend scroll:bottom"
            hx-on::after-request="if (event.detail.xhr.status === 200) this.reset()"
        >
            <input type="hidden" name="conversation_id" value="{conversation_id_attr}">
            <input
                id="query-input"
                name="query"
                type="text"
                placeholder="Type your question..."
                autocomplete="off"
                autofocus
            >
            <button type="submit">Send</button>
        </form>
    </main>
</body>
</html>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationLog, Role};

    const OPTIONS: PageOptions<'static> = PageOptions {
        title: "Chat",
        htmx_src: "/static/vendor/htmx.min.js",
    };

    #[test]
    fn test_page_exposes_chat_elements() {
        let html = chat_page(&OPTIONS, "c-1", &[]);

        assert!(html.contains(r#"id="query-form""#));
        assert!(html.contains(r#"id="query-input""#));
        assert!(html.contains(r#"id="chat-container""#));
        assert!(html.contains(r#"name="conversation_id" value="c-1""#));
        assert!(html.contains(r#"<script src="/static/vendor/htmx.min.js"></script>"#));
    }

    #[test]
    fn test_form_targets_chat_container() {
        let html = chat_page(&OPTIONS, "c-1", &[]);

        assert!(html.contains(r##"hx-target="#chat-container""##));
        assert!(html.contains(r#"hx-swap="beforeend scroll:bottom""#));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_page_renders_existing_log() {
        let mut log = ConversationLog::new();
        let seq = log.append_query("hi");
        log.insert_reply(seq, Role::Bot, "hello").unwrap();

        let html = chat_page(&OPTIONS, "c-1", log.entries());
        let user = html.find(r#"class="user-message""#).unwrap();
        let bot = html.find(r#"class="bot-message""#).unwrap();
        assert!(user < bot);
        assert!(!html.contains("pending-message"));
    }

    #[test]
    fn test_title_is_escaped() {
        let options = PageOptions {
            title: "<Chat>",
            ..OPTIONS
        };
        let html = chat_page(&options, "c-1", &[]);
        assert!(html.contains("<title>&lt;Chat&gt;</title>"));
    }
}
