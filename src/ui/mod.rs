//! Display projection of the conversation log.
//!
//! The page is plain server-rendered HTML driven by HTMX. Nothing on the page
//! holds state of its own; every fragment is rendered from the log.
//!
//! # Structure
//!
//! - [`page`]: the full document (form, input, message container)
//! - [`fragments`]: entry lines and reply placeholders swapped into the page

pub mod fragments;
pub mod page;

pub use fragments::{entry_html, html_escape, log_html, pending_html, submitted_html};
pub use page::{PageOptions, chat_page};
