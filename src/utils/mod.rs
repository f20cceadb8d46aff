//! Shared utility functions.
//!
//! - `slug`: Django-compatible slug generation
//! - `url`: source connection URL building and redaction

mod slug;
mod url;

pub use slug::slugify;
pub use url::{mysql_url, redact_url_password};
