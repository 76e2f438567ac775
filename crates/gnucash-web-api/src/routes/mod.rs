//! Route modules for the API server
//!
//! - accounts: account list and account detail, as pages and as JSON
//! - about: about page
//!
//! Each book-reading module has:
//! - api.rs: JSON API endpoints
//! - page.rs: HTML page rendering

pub mod about;
pub mod accounts;

use gnucash_web_utils::parse_flag;
use serde::Deserialize;

/// Query parameters understood by every route that opens the book
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    #[serde(default)]
    pub open_if_lock: Option<String>,
}

impl BookQuery {
    /// Whether the request asks to open a locked book anyway
    pub fn open_if_lock(&self) -> bool {
        self.open_if_lock.as_deref().map(parse_flag).unwrap_or(false)
    }
}

/// Account full name from the wildcard part of an `/accounts/...` path
pub fn fullname_from_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(":")
}
