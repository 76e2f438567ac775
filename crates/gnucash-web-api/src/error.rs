//! Error types for gnucash-web-api
//!
//! [`ApiError`] answers JSON routes, [`PageError`] renders an HTML page.
//! Both use the same status codes.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use gnucash_web_core::CoreError;
use gnucash_web_utils::escape_html;
use thiserror::Error;

/// HTTP status for a core error
pub fn status_for(error: &CoreError) -> StatusCode {
    match error {
        CoreError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::DatabaseLocked => StatusCode::LOCKED,
        CoreError::AccessDenied => StatusCode::FORBIDDEN,
        CoreError::Store(_) | CoreError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log_error(error: &CoreError) {
    let status = status_for(error);
    if status.is_server_error() {
        log::error!("[{}] {}", error.code(), error.to_details());
    } else {
        log::info!("{} [{}] {}", status.as_u16(), error.code(), error);
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Core(error) = self;
        log_error(&error);
        (status_for(&error), Json(error.to_details())).into_response()
    }
}

/// An error shown as a full HTML page
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PageError {
    pub error: CoreError,
    /// Page to retry with `open_if_lock=true` when the book is locked
    pub retry_path: String,
}

impl PageError {
    pub fn new(error: CoreError, retry_path: impl Into<String>) -> Self {
        Self {
            error,
            retry_path: retry_path.into(),
        }
    }

    fn body(&self) -> String {
        match &self.error {
            CoreError::AccountNotFound { name } => format!(
                r#"<h2 class="text-xl font-bold text-gray-600">Account not found</h2>
                <p class="text-gray-400 mt-2">There is no account named <span class="font-medium">{}</span> in this book.</p>
                <p class="mt-4"><a href="/accounts" class="text-indigo-600 hover:text-indigo-800">Back to accounts</a></p>"#,
                escape_html(name)
            ),
            CoreError::DatabaseLocked => format!(
                r#"<h2 class="text-xl font-bold text-gray-600">The book is locked</h2>
                <p class="text-gray-400 mt-2">Another session, probably GnuCash itself, has the book open.</p>
                <p class="mt-4"><a href="{}?open_if_lock=true" class="px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700">Open anyway</a></p>"#,
                escape_html(&self.retry_path)
            ),
            CoreError::AccessDenied => r#"<h2 class="text-xl font-bold text-gray-600">Access denied</h2>
                <p class="text-gray-400 mt-2">The book could not be opened with the configured credentials.</p>"#
                .to_string(),
            other => format!(
                r#"<h2 class="text-xl font-bold text-gray-600">Something went wrong</h2>
                <p class="text-gray-400 mt-2">{}</p>"#,
                escape_html(&other.to_string())
            ),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        log_error(&self.error);
        let status = status_for(&self.error);
        let content = format!(r#"<div class="text-center py-12">{}</div>"#, self.body());
        let title = status.canonical_reason().unwrap_or("Error");
        (status, Html(crate::base_html(title, &content))).into_response()
    }
}
