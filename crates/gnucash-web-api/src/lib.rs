//! HTTP server with HTML pages and a JSON API over a GnuCash book
//!
//! Routes are organized into modules:
//! - routes::accounts: account list and account detail
//! - routes::about: version and book information
//!
//! Every request opens the book, reads what it needs and closes it again.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use gnucash_web_config::Config;
use gnucash_web_core::{BookStore, OpenOptions};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::{ApiError, PageError};

/// Application state
pub struct AppState<S> {
    pub store: Arc<S>,
    pub config: Arc<Config>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: BookStore> AppState<S> {
    pub fn new(config: Config, store: S) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Options for opening the configured book for one request
    pub fn open_options(&self, open_if_lock: bool) -> OpenOptions {
        OpenOptions::from_config(&self.config).open_if_lock(open_if_lock)
    }
}

/// Create the application router
pub fn create_router<S: BookStore>(state: AppState<S>) -> Router {
    use routes::about::page_about;
    use routes::accounts::{api_account_detail, api_accounts, page_account_detail, page_accounts};

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/accounts", get(api_accounts::<S>))
        .route("/accounts/*fullname", get(api_account_detail::<S>))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(|| async { Redirect::to("/accounts") }))
        .route("/accounts", get(page_accounts::<S>))
        .route("/accounts/*fullname", get(page_account_detail::<S>))
        .route("/about", get(page_about::<S>))
        .nest("/api", api)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - GnuCash Web</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        title, content
    )
}

/// Navigation sidebar
pub fn nav_sidebar(current_path: &str) -> String {
    let links = [("/accounts", "Accounts"), ("/about", "About")];

    let mut nav = String::from("<div class='bg-white border-r h-screen flex flex-col'><div class='p-4 border-b'><h1 class='text-xl font-bold text-indigo-600'>GnuCash Web</h1></div><ul class='flex-1 py-2 space-y-1 px-2'>");
    for (path, label) in &links {
        let active_class = if current_path.starts_with(path) {
            "bg-indigo-50 text-indigo-600"
        } else {
            "text-gray-600 hover:bg-gray-50"
        };
        nav.push_str(&format!(
            r#"<li><a href='{}' hx-get='{}' hx-target='main' hx-push-url='true' class='flex items-center gap-2 px-3 py-2 rounded-lg {}'><span>{}</span></a></li>"#,
            path, path, active_class, label
        ));
    }
    nav.push_str("</ul></div>");
    nav
}

/// Check if request is from HTMX (partial page update)
fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for full page or HTMX partial
pub fn page_response(
    headers: &HeaderMap,
    title: &str,
    current_path: &str,
    inner_content: &str,
) -> String {
    if is_htmx_request(headers) {
        inner_content.to_string()
    } else {
        base_html(
            title,
            &format!(
                r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <aside class='w-64 flex-shrink-0'>{}</aside>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
                nav_sidebar(current_path),
                inner_content
            ),
        )
    }
}

/// Start the HTTP server
///
/// Binds to the configured address and serves until the listener fails.
pub async fn start_server<S: BookStore>(config: Config, store: S) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Serving book {}", config.book_location());

    let router = create_router(AppState::new(config, store));
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting GnuCash Web on http://{}", addr);

    axum::serve(listener, router).await
}
