//! About page

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Html;
use gnucash_web_core::BookStore;
use gnucash_web_utils::escape_html;

use crate::AppState;

pub async fn page_about<S: BookStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Html<String> {
    let config = &state.config;

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>About</h2></div>
        <div class='bg-white rounded-xl shadow-sm p-6 mb-6'>
            <p>GnuCash Web shows the accounts, balances and budgets of a GnuCash book.</p>
            <div class='grid grid-cols-2 gap-4 mt-4'>
                <div><p class='text-sm text-gray-500'>Version</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Book</p><p class='font-medium'>{}</p></div>
                <div><p class='text-sm text-gray-500'>Read-only</p><p class='font-medium'>{}</p></div>
            </div>
        </div>"#,
        env!("CARGO_PKG_VERSION"),
        escape_html(&config.book_location().to_string()),
        if config.database.readonly { "yes" } else { "no" }
    );

    Html(crate::page_response(&headers, "About", "/about", &inner_content))
}
