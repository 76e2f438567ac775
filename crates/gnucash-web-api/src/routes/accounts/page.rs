//! Accounts page rendering - Full page endpoints

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use gnucash_web_config::CurrencyConfig;
use gnucash_web_core::{get_top_level_accounts, time, with_book, BookStore};
use gnucash_web_utils::{account_path, escape_html, format_amount};
use rust_decimal::Decimal;

use super::api::{load_detail, load_summaries, AccountDetail, AccountSummary};
use crate::error::PageError;
use crate::routes::{fullname_from_path, BookQuery};
use crate::AppState;

fn amount(value: Decimal, currency: &CurrencyConfig) -> String {
    format_amount(value, currency.decimal_places, &currency.thousands_separator)
}

fn amount_class(value: Decimal) -> &'static str {
    if value.is_sign_negative() && !value.is_zero() {
        "text-red-600"
    } else {
        "text-gray-900"
    }
}

fn render_account_rows(accounts: &[AccountSummary], currency: &CurrencyConfig) -> String {
    if accounts.is_empty() {
        return "<tr><td colspan='3' class='px-4 py-6 text-center text-gray-400'>No accounts</td></tr>"
            .to_string();
    }

    accounts
        .iter()
        .map(|account| {
            let commodity = account.commodity.as_deref().unwrap_or("");
            format!(
                r#"<tr class='border-t hover:bg-gray-50'>
                <td class='px-4 py-2'><a href='{}' class='text-indigo-600 hover:text-indigo-800'>{}</a>{}</td>
                <td class='px-4 py-2 text-sm text-gray-500'>{}</td>
                <td class='px-4 py-2 text-right font-mono {}'>{} {}</td>
            </tr>"#,
                escape_html(&account_path(&account.fullname)),
                escape_html(&account.name),
                if account.placeholder {
                    " <span class='text-xs text-gray-400'>(placeholder)</span>"
                } else {
                    ""
                },
                account.account_type,
                amount_class(account.balance),
                amount(account.balance, currency),
                escape_html(commodity)
            )
        })
        .collect()
}

fn render_accounts_table(accounts: &[AccountSummary], currency: &CurrencyConfig) -> String {
    format!(
        r#"<div class='bg-white rounded-xl shadow-sm overflow-hidden'>
        <table class='w-full'>
            <thead class='bg-gray-50 text-left text-sm text-gray-500'>
                <tr><th class='px-4 py-2'>Account</th><th class='px-4 py-2'>Type</th><th class='px-4 py-2 text-right'>Balance</th></tr>
            </thead>
            <tbody>{}</tbody>
        </table>
    </div>"#,
        render_account_rows(accounts, currency)
    )
}

/// Breadcrumb links for every ancestor of the account
fn render_breadcrumb(fullname: &str) -> String {
    let mut crumbs = vec!["<a href='/accounts' class='text-indigo-600 hover:text-indigo-800'>Accounts</a>".to_string()];
    let segments: Vec<&str> = fullname.split(':').collect();
    for i in 0..segments.len() {
        let name = escape_html(segments[i]);
        if i + 1 == segments.len() {
            crumbs.push(format!("<span class='text-gray-600'>{}</span>", name));
        } else {
            let path = account_path(&segments[..=i].join(":"));
            crumbs.push(format!(
                "<a href='{}' class='text-indigo-600 hover:text-indigo-800'>{}</a>",
                escape_html(&path),
                name
            ));
        }
    }
    format!("<nav class='text-sm mb-4'>{}</nav>", crumbs.join(" / "))
}

fn render_budget_table(detail: &AccountDetail, currency: &CurrencyConfig) -> String {
    if detail.budget_amounts.is_empty() {
        return String::new();
    }

    let rows: String = detail
        .budget_amounts
        .iter()
        .map(|budget| {
            format!(
                "<tr class='border-t'><td class='px-4 py-2'>{}</td><td class='px-4 py-2'>{}</td><td class='px-4 py-2 text-right font-mono'>{}</td></tr>",
                escape_html(&budget.budget_name),
                budget.period_num + 1,
                amount(budget.amount, currency)
            )
        })
        .collect();

    format!(
        r#"<div class='bg-white rounded-xl shadow-sm overflow-hidden mt-6'>
        <h3 class='text-lg font-semibold px-4 pt-4'>Budgets</h3>
        <table class='w-full mt-2'>
            <thead class='bg-gray-50 text-left text-sm text-gray-500'>
                <tr><th class='px-4 py-2'>Budget</th><th class='px-4 py-2'>Period</th><th class='px-4 py-2 text-right'>Amount</th></tr>
            </thead>
            <tbody>{}</tbody>
        </table>
    </div>"#,
        rows
    )
}

fn render_account_detail(detail: &AccountDetail, currency: &CurrencyConfig) -> String {
    let account = &detail.account;
    let commodity = escape_html(account.commodity.as_deref().unwrap_or(""));
    let since = detail
        .month_start_balance_date
        .map(|date| format!("since {}", date))
        .unwrap_or_default();

    let description = if account.description.is_empty() {
        String::new()
    } else {
        format!("<p class='text-gray-500 mt-1'>{}</p>", escape_html(&account.description))
    };

    let children = if detail.children.is_empty() {
        String::new()
    } else {
        format!(
            "<h3 class='text-lg font-semibold mt-6 mb-2'>Subaccounts</h3>{}",
            render_accounts_table(&detail.children, currency)
        )
    };

    format!(
        r#"{}
    <div class='mb-6'><h2 class='text-2xl font-bold'>{}</h2>{}</div>
    <div class='grid grid-cols-2 gap-4'>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <p class='text-sm text-gray-500'>Balance</p>
            <p class='text-2xl font-mono {}'>{} {}</p>
        </div>
        <div class='bg-white rounded-xl shadow-sm p-6'>
            <p class='text-sm text-gray-500'>This month <span class='text-xs'>{}</span></p>
            <p class='text-2xl font-mono {}'>{} {}</p>
        </div>
    </div>
    {}
    {}"#,
        render_breadcrumb(&account.fullname),
        escape_html(&account.fullname),
        description,
        amount_class(detail.balance),
        amount(detail.balance, currency),
        commodity,
        since,
        amount_class(detail.total_in_current_month),
        amount(detail.total_in_current_month, currency),
        commodity,
        children,
        render_budget_table(detail, currency)
    )
}

/// Top-level accounts with their balances
pub async fn page_accounts<S: BookStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<BookQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let options = state.open_options(query.open_if_lock());
    let accounts = with_book(state.store.as_ref(), &options, |book| {
        Box::pin(async move {
            let accounts = get_top_level_accounts(book).await?;
            load_summaries(book, accounts).await
        })
    })
    .await
    .map_err(|error| PageError::new(error, "/accounts"))?;

    let inner_content = format!(
        "<div class='mb-6'><h2 class='text-2xl font-bold'>Accounts</h2></div>{}",
        render_accounts_table(&accounts, &state.config.currency)
    );
    Ok(Html(crate::page_response(&headers, "Accounts", "/accounts", &inner_content)))
}

pub async fn page_account_detail<S: BookStore>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    Query(query): Query<BookQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let fullname = fullname_from_path(&path);
    let retry_path = account_path(&fullname);
    let today = time::today();
    let options = state.open_options(query.open_if_lock());

    let detail = with_book(state.store.as_ref(), &options, move |book| {
        Box::pin(async move { load_detail(book, &fullname, today).await })
    })
    .await
    .map_err(|error| PageError::new(error, retry_path))?;

    let inner_content = render_account_detail(&detail, &state.config.currency);
    Ok(Html(crate::page_response(
        &headers,
        &escape_html(&detail.account.name),
        "/accounts",
        &inner_content,
    )))
}
