//! Accounts API endpoints - JSON responses

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use gnucash_web_core::{
    get_account, get_balance, get_budget_amounts, get_child_accounts, get_total_in_month_of,
    time, with_book, Account, AccountFilter, AccountType, Book, BookStore, BudgetAmount, CoreResult,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::{fullname_from_path, BookQuery};
use crate::AppState;

/// Account list item
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub fullname: String,
    pub name: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
    pub hidden: bool,
    pub placeholder: bool,
    pub balance: Decimal,
}

impl AccountSummary {
    fn new(account: Account, balance: Decimal) -> Self {
        Self {
            fullname: account.fullname,
            name: account.name,
            account_type: account.account_type,
            commodity: account.commodity,
            hidden: account.hidden,
            placeholder: account.placeholder,
            balance,
        }
    }
}

/// Everything shown for a single account
#[derive(Debug, Clone, Serialize)]
pub struct AccountDetail {
    pub account: Account,
    pub balance: Decimal,
    /// Change since `month_start_balance_date`
    pub total_in_current_month: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_start_balance_date: Option<NaiveDate>,
    pub children: Vec<AccountSummary>,
    pub budget_amounts: Vec<BudgetAmount>,
}

pub(crate) async fn load_summaries<B: Book>(
    book: &mut B,
    accounts: Vec<Account>,
) -> CoreResult<Vec<AccountSummary>> {
    let mut summaries = Vec::with_capacity(accounts.len());
    for account in accounts {
        let balance = get_balance(book, &account).await?;
        summaries.push(AccountSummary::new(account, balance));
    }
    Ok(summaries)
}

/// Detail of one account, with the month total taken relative to `today`
pub(crate) async fn load_detail<B: Book>(
    book: &mut B,
    fullname: &str,
    today: NaiveDate,
) -> CoreResult<AccountDetail> {
    let account = get_account(book, &AccountFilter::by_fullname(fullname)).await?;
    let balance = get_balance(book, &account).await?;
    let total_in_current_month = get_total_in_month_of(book, &account, today).await?;
    let children = get_child_accounts(book, &account).await?;
    let children = load_summaries(book, children).await?;
    let budget_amounts = get_budget_amounts(book, &account).await?;

    Ok(AccountDetail {
        account,
        balance,
        total_in_current_month,
        month_start_balance_date: time::previous_month_end(today),
        children,
        budget_amounts,
    })
}

/// All accounts with their balances, ordered by full name
pub async fn api_accounts<S: BookStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<BookQuery>,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    let options = state.open_options(query.open_if_lock());
    let summaries = with_book(state.store.as_ref(), &options, |book| {
        Box::pin(async move {
            let mut accounts = book.accounts().await?;
            accounts.sort_by(|a, b| a.fullname.cmp(&b.fullname));
            load_summaries(book, accounts).await
        })
    })
    .await?;
    Ok(Json(summaries))
}

pub async fn api_account_detail<S: BookStore>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    Query(query): Query<BookQuery>,
) -> Result<Json<AccountDetail>, ApiError> {
    let fullname = fullname_from_path(&path);
    let today = time::today();
    let options = state.open_options(query.open_if_lock());
    let detail = with_book(state.store.as_ref(), &options, move |book| {
        Box::pin(async move { load_detail(book, &fullname, today).await })
    })
    .await?;
    Ok(Json(detail))
}
