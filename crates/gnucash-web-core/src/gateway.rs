//! Book access gateway
//!
//! Opens books, turns store failures into [`CoreError`]s and provides the
//! lookups the web layer needs. Books are only handed out inside
//! [`with_book`], which closes them on every exit path.

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::model::{Account, AccountFilter, BudgetAmount};
use crate::store::{Book, BookStore, OpenOptions, StoreError};
use crate::time;

/// Store message fragment meaning another session holds the lock
const LOCK_INDICATOR: &str = "Lock on the file";
/// Store message fragment meaning the book is missing
const MISSING_INDICATOR: &str = "does not exist";
/// Driver message fragment meaning the login was refused
const ACCESS_DENIED_INDICATOR: &str = "Access denied";

/// Future returned by the body of [`with_book`]
pub type BookFuture<'b, T> = Pin<Box<dyn Future<Output = CoreResult<T>> + Send + 'b>>;

/// Translate a failure to open a book. First match wins.
pub fn map_open_error(error: StoreError) -> CoreError {
    match &error {
        StoreError::Gnucash { message } if message.contains(LOCK_INDICATOR) => {
            CoreError::DatabaseLocked
        }
        StoreError::Gnucash { message } if message.contains(MISSING_INDICATOR) => {
            CoreError::AccessDenied
        }
        StoreError::Connection { message } if message.contains(ACCESS_DENIED_INDICATOR) => {
            CoreError::AccessDenied
        }
        _ => CoreError::Store(error),
    }
}

/// Open a book with the store's failures translated.
///
/// The caller owns the returned handle and must close it; prefer
/// [`with_book`].
pub async fn open_book<S: BookStore>(store: &S, options: &OpenOptions) -> CoreResult<S::Book> {
    log::debug!(
        "Opening book {} (readonly={}, open_if_lock={})",
        options.location,
        options.readonly,
        options.open_if_lock
    );

    store.open(options).await.map_err(|error| {
        let mapped = map_open_error(error);
        match &mapped {
            CoreError::DatabaseLocked => {
                log::warn!("Book {} is locked by another session", options.location)
            }
            CoreError::AccessDenied => {
                log::warn!("Access to book {} was denied", options.location)
            }
            other => log::error!("Failed to open book {}: {}", options.location, other),
        }
        mapped
    })
}

/// Open a book, run `body` with it and close it again.
///
/// The book is closed exactly once, whether `body` succeeds or fails. An
/// error from `body` takes precedence over an error while closing.
///
/// ```ignore
/// let total = with_book(&store, &options, move |book| {
///     Box::pin(async move {
///         let account = get_account(book, &AccountFilter::by_fullname(name)).await?;
///         get_total_in_current_month(book, &account).await
///     })
/// })
/// .await?;
/// ```
pub async fn with_book<S, T, F>(store: &S, options: &OpenOptions, body: F) -> CoreResult<T>
where
    S: BookStore,
    T: Send,
    F: for<'b> FnOnce(&'b mut S::Book) -> BookFuture<'b, T> + Send,
{
    let mut book = open_book(store, options).await?;
    let outcome = body(&mut book).await;
    let closed = book.close().await;
    log::debug!("Closed book {}", options.location);

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_error)) => Err(CoreError::Store(close_error)),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(close_error)) => {
            log::error!(
                "Failed to close book {} after error '{}': {}",
                options.location,
                error,
                close_error
            );
            Err(error)
        }
    }
}

/// The single account matching `filter`
pub async fn get_account<B: Book>(book: &mut B, filter: &AccountFilter) -> CoreResult<Account> {
    let mut matches = book.find_accounts(filter).await?;
    match matches.len() {
        0 => Err(CoreError::AccountNotFound {
            name: filter.requested(),
        }),
        1 => Ok(matches.remove(0)),
        n => Err(CoreError::Store(StoreError::Query {
            message: format!("{} accounts match {}", n, filter),
        })),
    }
}

/// Direct children of `account`, sorted by name
pub async fn get_child_accounts<B: Book>(
    book: &mut B,
    account: &Account,
) -> CoreResult<Vec<Account>> {
    let mut children: Vec<Account> = book
        .accounts()
        .await?
        .into_iter()
        .filter(|a| a.parent_name() == Some(account.fullname.as_str()))
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(children)
}

/// Top-level accounts, sorted by name
pub async fn get_top_level_accounts<B: Book>(book: &mut B) -> CoreResult<Vec<Account>> {
    let mut accounts: Vec<Account> = book
        .accounts()
        .await?
        .into_iter()
        .filter(|a| a.depth() == 1)
        .collect();
    accounts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(accounts)
}

pub async fn get_budget_amounts<B: Book>(
    book: &mut B,
    account: &Account,
) -> CoreResult<Vec<BudgetAmount>> {
    Ok(book.budget_amounts(account).await?)
}

pub async fn get_balance<B: Book>(book: &mut B, account: &Account) -> CoreResult<Decimal> {
    Ok(book.balance(account, None).await?)
}

/// Change of the account's balance since the end of last month
pub async fn get_total_in_current_month<B: Book>(
    book: &mut B,
    account: &Account,
) -> CoreResult<Decimal> {
    get_total_in_month_of(book, account, time::today()).await
}

/// Change of the account's balance since the end of the month before `today`
pub async fn get_total_in_month_of<B: Book>(
    book: &mut B,
    account: &Account,
    today: NaiveDate,
) -> CoreResult<Decimal> {
    let start = time::previous_month_end(today).ok_or_else(|| CoreError::Internal {
        message: format!("No month before {}", today),
    })?;

    let at_start = book.balance(account, Some(start)).await?;
    let current = book.balance(account, None).await?;
    Ok(current - at_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountType;
    use crate::store::memory::MemoryBookStore;
    use crate::store::sqlite::tests::create_book;
    use crate::store::SqliteBookStore;
    use gnucash_web_config::BookLocation;
    use std::path::PathBuf;
    use std::str::FromStr;

    fn options() -> OpenOptions {
        OpenOptions::new(BookLocation::SqliteFile(PathBuf::from("book.gnucash")))
    }

    fn gnucash(message: &str) -> StoreError {
        StoreError::Gnucash {
            message: message.to_string(),
        }
    }

    fn connection(message: &str) -> StoreError {
        StoreError::Connection {
            message: message.to_string(),
        }
    }

    fn account(guid: &str, fullname: &str) -> Account {
        Account {
            guid: guid.to_string(),
            name: fullname.rsplit(':').next().unwrap().to_string(),
            fullname: fullname.to_string(),
            account_type: AccountType::Bank,
            parent_guid: None,
            commodity: Some("EUR".to_string()),
            description: String::new(),
            code: String::new(),
            hidden: false,
            placeholder: false,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_lock_message_maps_to_database_locked() {
        assert!(matches!(map_open_error(gnucash("Lock on the file")), CoreError::DatabaseLocked));
        assert!(matches!(
            map_open_error(gnucash("Lock on the file 'book.gnucash' held by desktop")),
            CoreError::DatabaseLocked
        ));
    }

    #[test]
    fn test_lock_wins_over_missing() {
        let error = gnucash("Lock on the file: lock file does not exist");
        assert!(matches!(map_open_error(error), CoreError::DatabaseLocked));
    }

    #[test]
    fn test_missing_book_maps_to_access_denied() {
        let error = gnucash("Database 'book.gnucash' does not exist");
        assert!(matches!(map_open_error(error), CoreError::AccessDenied));
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let error = gnucash("Unsupported table versions");
        match map_open_error(error.clone()) {
            CoreError::Store(inner) => {
                assert_eq!(inner, error);
                assert_eq!(inner.to_string(), "Unsupported table versions");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_connection_access_denied() {
        let error = connection("(1045, \"Access denied for user 'gnucash'@'localhost'\")");
        assert!(matches!(map_open_error(error), CoreError::AccessDenied));
    }

    #[test]
    fn test_other_connection_errors_pass_through() {
        let error = connection("unable to open database file");
        assert!(matches!(
            map_open_error(error.clone()),
            CoreError::Store(ref inner) if *inner == error
        ));
        // lock wording only counts for store-level failures
        let error = connection("Lock on the file");
        assert!(matches!(map_open_error(error), CoreError::Store(_)));
    }

    #[tokio::test]
    async fn test_open_book_maps_store_failure() {
        let store = MemoryBookStore::new().failing_open(gnucash("Lock on the file"));
        let result = open_book(&store, &options()).await;
        assert!(matches!(result, Err(CoreError::DatabaseLocked)));
        assert_eq!(store.closed(), 0);
    }

    #[tokio::test]
    async fn test_open_book_forwards_lock_tolerance() {
        let store = MemoryBookStore::new();
        let book = open_book(&store, &options().open_if_lock(true)).await.unwrap();
        book.close().await.unwrap();

        let opened = store.opened();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].open_if_lock);
    }

    #[tokio::test]
    async fn test_with_book_closes_once_on_success() {
        let store = MemoryBookStore::new().with_account(account("bank", "Assets:Bank"));
        let name = with_book(&store, &options(), |book| {
            Box::pin(async move {
                let acc = get_account(book, &AccountFilter::by_fullname("Assets:Bank")).await?;
                Ok::<_, CoreError>(acc.name)
            })
        })
        .await
        .unwrap();

        assert_eq!(name, "Bank");
        assert_eq!(store.closed(), 1);
    }

    #[tokio::test]
    async fn test_with_book_closes_once_when_body_fails() {
        let store = MemoryBookStore::new();
        let result: CoreResult<()> = with_book(&store, &options(), |_book| {
            Box::pin(async move {
                Err::<(), _>(CoreError::Internal {
                    message: "template rendering failed".to_string(),
                })
            })
        })
        .await;

        assert!(matches!(result, Err(CoreError::Internal { .. })));
        assert_eq!(store.closed(), 1);
    }

    #[tokio::test]
    async fn test_with_book_does_not_close_what_never_opened() {
        let store = MemoryBookStore::new().failing_open(gnucash("Database 'x' does not exist"));
        let result = with_book(&store, &options(), |_book| {
            Box::pin(async move { Ok::<_, CoreError>(1) })
        })
        .await;

        assert!(matches!(result, Err(CoreError::AccessDenied)));
        assert_eq!(store.closed(), 0);
    }

    #[tokio::test]
    async fn test_with_book_body_error_wins_over_close_error() {
        let store = MemoryBookStore::new().failing_close(StoreError::Query {
            message: "disk I/O error".to_string(),
        });
        let result: CoreResult<()> = with_book(&store, &options(), |_book| {
            Box::pin(async move {
                Err::<(), _>(CoreError::AccountNotFound {
                    name: "Assets".to_string(),
                })
            })
        })
        .await;
        assert!(matches!(result, Err(CoreError::AccountNotFound { .. })));
        assert_eq!(store.closed(), 1);

        let result = with_book(&store, &options(), |_book| {
            Box::pin(async move { Ok::<_, CoreError>(()) })
        })
        .await;
        assert!(matches!(result, Err(CoreError::Store(StoreError::Query { .. }))));
        assert_eq!(store.closed(), 2);
    }

    #[tokio::test]
    async fn test_get_account_not_found_carries_name() {
        let store = MemoryBookStore::new().with_account(account("bank", "Assets:Bank"));
        let mut book = store.open(&options()).await.unwrap();

        let err = get_account(&mut book, &AccountFilter::by_fullname("X")).await.unwrap_err();
        match err {
            CoreError::AccountNotFound { name } => assert_eq!(name, "X"),
            other => panic!("unexpected {:?}", other),
        }
        book.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_get_account_ambiguous_filter() {
        let store = MemoryBookStore::new()
            .with_account(account("a", "Assets:Savings"))
            .with_account(account("b", "Liabilities:Savings"));
        let mut book = store.open(&options()).await.unwrap();

        let err = get_account(&mut book, &AccountFilter::by_name("Savings")).await.unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Query { .. })));
        book.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_total_in_month_is_exact_decimal() {
        let bank = account("bank", "Assets:Bank");
        let store = MemoryBookStore::new()
            .with_account(bank.clone())
            .with_balance("bank", Some(date(2024, 4, 30)), dec("100.00"))
            .with_balance("bank", None, dec("150.00"));
        let mut book = store.open(&options()).await.unwrap();

        let total = get_total_in_month_of(&mut book, &bank, date(2024, 5, 17)).await.unwrap();
        assert_eq!(total, dec("50.00"));
        assert_eq!(total.to_string(), "50.00");
        book.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_total_in_current_month_uses_last_month_end() {
        let bank = account("bank", "Assets:Bank");
        let last_month_end = time::previous_month_end(time::today()).unwrap();
        let store = MemoryBookStore::new()
            .with_balance("bank", Some(last_month_end), dec("100.00"))
            .with_balance("bank", None, dec("150.00"));
        let mut book = store.open(&options()).await.unwrap();

        let total = get_total_in_current_month(&mut book, &bank).await.unwrap();
        assert_eq!(total, dec("50.00"));
        book.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_total_in_month_avoids_float_drift() {
        let bank = account("bank", "Assets:Bank");
        let store = MemoryBookStore::new()
            .with_balance("bank", Some(date(2024, 2, 29)), dec("0.1"))
            .with_balance("bank", None, dec("0.3"));
        let mut book = store.open(&options()).await.unwrap();

        let total = get_total_in_month_of(&mut book, &bank, date(2024, 3, 1)).await.unwrap();
        assert_eq!(total, dec("0.2"));
        book.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_children_and_top_level_accounts() {
        let store = MemoryBookStore::new()
            .with_account(account("assets", "Assets"))
            .with_account(account("cash", "Assets:Cash"))
            .with_account(account("bank", "Assets:Bank"))
            .with_account(account("savings", "Assets:Bank:Savings"))
            .with_account(account("expenses", "Expenses"));
        let mut book = store.open(&options()).await.unwrap();

        let top: Vec<String> = get_top_level_accounts(&mut book)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.fullname)
            .collect();
        assert_eq!(top, vec!["Assets", "Expenses"]);

        let assets = account("assets", "Assets");
        let children: Vec<String> = get_child_accounts(&mut book, &assets)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.fullname)
            .collect();
        assert_eq!(children, vec!["Assets:Bank", "Assets:Cash"]);
        book.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_book_through_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_book(dir.path()).await;
        let options = OpenOptions::new(BookLocation::SqliteFile(path));

        let (total, budget) = with_book(&SqliteBookStore::new(), &options, |book| {
            Box::pin(async move {
                let bank = get_account(book, &AccountFilter::by_fullname("Assets:Bank")).await?;
                let food = get_account(book, &AccountFilter::by_fullname("Expenses:Food")).await?;
                let total = get_total_in_month_of(book, &bank, date(2024, 5, 25)).await?;
                let budget = get_budget_amounts(book, &food).await?;
                Ok::<_, CoreError>((total, budget))
            })
        })
        .await
        .unwrap();

        assert_eq!(total, dec("-25.50"));
        assert_eq!(budget.len(), 2);
    }

    #[tokio::test]
    async fn test_sqlite_missing_book_is_access_denied() {
        let dir = tempfile::tempdir().unwrap();
        let options = OpenOptions::new(BookLocation::SqliteFile(dir.path().join("gone.gnucash")));
        let result = with_book(&SqliteBookStore::new(), &options, |_book| {
            Box::pin(async move { Ok::<_, CoreError>(()) })
        })
        .await;
        assert!(matches!(result, Err(CoreError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_sqlite_missing_book_by_uri_is_access_denied() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("sqlite://{}", dir.path().join("gone.gnucash").display());
        let options = OpenOptions::new(BookLocation::Uri(uri));
        let result = with_book(&SqliteBookStore::new(), &options, |_book| {
            Box::pin(async move { Ok::<_, CoreError>(()) })
        })
        .await;
        assert!(matches!(result, Err(CoreError::AccessDenied)));
    }
}
