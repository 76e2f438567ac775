//! GnuCash books saved in the SQLite format

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use gnucash_web_config::BookLocation;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Row};

use super::{Book, BookStore, OpenOptions, StoreError, StoreResult};
use crate::model::{Account, AccountType, BudgetAmount};
use crate::time::parse_post_date;

/// Message used by the book layer when another session holds the lock
pub const LOCK_MESSAGE: &str = "Lock on the file";

/// Opens SQLite GnuCash books
#[derive(Debug, Clone, Default)]
pub struct SqliteBookStore;

impl SqliteBookStore {
    pub fn new() -> Self {
        Self
    }

    fn connect_options(options: &OpenOptions) -> StoreResult<SqliteConnectOptions> {
        let connect = match &options.location {
            BookLocation::SqliteFile(path) => SqliteConnectOptions::new().filename(path),
            BookLocation::Uri(uri) => {
                SqliteConnectOptions::from_str(uri).map_err(|e| StoreError::Connection {
                    message: e.to_string(),
                })?
            }
        };

        let path = connect.get_filename();
        if options.check_exists && !path.exists() {
            return Err(StoreError::Gnucash {
                message: format!(
                    "Database '{}' does not exist (please use create_book to create GnuCash books)",
                    path.display()
                ),
            });
        }

        Ok(connect
            .read_only(options.readonly)
            .create_if_missing(false))
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    type Book = SqliteBook;

    async fn open(&self, options: &OpenOptions) -> StoreResult<SqliteBook> {
        let connect = Self::connect_options(options)?;
        let mut conn = SqliteConnection::connect_with(&connect)
            .await
            .map_err(|e| StoreError::Connection {
                message: e.to_string(),
            })?;

        match prepare(&mut conn, options).await {
            Ok(lock) => Ok(SqliteBook {
                conn,
                lock,
                accounts: None,
            }),
            Err(err) => {
                if let Err(close_err) = conn.close().await {
                    log::warn!("Failed to close rejected book connection: {}", close_err);
                }
                Err(err)
            }
        }
    }
}

/// Check the schema and the GnuCash lock, taking the lock when writable
async fn prepare(
    conn: &mut SqliteConnection,
    options: &OpenOptions,
) -> StoreResult<Option<(String, i64)>> {
    let tables: i64 = sqlx::query(
        "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name IN ('books', 'gnclock')",
    )
    .fetch_one(&mut *conn)
    .await?
    .try_get("n")?;
    if tables != 2 {
        return Err(StoreError::Gnucash {
            message: format!("'{}' is not a valid GnuCash book", options.location),
        });
    }

    let holders = sqlx::query("SELECT Hostname, PID FROM gnclock")
        .fetch_all(&mut *conn)
        .await?;
    if !holders.is_empty() {
        if !options.open_if_lock {
            return Err(StoreError::Gnucash {
                message: LOCK_MESSAGE.to_string(),
            });
        }
        log::debug!("Opening {} despite {} lock holder(s)", options.location, holders.len());
    }

    if options.readonly {
        return Ok(None);
    }

    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    let pid = i64::from(std::process::id());
    sqlx::query("INSERT INTO gnclock (Hostname, PID) VALUES (?, ?)")
        .bind(&hostname)
        .bind(pid)
        .execute(&mut *conn)
        .await?;
    Ok(Some((hostname, pid)))
}

/// An open SQLite book
pub struct SqliteBook {
    conn: SqliteConnection,
    /// Lock row written by this handle, if any
    lock: Option<(String, i64)>,
    accounts: Option<Vec<Account>>,
}

impl std::fmt::Debug for SqliteBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBook")
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

struct AccountRow {
    guid: String,
    name: String,
    account_type: String,
    parent_guid: Option<String>,
    commodity: Option<String>,
    description: Option<String>,
    code: Option<String>,
    hidden: Option<i64>,
    placeholder: Option<i64>,
}

/// Full names are built by walking up to the book's root. Accounts below
/// another root (scheduled transaction templates) are left out.
fn resolve_accounts(root_guid: &str, rows: &[AccountRow]) -> StoreResult<Vec<Account>> {
    let by_guid: HashMap<&str, &AccountRow> = rows.iter().map(|r| (r.guid.as_str(), r)).collect();
    let mut accounts = Vec::with_capacity(rows.len());

    for row in rows {
        if row.guid == root_guid {
            continue;
        }

        let mut names = vec![row.name.as_str()];
        let mut parent = row.parent_guid.as_deref();
        let mut reached_root = false;
        while let Some(guid) = parent {
            if guid == root_guid {
                reached_root = true;
                break;
            }
            if names.len() > rows.len() {
                return Err(StoreError::Query {
                    message: format!("Account hierarchy above '{}' contains a cycle", row.name),
                });
            }
            match by_guid.get(guid) {
                Some(parent_row) => {
                    names.push(parent_row.name.as_str());
                    parent = parent_row.parent_guid.as_deref();
                }
                None => break,
            }
        }
        if !reached_root {
            continue;
        }
        names.reverse();

        let account_type = AccountType::from_str(&row.account_type)
            .map_err(|message| StoreError::Query { message })?;
        accounts.push(Account {
            guid: row.guid.clone(),
            name: row.name.clone(),
            fullname: names.join(":"),
            account_type,
            parent_guid: row.parent_guid.clone().filter(|p| p != root_guid),
            commodity: row.commodity.clone(),
            description: row.description.clone().unwrap_or_default(),
            code: row.code.clone().unwrap_or_default(),
            hidden: row.hidden.unwrap_or(0) != 0,
            placeholder: row.placeholder.unwrap_or(0) != 0,
        });
    }

    Ok(accounts)
}

fn fraction(num: i64, denom: i64) -> StoreResult<Decimal> {
    Decimal::from(num)
        .checked_div(Decimal::from(denom))
        .ok_or_else(|| StoreError::Query {
            message: format!("Invalid amount {}/{}", num, denom),
        })
}

impl SqliteBook {
    async fn load_accounts(&mut self) -> StoreResult<Vec<Account>> {
        let root_guid: String = sqlx::query("SELECT root_account_guid FROM books LIMIT 1")
            .fetch_optional(&mut self.conn)
            .await?
            .ok_or_else(|| StoreError::Gnucash {
                message: "The book has no root account".to_string(),
            })?
            .try_get("root_account_guid")?;

        let rows = sqlx::query(
            "SELECT a.guid, a.name, a.account_type, a.parent_guid, a.description, a.code, \
                    a.hidden, a.placeholder, c.mnemonic AS commodity \
             FROM accounts a LEFT JOIN commodities c ON c.guid = a.commodity_guid",
        )
        .fetch_all(&mut self.conn)
        .await?;

        let rows = rows
            .iter()
            .map(|row| -> Result<AccountRow, sqlx::Error> {
                Ok(AccountRow {
                    guid: row.try_get("guid")?,
                    name: row.try_get("name")?,
                    account_type: row.try_get("account_type")?,
                    parent_guid: row.try_get("parent_guid")?,
                    commodity: row.try_get("commodity")?,
                    description: row.try_get("description")?,
                    code: row.try_get("code")?,
                    hidden: row.try_get("hidden")?,
                    placeholder: row.try_get("placeholder")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let accounts = resolve_accounts(&root_guid, &rows)?;
        log::debug!("Loaded {} accounts", accounts.len());
        Ok(accounts)
    }

    /// Splits of transactions without a post date count towards no balance
    async fn split_total(
        &mut self,
        account_guid: &str,
        at_date: Option<NaiveDate>,
    ) -> StoreResult<Decimal> {
        let rows = sqlx::query(
            "SELECT s.quantity_num, s.quantity_denom, t.post_date \
             FROM splits s JOIN transactions t ON t.guid = s.tx_guid \
             WHERE s.account_guid = ?",
        )
        .bind(account_guid)
        .fetch_all(&mut self.conn)
        .await?;

        let mut total = Decimal::ZERO;
        for row in rows {
            let post_date: Option<String> = row.try_get("post_date")?;
            let Some(post_date) = post_date else {
                continue;
            };
            let date = parse_post_date(&post_date).ok_or_else(|| StoreError::Query {
                message: format!("Invalid post date '{}'", post_date),
            })?;
            if at_date.is_some_and(|limit| date > limit) {
                continue;
            }
            total += fraction(row.try_get("quantity_num")?, row.try_get("quantity_denom")?)?;
        }
        Ok(total)
    }
}

#[async_trait]
impl Book for SqliteBook {
    async fn accounts(&mut self) -> StoreResult<Vec<Account>> {
        if self.accounts.is_none() {
            self.accounts = Some(self.load_accounts().await?);
        }
        Ok(self.accounts.clone().unwrap_or_default())
    }

    async fn balance(
        &mut self,
        account: &Account,
        at_date: Option<NaiveDate>,
    ) -> StoreResult<Decimal> {
        let accounts = self.accounts().await?;
        let guids: Vec<&str> = accounts
            .iter()
            .filter(|a| {
                a.guid == account.guid
                    || (a.is_descendant_of(account) && a.commodity == account.commodity)
            })
            .map(|a| a.guid.as_str())
            .collect();

        let mut total = Decimal::ZERO;
        for guid in guids {
            total += self.split_total(guid, at_date).await?;
        }
        Ok(total * Decimal::from(account.account_type.sign()))
    }

    async fn budget_amounts(&mut self, account: &Account) -> StoreResult<Vec<BudgetAmount>> {
        let rows = sqlx::query(
            "SELECT b.guid AS budget_guid, b.name AS budget_name, ba.period_num, \
                    ba.amount_num, ba.amount_denom \
             FROM budget_amounts ba JOIN budgets b ON b.guid = ba.budget_guid \
             WHERE ba.account_guid = ? \
             ORDER BY b.name, ba.period_num",
        )
        .bind(&account.guid)
        .fetch_all(&mut self.conn)
        .await?;

        rows.iter()
            .map(|row| -> StoreResult<BudgetAmount> {
                Ok(BudgetAmount {
                    budget_guid: row.try_get("budget_guid")?,
                    budget_name: row.try_get("budget_name")?,
                    period_num: row.try_get("period_num")?,
                    amount: fraction(row.try_get("amount_num")?, row.try_get("amount_denom")?)?,
                })
            })
            .collect()
    }

    async fn close(self) -> StoreResult<()> {
        let SqliteBook { mut conn, lock, .. } = self;
        if let Some((hostname, pid)) = lock {
            sqlx::query("DELETE FROM gnclock WHERE Hostname = ? AND PID = ?")
                .bind(&hostname)
                .bind(pid)
                .execute(&mut conn)
                .await?;
            log::debug!("Released GnuCash lock ({}, {})", hostname, pid);
        }
        conn.close().await?;
        Ok(())
    }
}
