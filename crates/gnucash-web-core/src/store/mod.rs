//! Access to the storage holding a GnuCash book
//!
//! A [`BookStore`] opens [`Book`] handles. A handle is owned by one request
//! and must be given back through [`Book::close`], which consumes it.

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use gnucash_web_config::{BookLocation, Config};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{Account, AccountFilter, BudgetAmount};

pub use sqlite::{SqliteBook, SqliteBookStore};

/// Failures reported by the store, before any translation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Raised by the book layer (missing file, lock held, unknown schema)
    #[error("{message}")]
    Gnucash { message: String },

    /// Raised by the SQL driver while connecting
    #[error("{message}")]
    Connection { message: String },

    /// Raised while reading an open book
    #[error("{message}")]
    Query { message: String },
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Gnucash { .. } => "gnucash",
            StoreError::Connection { .. } => "connection",
            StoreError::Query { .. } => "query",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StoreError::Gnucash { message }
            | StoreError::Connection { message }
            | StoreError::Query { message } => message,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::Query {
            message: error.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Parameters for opening a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    pub location: BookLocation,
    /// Do not take the GnuCash lock
    pub readonly: bool,
    /// Open even if another session holds the lock
    pub open_if_lock: bool,
    /// Fail when the book file does not exist
    pub check_exists: bool,
}

impl OpenOptions {
    pub fn new(location: BookLocation) -> Self {
        Self {
            location,
            readonly: true,
            open_if_lock: false,
            check_exists: true,
        }
    }

    /// Options for the configured book
    pub fn from_config(config: &Config) -> Self {
        Self {
            location: config.book_location(),
            readonly: config.database.readonly,
            open_if_lock: false,
            check_exists: config.database.check_exists,
        }
    }

    pub fn open_if_lock(mut self, open_if_lock: bool) -> Self {
        self.open_if_lock = open_if_lock;
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn check_exists(mut self, check_exists: bool) -> Self {
        self.check_exists = check_exists;
        self
    }
}

/// Something that can open books
#[async_trait]
pub trait BookStore: Send + Sync + 'static {
    type Book: Book + 'static;

    async fn open(&self, options: &OpenOptions) -> StoreResult<Self::Book>;
}

/// An open book
#[async_trait]
pub trait Book: Send {
    /// All accounts below the root, in no particular order
    async fn accounts(&mut self) -> StoreResult<Vec<Account>>;

    async fn find_accounts(&mut self, filter: &AccountFilter) -> StoreResult<Vec<Account>> {
        let accounts = self.accounts().await?;
        Ok(accounts.into_iter().filter(|a| filter.matches(a)).collect())
    }

    /// Balance of the account and its same-commodity descendants, with the
    /// account type's natural sign. `at_date` includes that whole day.
    async fn balance(
        &mut self,
        account: &Account,
        at_date: Option<NaiveDate>,
    ) -> StoreResult<Decimal>;

    async fn budget_amounts(&mut self, account: &Account) -> StoreResult<Vec<BudgetAmount>>;

    /// Release the book. Consumes the handle so it cannot be used afterwards.
    async fn close(self) -> StoreResult<()>
    where
        Self: Sized;
}
