//! Access to GnuCash books: opening, account lookups, balances and budgets

pub mod error;
pub mod gateway;
pub mod model;
pub mod store;
pub mod time;

pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use gateway::{
    get_account, get_balance, get_budget_amounts, get_child_accounts, get_top_level_accounts,
    get_total_in_current_month, get_total_in_month_of, map_open_error, open_book, with_book,
    BookFuture,
};
pub use model::{Account, AccountFilter, AccountType, BudgetAmount};
pub use store::{Book, BookStore, OpenOptions, SqliteBook, SqliteBookStore, StoreError, StoreResult};
