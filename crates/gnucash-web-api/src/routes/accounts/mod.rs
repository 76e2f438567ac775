//! Account routes - account list and account detail
//!
//! Structure:
//! - api.rs: JSON API endpoints
//! - page.rs: full page rendering

pub mod api;
pub mod page;

pub use api::{api_account_detail, api_accounts, AccountDetail, AccountSummary};
pub use page::{page_account_detail, page_accounts};
