//! In-memory book store for tests
//!
//! Balances are looked up from a table keyed by account guid and date, so a
//! test states exactly what the store answers. Every open and close is
//! recorded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{Book, BookStore, OpenOptions, StoreError, StoreResult};
use crate::model::{Account, BudgetAmount};

#[derive(Debug, Default)]
struct Ledger {
    accounts: Vec<Account>,
    balances: HashMap<(String, Option<NaiveDate>), Decimal>,
    budget_amounts: HashMap<String, Vec<BudgetAmount>>,
}

/// What happened to the store so far
#[derive(Debug, Default)]
pub struct MemoryEvents {
    pub opened: Vec<OpenOptions>,
    pub closed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBookStore {
    ledger: Arc<Mutex<Ledger>>,
    open_error: Arc<Mutex<Option<StoreError>>>,
    close_error: Arc<Mutex<Option<StoreError>>>,
    events: Arc<Mutex<MemoryEvents>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: Account) -> Self {
        lock(&self.ledger).accounts.push(account);
        self
    }

    pub fn with_balance(self, guid: &str, at_date: Option<NaiveDate>, amount: Decimal) -> Self {
        lock(&self.ledger)
            .balances
            .insert((guid.to_string(), at_date), amount);
        self
    }

    pub fn with_budget_amount(self, guid: &str, amount: BudgetAmount) -> Self {
        lock(&self.ledger)
            .budget_amounts
            .entry(guid.to_string())
            .or_default()
            .push(amount);
        self
    }

    /// Every following open fails with `error`
    pub fn failing_open(self, error: StoreError) -> Self {
        *lock(&self.open_error) = Some(error);
        self
    }

    /// Every following close fails with `error`
    pub fn failing_close(self, error: StoreError) -> Self {
        *lock(&self.close_error) = Some(error);
        self
    }

    pub fn opened(&self) -> Vec<OpenOptions> {
        lock(&self.events).opened.clone()
    }

    pub fn closed(&self) -> usize {
        lock(&self.events).closed
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl BookStore for MemoryBookStore {
    type Book = MemoryBook;

    async fn open(&self, options: &OpenOptions) -> StoreResult<MemoryBook> {
        lock(&self.events).opened.push(options.clone());
        if let Some(error) = lock(&self.open_error).clone() {
            return Err(error);
        }
        Ok(MemoryBook {
            store: self.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MemoryBook {
    store: MemoryBookStore,
}

#[async_trait]
impl Book for MemoryBook {
    async fn accounts(&mut self) -> StoreResult<Vec<Account>> {
        Ok(lock(&self.store.ledger).accounts.clone())
    }

    async fn balance(
        &mut self,
        account: &Account,
        at_date: Option<NaiveDate>,
    ) -> StoreResult<Decimal> {
        Ok(lock(&self.store.ledger)
            .balances
            .get(&(account.guid.clone(), at_date))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn budget_amounts(&mut self, account: &Account) -> StoreResult<Vec<BudgetAmount>> {
        Ok(lock(&self.store.ledger)
            .budget_amounts
            .get(&account.guid)
            .cloned()
            .unwrap_or_default())
    }

    async fn close(self) -> StoreResult<()> {
        lock(&self.store.events).closed += 1;
        match lock(&self.store.close_error).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
