//! Book entities as read from a GnuCash book

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account type, stored by GnuCash as an upper-case string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Root,
    Bank,
    Cash,
    Asset,
    Credit,
    Liability,
    Stock,
    Mutual,
    Currency,
    Income,
    Expense,
    Equity,
    Receivable,
    Payable,
    Trading,
}

impl AccountType {
    /// Sign applied to raw split sums so balances read naturally
    /// (a credit card debt or a salary shows up positive).
    pub fn sign(&self) -> i32 {
        match self {
            AccountType::Credit
            | AccountType::Liability
            | AccountType::Equity
            | AccountType::Income
            | AccountType::Payable => -1,
            _ => 1,
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ROOT" => Ok(AccountType::Root),
            "BANK" => Ok(AccountType::Bank),
            "CASH" => Ok(AccountType::Cash),
            "ASSET" => Ok(AccountType::Asset),
            "CREDIT" => Ok(AccountType::Credit),
            "LIABILITY" => Ok(AccountType::Liability),
            "STOCK" => Ok(AccountType::Stock),
            "MUTUAL" => Ok(AccountType::Mutual),
            "CURRENCY" => Ok(AccountType::Currency),
            "INCOME" => Ok(AccountType::Income),
            "EXPENSE" => Ok(AccountType::Expense),
            "EQUITY" => Ok(AccountType::Equity),
            "RECEIVABLE" => Ok(AccountType::Receivable),
            "PAYABLE" => Ok(AccountType::Payable),
            "TRADING" => Ok(AccountType::Trading),
            _ => Err(format!("Invalid account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AccountType::Root => "ROOT",
            AccountType::Bank => "BANK",
            AccountType::Cash => "CASH",
            AccountType::Asset => "ASSET",
            AccountType::Credit => "CREDIT",
            AccountType::Liability => "LIABILITY",
            AccountType::Stock => "STOCK",
            AccountType::Mutual => "MUTUAL",
            AccountType::Currency => "CURRENCY",
            AccountType::Income => "INCOME",
            AccountType::Expense => "EXPENSE",
            AccountType::Equity => "EQUITY",
            AccountType::Receivable => "RECEIVABLE",
            AccountType::Payable => "PAYABLE",
            AccountType::Trading => "TRADING",
        };
        write!(f, "{}", name)
    }
}

/// A ledger account of an open book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub guid: String,
    pub name: String,
    /// Colon separated path from the root, root excluded
    pub fullname: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_guid: Option<String>,
    /// Commodity mnemonic, e.g. `EUR`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub placeholder: bool,
}

impl Account {
    /// Last component of the full name
    pub fn short_name(&self) -> &str {
        self.fullname.rsplit(':').next().unwrap_or(&self.fullname)
    }

    /// Top-level accounts have depth 1
    pub fn depth(&self) -> usize {
        self.fullname.split(':').count()
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.fullname.rsplit_once(':').map(|(parent, _)| parent)
    }

    pub fn is_descendant_of(&self, ancestor: &Account) -> bool {
        self.fullname.len() > ancestor.fullname.len()
            && self.fullname.starts_with(&ancestor.fullname)
            && self.fullname[ancestor.fullname.len()..].starts_with(':')
    }
}

/// Criteria for looking up an account. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
}

impl AccountFilter {
    pub fn by_fullname(fullname: impl Into<String>) -> Self {
        Self {
            fullname: Some(fullname.into()),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_guid(guid: impl Into<String>) -> Self {
        Self {
            guid: Some(guid.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, account: &Account) -> bool {
        self.fullname.as_ref().map_or(true, |v| *v == account.fullname)
            && self.name.as_ref().map_or(true, |v| *v == account.name)
            && self.guid.as_ref().map_or(true, |v| *v == account.guid)
            && self.account_type.map_or(true, |v| v == account.account_type)
            && self
                .commodity
                .as_ref()
                .map_or(true, |v| Some(v) == account.commodity.as_ref())
    }

    /// The value shown to the user when nothing matched
    pub fn requested(&self) -> String {
        self.fullname
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.guid.clone())
            .unwrap_or_else(|| self.to_string())
    }
}

impl std::fmt::Display for AccountFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref v) = self.fullname {
            parts.push(format!("fullname={}", v));
        }
        if let Some(ref v) = self.name {
            parts.push(format!("name={}", v));
        }
        if let Some(ref v) = self.guid {
            parts.push(format!("guid={}", v));
        }
        if let Some(v) = self.account_type {
            parts.push(format!("type={}", v));
        }
        if let Some(ref v) = self.commodity {
            parts.push(format!("commodity={}", v));
        }
        if parts.is_empty() {
            write!(f, "<any account>")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// One period amount of a budget for an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAmount {
    pub budget_guid: String,
    pub budget_name: String,
    pub period_num: i64,
    pub amount: Decimal,
}
