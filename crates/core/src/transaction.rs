use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::Category;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
    Interest,
    Fee,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
            TransactionType::Transfer => write!(f, "transfer"),
            TransactionType::Interest => write!(f, "interest"),
            TransactionType::Fee => write!(f, "fee"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            "interest" => Ok(TransactionType::Interest),
            "fee" => Ok(TransactionType::Fee),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

/// A single imported or entered movement of money. The sign of `amount`
/// encodes direction: positive is inflow, negative is outflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: TransactionType,
    #[serde(default)]
    pub category: Category,
    pub counterparty: Option<String>,
    pub description: String,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        account_id: AccountId,
        date: NaiveDate,
        amount: Money,
        description: &str,
    ) -> Self {
        let kind = if amount.is_negative() {
            TransactionType::Expense
        } else {
            TransactionType::Income
        };
        Transaction {
            id,
            account_id,
            date,
            amount,
            kind,
            category: Category::Uncategorized,
            counterparty: None,
            description: description.to_string(),
        }
    }

    pub fn with_counterparty(mut self, counterparty: &str) -> Self {
        self.counterparty = Some(counterparty.to_string());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_kind(mut self, kind: TransactionType) -> Self {
        self.kind = kind;
        self
    }

    /// Counterparty when present and non-blank.
    pub fn counterparty_name(&self) -> Option<&str> {
        self.counterparty
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Locally owned monotonic id generator, seeded past the highest id already
/// in use.
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: i64,
}

impl IdSequence {
    pub fn starting_after(last: Option<TransactionId>) -> Self {
        IdSequence {
            next: last.map_or(1, |id| id.0 + 1),
        }
    }

    pub fn next_id(&mut self) -> TransactionId {
        let id = TransactionId(self.next);
        self.next += 1;
        id
    }
}
