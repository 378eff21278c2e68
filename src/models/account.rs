//! Account model
//!
//! Accounts are both allocation owners (money leaving an account into
//! categories and goals) and distribution targets (a paycheck landing in
//! accounts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, BudgetId, UserId};
use super::money::Money;

/// A bank account snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// The budget whose categories this account funds
    pub budget_id: BudgetId,

    /// Owner of the account; scopes goals and recurring charges
    pub user_id: UserId,

    /// Account name (e.g., "Chase Checking")
    pub name: String,

    /// Current balance
    #[serde(default)]
    pub balance: Money,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(name: impl Into<String>, budget_id: BudgetId, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            budget_id,
            user_id,
            name: name.into(),
            balance: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an account with a starting balance
    pub fn with_balance(
        name: impl Into<String>,
        budget_id: BudgetId,
        user_id: UserId,
        balance: Money,
    ) -> Self {
        let mut account = Self::new(name, budget_id, user_id);
        account.balance = balance;
        account
    }

    /// Add a delta to the balance
    pub fn deposit(&mut self, amount: Money) {
        self.balance += amount;
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}
