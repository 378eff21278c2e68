//! Category model
//!
//! A budget category is an unbounded allocation target. Categories with a
//! planned (monthly) amount take part in split-remaining rules, and a due
//! date makes them candidates for due-soon funding.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, BudgetId, CategoryId};
use super::money::Money;

/// A budget category snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Budget this category belongs to
    pub budget_id: BudgetId,

    /// Account this category is funded from, if it is account-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,

    /// Category name
    pub name: String,

    /// Money currently assigned to the category
    #[serde(default)]
    pub current: Money,

    /// Monthly target amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned: Option<Money>,

    /// Next date the planned amount is needed by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new empty category
    pub fn new(name: impl Into<String>, budget_id: BudgetId) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            budget_id,
            account_id: None,
            name: name.into(),
            current: Money::zero(),
            planned: None,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scope the category to one account
    pub fn for_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Set the monthly planned amount
    pub fn with_planned(mut self, planned: Money) -> Self {
        self.planned = Some(planned);
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Set the current assigned amount
    pub fn with_current(mut self, current: Money) -> Self {
        self.current = current;
        self
    }

    /// True if the category has a nonzero planned amount
    pub fn has_plan(&self) -> bool {
        self.planned.map_or(false, |p| !p.is_zero())
    }

    /// How much is still needed to reach the planned amount
    pub fn shortfall(&self) -> Money {
        self.planned
            .map(|planned| (planned - self.current).non_negative())
            .unwrap_or_default()
    }

    /// Case-insensitive name match, ignoring surrounding whitespace
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Whether this category is visible from the given account
    pub fn usable_by(&self, account_id: AccountId) -> bool {
        self.account_id.map_or(true, |id| id == account_id)
    }

    /// Add a delta to the assigned amount
    pub fn assign(&mut self, amount: Money) {
        self.current += amount;
        self.updated_at = Utc::now();
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.len() > 50 {
            return Err(CategoryValidationError::NameTooLong(self.name.len()));
        }

        if let Some(planned) = self.planned {
            if planned.is_negative() {
                return Err(CategoryValidationError::NegativePlanned);
            }
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativePlanned,
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Category name too long ({} chars, max 50)", len)
            }
            Self::NegativePlanned => write!(f, "Planned amount cannot be negative"),
        }
    }
}

impl std::error::Error for CategoryValidationError {}
