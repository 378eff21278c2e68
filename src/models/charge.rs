//! Recurring charge model
//!
//! Subscriptions and bills that repeat. When one linked to a category falls
//! due inside the lookahead window, due-date-aware rules fund it first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ChargeId, UserId};
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringCharge {
    pub id: ChargeId,
    pub user_id: UserId,
    pub name: String,
    /// Category the charge is paid from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    pub amount: Money,
    pub next_due: NaiveDate,
}

impl RecurringCharge {
    pub fn new(
        name: impl Into<String>,
        user_id: UserId,
        category_id: Option<CategoryId>,
        amount: Money,
        next_due: NaiveDate,
    ) -> Self {
        Self {
            id: ChargeId::new(),
            user_id,
            name: name.into(),
            category_id,
            amount,
            next_due,
        }
    }

    /// True if the next occurrence lies in `[start, end]`
    pub fn due_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.next_due >= start && self.next_due <= end
    }
}

/// A charge as reported by the catalog's due-soon query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueCharge {
    pub category_id: CategoryId,
    pub amount: Money,
    pub due_date: NaiveDate,
}
