//! Resolver output
//!
//! An `AllocationResult` is one disbursement produced by a resolver run. A
//! `Resolution` is the ordered list of them plus whatever was left in the
//! pool. Both are plain data: previewing produces them, executing hands them
//! to an applier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, GoalId, RuleId};
use super::money::Money;
use super::rule::OverflowTarget;

/// What a result pays into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ResultTarget {
    Category(CategoryId),
    Goal(GoalId),
    Account(AccountId),
    Unallocated,
}

impl ResultTarget {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Category(_) => "category",
            Self::Goal(_) => "goal",
            Self::Account(_) => "account",
            Self::Unallocated => "unallocated",
        }
    }
}

impl From<OverflowTarget> for ResultTarget {
    fn from(target: OverflowTarget) -> Self {
        match target {
            OverflowTarget::Category(id) => Self::Category(id),
            OverflowTarget::Goal(id) => Self::Goal(id),
        }
    }
}

impl fmt::Display for ResultTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(id) => write!(f, "{}", id),
            Self::Goal(id) => write!(f, "{}", id),
            Self::Account(id) => write!(f, "{}", id),
            Self::Unallocated => write!(f, "unallocated"),
        }
    }
}

/// Goal excess recorded on the goal's own result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowInfo {
    /// Portion of the claim above the goal's remaining capacity
    pub amount: Money,
    /// Where it was redirected, if anywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ResultTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
}

impl OverflowInfo {
    pub fn is_redirected(&self) -> bool {
        self.target.is_some()
    }
}

/// One disbursement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub target: ResultTarget,
    pub target_name: String,
    /// Always >= 0
    pub amount: Money,
    pub rule_id: RuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overflow: Option<OverflowInfo>,
    /// Set on results produced by due-soon funding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl AllocationResult {
    pub fn new(
        target: ResultTarget,
        target_name: impl Into<String>,
        amount: Money,
        rule_id: RuleId,
    ) -> Self {
        Self {
            target,
            target_name: target_name.into(),
            amount,
            rule_id,
            overflow: None,
            due_date: None,
        }
    }

    pub fn unallocated(amount: Money, rule_id: RuleId) -> Self {
        Self::new(ResultTarget::Unallocated, "Unallocated", amount, rule_id)
    }

    pub fn with_overflow(mut self, overflow: OverflowInfo) -> Self {
        self.overflow = Some(overflow);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// The outcome of one resolver run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The pool that was resolved
    pub total: Money,
    pub results: Vec<AllocationResult>,
    /// What no rule claimed
    pub remaining: Money,
    /// Cents lost to split-remaining floor division
    #[serde(default)]
    pub dropped: Money,
}

impl Resolution {
    /// Sum of every emitted amount, unallocated results included
    pub fn total_emitted(&self) -> Money {
        self.results.iter().map(|r| r.amount).sum()
    }

    /// Money that did not reach a real target: the leftover pool plus any
    /// explicit unallocated result
    pub fn unassigned(&self) -> Money {
        let explicit: Money = self
            .results
            .iter()
            .filter(|r| r.target == ResultTarget::Unallocated)
            .map(|r| r.amount)
            .sum();
        explicit + self.remaining
    }

    /// Results that move money into a real target
    pub fn disbursements(&self) -> impl Iterator<Item = &AllocationResult> {
        self.results
            .iter()
            .filter(|r| r.target != ResultTarget::Unallocated && r.amount.is_positive())
    }
}
