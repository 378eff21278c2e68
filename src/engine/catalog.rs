//! Collaborator seams
//!
//! The resolvers never touch storage. They read rules through `RuleSource`
//! and targets through a `TargetCatalog` snapshot, and hand their output to an
//! `ExecutionApplier` as a separate step.

use chrono::NaiveDate;

use crate::error::WaterfallResult;
use crate::models::{
    Account, AccountId, AllocationResult, BudgetId, Category, CategoryId, CategoryTemplate,
    DueCharge, Goal, GoalId, IncomeSourceId, RecurringCharge, Rule, RuleOwner, UserId,
};

/// Ordered rule lists per owner
pub trait RuleSource {
    /// Rules ordered by priority ascending, ties in insertion order
    fn list_rules(&self, owner: RuleOwner) -> WaterfallResult<Vec<Rule>>;

    /// Category templates of an income source, in the same order
    fn list_category_templates(
        &self,
        source: IncomeSourceId,
    ) -> WaterfallResult<Vec<CategoryTemplate>>;
}

/// Read-only view of targets for the duration of one resolve call
pub trait TargetCatalog {
    fn get_category(&self, id: CategoryId) -> Option<&Category>;
    fn get_goal(&self, id: GoalId) -> Option<&Goal>;
    fn get_account(&self, id: AccountId) -> Option<&Account>;
    fn list_categories_for_budget(&self, budget: BudgetId) -> Vec<&Category>;
    fn list_goals_for_user(&self, user: UserId) -> Vec<&Goal>;
    /// Category-linked recurring charges due on or before `window_end`
    fn list_due_soon_charges(&self, user: UserId, window_end: NaiveDate) -> Vec<DueCharge>;
}

/// Durable mutation step that follows a resolve
///
/// Implementations must apply each result as an additive update
/// (`current + delta`), never by writing back a value computed from the
/// snapshot. Calling `apply` twice applies the money twice.
pub trait ExecutionApplier {
    fn apply(&self, results: &[AllocationResult]) -> WaterfallResult<()> {
        self.apply_with_categories(Vec::new(), results)
    }

    /// Create `categories` and apply `results` as a single change; when any
    /// target is missing neither happens
    fn apply_with_categories(
        &self,
        categories: Vec<Category>,
        results: &[AllocationResult],
    ) -> WaterfallResult<()>;
}

/// An immutable copy of every target, taken at the start of a resolve call
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub goals: Vec<Goal>,
    pub charges: Vec<RecurringCharge>,
}

impl TargetCatalog for CatalogSnapshot {
    fn get_category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn get_goal(&self, id: GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    fn get_account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn list_categories_for_budget(&self, budget: BudgetId) -> Vec<&Category> {
        self.categories
            .iter()
            .filter(|c| c.budget_id == budget)
            .collect()
    }

    fn list_goals_for_user(&self, user: UserId) -> Vec<&Goal> {
        self.goals.iter().filter(|g| g.user_id == user).collect()
    }

    fn list_due_soon_charges(&self, user: UserId, window_end: NaiveDate) -> Vec<DueCharge> {
        self.charges
            .iter()
            .filter(|c| c.user_id == user && c.next_due <= window_end)
            .filter_map(|c| {
                c.category_id.map(|category_id| DueCharge {
                    category_id,
                    amount: c.amount,
                    due_date: c.next_due,
                })
            })
            .collect()
    }
}
