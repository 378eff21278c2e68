//! Due-soon prioritizer
//!
//! Funds obligations that fall inside the lookahead window before ordinary
//! rules see the money. Two sources feed it: categories whose due date is in
//! the window (needing their planned shortfall) and category-linked recurring
//! charges whose next occurrence is in the window (needing their amount).

use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::catalog::TargetCatalog;
use crate::models::{Account, AllocationResult, CategoryId, Money, ResultTarget, RuleId};

pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 14;

/// Inclusive date range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DueWindow {
    /// Window from `as_of` to the next pay date if known, otherwise
    /// `lookahead_days` ahead
    pub fn new(as_of: NaiveDate, next_pay: Option<NaiveDate>, lookahead_days: u32) -> Self {
        let end = next_pay
            .filter(|d| *d >= as_of)
            .unwrap_or_else(|| as_of + Duration::days(i64::from(lookahead_days)));
        Self { start: as_of, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// One obligation waiting to be funded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSoonItem {
    pub category_id: CategoryId,
    pub category_name: String,
    pub needed: Money,
    pub due_date: NaiveDate,
}

/// Gather every due-soon obligation visible from `account`, earliest first.
///
/// The sort is stable: on equal dates category due dates precede charges,
/// and each source keeps catalog order.
pub fn collect_due_soon(
    catalog: &impl TargetCatalog,
    account: &Account,
    window: DueWindow,
) -> Vec<DueSoonItem> {
    let mut items: Vec<DueSoonItem> = catalog
        .list_categories_for_budget(account.budget_id)
        .into_iter()
        .filter(|c| c.usable_by(account.id))
        .filter_map(|c| {
            let due = c.due_date.filter(|d| window.contains(*d))?;
            let needed = c.shortfall();
            needed.is_positive().then(|| DueSoonItem {
                category_id: c.id,
                category_name: c.name.clone(),
                needed,
                due_date: due,
            })
        })
        .collect();

    for charge in catalog.list_due_soon_charges(account.user_id, window.end) {
        if !window.contains(charge.due_date) || !charge.amount.is_positive() {
            continue;
        }
        let Some(category) = catalog
            .get_category(charge.category_id)
            .filter(|c| c.budget_id == account.budget_id && c.usable_by(account.id))
        else {
            continue;
        };
        items.push(DueSoonItem {
            category_id: category.id,
            category_name: category.name.clone(),
            needed: charge.amount,
            due_date: charge.due_date,
        });
    }

    items.sort_by_key(|item| item.due_date);
    items
}

/// Greedily fund due-soon shortfalls from `remaining`, earliest first, until
/// the pool runs out
pub fn fund_due_soon(
    catalog: &impl TargetCatalog,
    account: &Account,
    rule_id: RuleId,
    window: DueWindow,
    remaining: Money,
) -> Vec<AllocationResult> {
    let mut left = remaining.non_negative();
    let mut results = Vec::new();

    for item in collect_due_soon(catalog, account, window) {
        if !left.is_positive() {
            break;
        }
        let amount = item.needed.min(left);
        left -= amount;
        debug!(category = %item.category_name, due = %item.due_date, %amount, "funding due-soon obligation");
        results.push(
            AllocationResult::new(
                ResultTarget::Category(item.category_id),
                item.category_name,
                amount,
                rule_id,
            )
            .with_due_date(item.due_date),
        );
    }

    results
}
