//! Goal overflow router
//!
//! Redirects the part of a goal claim that exceeds the goal's remaining
//! capacity. One hop only: the overflow target is funded as-is even if it is
//! itself a goal at capacity.

use tracing::warn;

use super::catalog::TargetCatalog;
use crate::models::{AllocationResult, Money, OverflowTarget, ResultTarget, Rule, RuleTarget};

/// Route `overflow` to the rule's configured overflow target.
///
/// Returns `None` when no target is configured, the target no longer exists
/// or nothing can be routed; the money then stays in the pool.
pub fn route_overflow(
    rule: &Rule,
    overflow: Money,
    remaining: Money,
    catalog: &impl TargetCatalog,
) -> Option<AllocationResult> {
    let RuleTarget::Goal {
        overflow: Some(target),
        ..
    } = rule.target
    else {
        return None;
    };

    let amount = overflow.min(remaining.non_negative());
    if !amount.is_positive() {
        return None;
    }

    let name = match target {
        OverflowTarget::Category(id) => catalog.get_category(id).map(|c| c.name.clone()),
        OverflowTarget::Goal(id) => catalog.get_goal(id).map(|g| g.name.clone()),
    };

    match name {
        Some(name) => Some(AllocationResult::new(
            ResultTarget::from(target),
            name,
            amount,
            rule.id,
        )),
        None => {
            warn!(rule = %rule.id, overflow_target = %ResultTarget::from(target), "overflow target missing, keeping funds in pool");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::CatalogSnapshot;
    use crate::models::{AccountId, AllocationMethod, BudgetId, Category, Goal, GoalId, RuleOwner, UserId};

    fn goal_rule(overflow: Option<OverflowTarget>) -> Rule {
        Rule::new(
            RuleOwner::Account(AccountId::new()),
            0,
            RuleTarget::Goal {
                id: GoalId::new(),
                overflow,
            },
            AllocationMethod::fixed(Money::from_cents(200)),
        )
    }

    #[test]
    fn test_no_target_configured() {
        let snapshot = CatalogSnapshot::default();
        let rule = goal_rule(None);
        assert!(route_overflow(&rule, Money::from_cents(100), Money::from_cents(500), &snapshot).is_none());
    }

    #[test]
    fn test_routes_to_category() {
        let category = Category::new("Fun Money", BudgetId::new());
        let rule = goal_rule(Some(OverflowTarget::Category(category.id)));
        let snapshot = CatalogSnapshot {
            categories: vec![category.clone()],
            ..Default::default()
        };

        let routed = route_overflow(&rule, Money::from_cents(100), Money::from_cents(500), &snapshot).unwrap();
        assert_eq!(routed.target, ResultTarget::Category(category.id));
        assert_eq!(routed.target_name, "Fun Money");
        assert_eq!(routed.amount.cents(), 100);
        assert_eq!(routed.rule_id, rule.id);
    }

    #[test]
    fn test_capped_at_remaining() {
        let goal = Goal::new("House", UserId::new(), Money::from_cents(10_000));
        let rule = goal_rule(Some(OverflowTarget::Goal(goal.id)));
        let snapshot = CatalogSnapshot {
            goals: vec![goal],
            ..Default::default()
        };

        let routed = route_overflow(&rule, Money::from_cents(100), Money::from_cents(40), &snapshot).unwrap();
        assert_eq!(routed.amount.cents(), 40);
    }

    #[test]
    fn test_missing_target_keeps_funds() {
        let rule = goal_rule(Some(OverflowTarget::Category(crate::models::CategoryId::new())));
        let snapshot = CatalogSnapshot::default();
        assert!(route_overflow(&rule, Money::from_cents(100), Money::from_cents(500), &snapshot).is_none());
    }
}
