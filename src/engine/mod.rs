//! Waterfall engine
//!
//! Pure resolvers that turn a pool of money and an ordered rule list into a
//! list of disbursements. Nothing here reads or writes storage; callers pass
//! a `TargetCatalog` snapshot in and hand the results to an
//! `ExecutionApplier` afterwards.

pub mod allocation;
pub mod amount;
pub mod catalog;
pub mod distribution;
pub mod due_soon;
pub mod overflow;
pub mod template;

pub use allocation::AllocationResolver;
pub use amount::{calculate_rule_amount, Pool};
pub use catalog::{CatalogSnapshot, ExecutionApplier, RuleSource, TargetCatalog};
pub use distribution::DistributionResolver;
pub use due_soon::{DueSoonItem, DueWindow, DEFAULT_LOOKAHEAD_DAYS};
pub use overflow::route_overflow;
pub use template::{AccountShare, TemplateAllocation, TemplatePlan, TemplateResolver};

use crate::models::Rule;

/// Rules in evaluation order: priority ascending, ties kept in input order
pub(crate) fn sort_rules(rules: &[Rule]) -> Vec<&Rule> {
    let mut sorted: Vec<&Rule> = rules.iter().collect();
    sorted.sort_by_key(|r| r.priority);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, AllocationMethod, Money, RuleOwner, RuleTarget};

    #[test]
    fn test_sort_rules_is_stable() {
        let owner = RuleOwner::Account(AccountId::new());
        let method = AllocationMethod::fixed(Money::from_cents(1));
        let rules = vec![
            Rule::new(owner, 2, RuleTarget::Unallocated, method),
            Rule::new(owner, 1, RuleTarget::Unallocated, method),
            Rule::new(owner, 2, RuleTarget::Unallocated, method),
            Rule::new(owner, 1, RuleTarget::Unallocated, method),
        ];

        let order: Vec<_> = sort_rules(&rules).iter().map(|r| r.id).collect();
        assert_eq!(order, vec![rules[1].id, rules[3].id, rules[0].id, rules[2].id]);
    }
}
