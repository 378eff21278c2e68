//! Distribution resolver: a paycheck into accounts
//!
//! The single-level variant of the waterfall. Only account targets with
//! fixed, percentage or remainder claims take part. Whatever is left at the
//! end is reported on the resolution, not treated as an error.

use tracing::{debug, warn};

use super::amount::Pool;
use super::catalog::TargetCatalog;
use super::sort_rules;
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{
    AllocationMethod, AllocationResult, Money, Resolution, ResultTarget, Rule, RuleOwner,
    RuleTarget,
};

pub struct DistributionResolver<'a, C: TargetCatalog> {
    catalog: &'a C,
}

impl<'a, C: TargetCatalog> DistributionResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Resolve `total` across the accounts named by `rules`
    pub fn resolve(
        &self,
        owner: RuleOwner,
        rules: &[Rule],
        total: Money,
    ) -> WaterfallResult<Resolution> {
        if rules.is_empty() {
            return Err(WaterfallError::no_rules(owner));
        }

        let mut pool = Pool::new(total);
        let results = self.distribute(rules, &mut pool);

        if pool.remaining().is_positive() {
            debug!(%owner, remaining = %pool.remaining(), "distribution left funds unallocated");
        }

        Ok(Resolution {
            total,
            results,
            remaining: pool.remaining().non_negative(),
            dropped: Money::zero(),
        })
    }

    /// Walk account rules against `pool`, emitting one result per funded
    /// account
    pub(crate) fn distribute(&self, rules: &[Rule], pool: &mut Pool) -> Vec<AllocationResult> {
        let mut results = Vec::new();

        for rule in sort_rules(rules) {
            if pool.is_exhausted() {
                break;
            }

            let RuleTarget::Account { id } = rule.target else {
                warn!(rule = %rule.id, kind = rule.target.type_name(), "non-account target in distribution, skipping");
                continue;
            };
            if matches!(rule.method, AllocationMethod::Split) {
                warn!(rule = %rule.id, "split method in distribution, skipping");
                continue;
            }
            let Some(account) = self.catalog.get_account(id) else {
                warn!(rule = %rule.id, account = %id, "account missing, skipping rule");
                continue;
            };

            let amount = pool.claim(&rule.method);
            if !amount.is_positive() {
                continue;
            }
            pool.take(amount);
            results.push(AllocationResult::new(
                ResultTarget::Account(id),
                account.name.clone(),
                amount,
                rule.id,
            ));
        }

        results
    }
}
