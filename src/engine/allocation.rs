//! Allocation resolver: money leaving an account into categories and goals
//!
//! Walks the account's rules in priority order against a shrinking pool.
//! Each rule either claims an amount for one target, funds due-soon
//! obligations, spreads the pool across unfunded planned categories, or
//! parks the rest as unallocated and stops the run.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::amount::Pool;
use super::catalog::TargetCatalog;
use super::due_soon::{fund_due_soon, DueWindow};
use super::overflow::route_overflow;
use super::sort_rules;
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{
    Account, AllocationResult, GoalId, Money, OverflowInfo, Resolution, ResultTarget, Rule,
    RuleOwner, RuleTarget,
};

/// Resolver for account-owned rules
pub struct AllocationResolver<'a, C: TargetCatalog> {
    catalog: &'a C,
    window: DueWindow,
}

/// Mutable state of one run
struct Run {
    pool: Pool,
    allocated: HashSet<ResultTarget>,
    results: Vec<AllocationResult>,
    dropped: Money,
}

impl Run {
    fn emit(&mut self, result: AllocationResult) {
        debug!(target_name = %result.target_name, amount = %result.amount, "emit");
        self.pool.take(result.amount);
        if result.amount.is_positive() {
            self.allocated.insert(result.target);
        }
        self.results.push(result);
    }
}

impl<'a, C: TargetCatalog> AllocationResolver<'a, C> {
    pub fn new(catalog: &'a C, window: DueWindow) -> Self {
        Self { catalog, window }
    }

    /// Resolve `total` leaving `account` through `rules`.
    ///
    /// Fails with `NoRulesConfigured` when `rules` is empty.
    pub fn resolve(
        &self,
        account: &Account,
        rules: &[Rule],
        total: Money,
    ) -> WaterfallResult<Resolution> {
        if rules.is_empty() {
            return Err(WaterfallError::no_rules(RuleOwner::Account(account.id)));
        }

        let mut run = Run {
            pool: Pool::new(total),
            allocated: HashSet::new(),
            results: Vec::new(),
            dropped: Money::zero(),
        };

        for rule in sort_rules(rules) {
            if run.pool.is_exhausted() {
                break;
            }

            match rule.target {
                RuleTarget::Category { .. } if rule.due_date_aware => {
                    let funded = fund_due_soon(
                        self.catalog,
                        account,
                        rule.id,
                        self.window,
                        run.pool.remaining(),
                    );
                    for result in funded {
                        run.emit(result);
                    }
                }
                RuleTarget::Category { id } => {
                    let Some(category) = self.catalog.get_category(id) else {
                        warn!(rule = %rule.id, category = %id, "category missing, skipping rule");
                        continue;
                    };
                    let amount = run.pool.claim(&rule.method);
                    if amount.is_positive() {
                        run.emit(AllocationResult::new(
                            ResultTarget::Category(id),
                            category.name.clone(),
                            amount,
                            rule.id,
                        ));
                    }
                }
                RuleTarget::Goal { id, .. } => self.resolve_goal(&mut run, rule, id),
                RuleTarget::SplitRemaining => self.split_remaining(&mut run, account, rule),
                RuleTarget::Unallocated => {
                    let rest = run.pool.remaining();
                    run.emit(AllocationResult::unallocated(rest, rule.id));
                    break;
                }
                RuleTarget::Account { id } => {
                    warn!(rule = %rule.id, account = %id, "account target in allocation rules, skipping");
                }
            }
        }

        Ok(Resolution {
            total,
            results: run.results,
            remaining: run.pool.remaining().non_negative(),
            dropped: run.dropped,
        })
    }

    fn resolve_goal(&self, run: &mut Run, rule: &Rule, id: GoalId) {
        let Some(goal) = self.catalog.get_goal(id) else {
            warn!(rule = %rule.id, goal = %id, "goal missing, skipping rule");
            return;
        };

        let claimed = run.pool.claim(&rule.method);
        if !claimed.is_positive() {
            return;
        }

        let capped = claimed.min(goal.remaining_capacity());
        let overflow = claimed - capped;
        let mut result =
            AllocationResult::new(ResultTarget::Goal(id), goal.name.clone(), capped, rule.id);

        if !overflow.is_positive() {
            run.emit(result);
            return;
        }

        let routed = route_overflow(
            rule,
            overflow,
            run.pool.remaining() - capped,
            self.catalog,
        );
        result = result.with_overflow(OverflowInfo {
            amount: overflow,
            target: routed.as_ref().map(|r| r.target),
            target_name: routed.as_ref().map(|r| r.target_name.clone()),
        });
        debug!(goal = %goal.name, %capped, %overflow, redirected = routed.is_some(), "goal at capacity");

        run.emit(result);
        if let Some(routed) = routed {
            run.emit(routed);
        }
    }

    /// Spread the pool evenly across planned categories not yet funded in
    /// this run. Floor-division leftover cents are dropped, not carried to
    /// later rules.
    fn split_remaining(&self, run: &mut Run, account: &Account, rule: &Rule) {
        let targets: Vec<_> = self
            .catalog
            .list_categories_for_budget(account.budget_id)
            .into_iter()
            .filter(|c| c.has_plan() && c.usable_by(account.id))
            .filter(|c| !run.allocated.contains(&ResultTarget::Category(c.id)))
            .collect();

        if targets.is_empty() {
            debug!(rule = %rule.id, "no unfunded planned categories to split across");
            return;
        }

        let (share, leftover) = run.pool.remaining().split_even(targets.len());
        if share.is_positive() {
            for category in &targets {
                run.emit(AllocationResult::new(
                    ResultTarget::Category(category.id),
                    category.name.clone(),
                    share,
                    rule.id,
                ));
            }
        }
        for category in &targets {
            run.allocated.insert(ResultTarget::Category(category.id));
        }

        if leftover.is_positive() {
            debug!(rule = %rule.id, %leftover, "split leftover dropped");
        }
        run.dropped += run.pool.drain();
    }
}
