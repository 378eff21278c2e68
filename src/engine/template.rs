//! Template resolver: income into accounts, then each account's share into
//! categories
//!
//! Phase one is a distribution over the income source's account-split rules.
//! Phase two runs a category-only waterfall inside each account's share,
//! using the templates attached to that split plus every cross-cutting
//! template. Templates name categories rather than pointing at them, so a
//! category may not exist yet; the plan says so and execution creates it.

use serde::Serialize;
use tracing::debug;

use super::amount::Pool;
use super::catalog::TargetCatalog;
use super::distribution::DistributionResolver;
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{
    Account, AccountId, AllocationResult, BudgetId, CategoryId, CategoryTemplate, IncomeSourceId,
    Money, ResultTarget, Rule, RuleOwner, TemplateId,
};

/// One category line inside an account's share
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateAllocation {
    pub template_id: TemplateId,
    pub category_name: String,
    /// The matching category, when one already exists
    pub category_id: Option<CategoryId>,
    pub exists: bool,
    pub amount: Money,
}

/// An account's slice of the income and how it is spread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountShare {
    /// The phase-one result that funded this account
    pub split: AllocationResult,
    pub account_id: AccountId,
    pub budget_id: BudgetId,
    pub categories: Vec<TemplateAllocation>,
    /// Part of the share no template claimed
    pub remaining: Money,
}

impl AccountShare {
    pub fn share(&self) -> Money {
        self.split.amount
    }
}

/// Full two-level template resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplatePlan {
    pub total: Money,
    pub accounts: Vec<AccountShare>,
    /// Income no account split claimed
    pub remaining: Money,
}

impl TemplatePlan {
    /// Category names that execution would have to create, per account
    pub fn missing_categories(&self) -> impl Iterator<Item = (AccountId, &str)> {
        self.accounts.iter().flat_map(|share| {
            share
                .categories
                .iter()
                .filter(|c| !c.exists)
                .map(move |c| (share.account_id, c.category_name.as_str()))
        })
    }
}

pub struct TemplateResolver<'a, C: TargetCatalog> {
    catalog: &'a C,
}

impl<'a, C: TargetCatalog> TemplateResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Resolve `income` through the account splits and category templates of
    /// `source`
    pub fn resolve(
        &self,
        source: IncomeSourceId,
        splits: &[Rule],
        templates: &[CategoryTemplate],
        income: Money,
    ) -> WaterfallResult<TemplatePlan> {
        if splits.is_empty() {
            return Err(WaterfallError::no_rules(RuleOwner::IncomeSource(source)));
        }

        let mut pool = Pool::new(income);
        let funded = DistributionResolver::new(self.catalog).distribute(splits, &mut pool);

        let mut accounts = Vec::with_capacity(funded.len());
        for split in funded {
            let ResultTarget::Account(account_id) = split.target else {
                continue;
            };
            let Some(account) = self.catalog.get_account(account_id) else {
                continue;
            };
            accounts.push(self.resolve_share(account, split, templates));
        }

        Ok(TemplatePlan {
            total: income,
            accounts,
            remaining: pool.remaining().non_negative(),
        })
    }

    fn resolve_share(
        &self,
        account: &Account,
        split: AllocationResult,
        templates: &[CategoryTemplate],
    ) -> AccountShare {
        let mut applicable: Vec<&CategoryTemplate> = templates
            .iter()
            .filter(|t| t.applies_to(split.rule_id))
            .collect();
        applicable.sort_by_key(|t| t.priority);

        let existing = self.catalog.list_categories_for_budget(account.budget_id);
        let mut pool = Pool::new(split.amount);
        let mut categories = Vec::new();

        for template in applicable {
            if pool.is_exhausted() {
                break;
            }
            let amount = pool.claim(&template.method);
            if !amount.is_positive() {
                continue;
            }
            pool.take(amount);

            let found = existing
                .iter()
                .find(|c| c.usable_by(account.id) && c.matches_name(&template.category_name));
            debug!(account = %account.name, category = %template.category_name, %amount, exists = found.is_some(), "template claim");

            categories.push(TemplateAllocation {
                template_id: template.id,
                category_name: found
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| template.category_name.trim().to_string()),
                category_id: found.map(|c| c.id),
                exists: found.is_some(),
                amount,
            });
        }

        AccountShare {
            account_id: account.id,
            budget_id: account.budget_id,
            split,
            categories,
            remaining: pool.remaining().non_negative(),
        }
    }
}
