//! Waterfall service
//!
//! Preview and execute for the three resolvers. Preview takes a catalog
//! snapshot, loads the owner's rules and resolves; it never mutates anything.
//! Execute is preview followed by one call to the applier. Execute is not
//! idempotent: running it twice moves the money twice.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::info;

use crate::config::Settings;
use crate::engine::{
    AllocationResolver, CatalogSnapshot, DistributionResolver, DueWindow, ExecutionApplier,
    RuleSource, TargetCatalog, TemplatePlan, TemplateResolver,
};
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{
    AccountId, AllocationResult, Category, CategoryId, IncomeSourceId, Money, PaycheckPlanId,
    Resolution, ResultTarget, RuleOwner,
};
use crate::storage::Storage;

/// When an allocation runs, for due-soon purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDate {
    pub as_of: NaiveDate,
    /// End of the due-soon window when known
    pub next_pay: Option<NaiveDate>,
}

impl RunDate {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            next_pay: None,
        }
    }

    pub fn with_next_pay(mut self, next_pay: Option<NaiveDate>) -> Self {
        self.next_pay = next_pay;
        self
    }
}

/// Service for running waterfalls
pub struct WaterfallService<'a> {
    storage: &'a Storage,
    lookahead_days: u32,
}

impl<'a> WaterfallService<'a> {
    pub fn new(storage: &'a Storage, settings: &Settings) -> Self {
        Self {
            storage,
            lookahead_days: settings.due_soon_lookahead_days,
        }
    }

    fn check_total(total: Money) -> WaterfallResult<()> {
        if total.is_negative() {
            return Err(WaterfallError::Validation(format!(
                "Amount to allocate cannot be negative: {}",
                total
            )));
        }
        Ok(())
    }

    // === Allocation ===

    /// Resolve `total` leaving an account into its categories and goals
    pub fn preview_allocation(
        &self,
        account_id: AccountId,
        total: Money,
        date: RunDate,
    ) -> WaterfallResult<Resolution> {
        Self::check_total(total)?;
        let snapshot = self.storage.catalog.snapshot()?;
        let account = snapshot
            .get_account(account_id)
            .ok_or_else(|| WaterfallError::account_not_found(account_id.to_string()))?;
        let rules = self.storage.list_rules(RuleOwner::Account(account_id))?;

        let window = DueWindow::new(date.as_of, date.next_pay, self.lookahead_days);
        AllocationResolver::new(&snapshot, window).resolve(account, &rules, total)
    }

    pub fn execute_allocation(
        &self,
        account_id: AccountId,
        total: Money,
        date: RunDate,
    ) -> WaterfallResult<Resolution> {
        let resolution = self.preview_allocation(account_id, total, date)?;
        self.storage.apply(&resolution.results)?;
        info!(account = %account_id, total = %total, results = resolution.results.len(), "allocation executed");
        Ok(resolution)
    }

    // === Distribution ===

    /// Resolve a paycheck across the plan's accounts
    pub fn preview_distribution(
        &self,
        plan_id: PaycheckPlanId,
        total: Money,
    ) -> WaterfallResult<Resolution> {
        Self::check_total(total)?;
        let snapshot = self.storage.catalog.snapshot()?;
        let owner = RuleOwner::PaycheckPlan(plan_id);
        let rules = self.storage.list_rules(owner)?;

        DistributionResolver::new(&snapshot).resolve(owner, &rules, total)
    }

    pub fn execute_distribution(
        &self,
        plan_id: PaycheckPlanId,
        total: Money,
    ) -> WaterfallResult<Resolution> {
        let resolution = self.preview_distribution(plan_id, total)?;
        self.storage.apply(&resolution.results)?;
        info!(plan = %plan_id, total = %total, results = resolution.results.len(), "distribution executed");
        Ok(resolution)
    }

    // === Income templates ===

    /// Resolve income through the source's account splits and category
    /// templates, reporting which categories would need creating
    pub fn preview_template(
        &self,
        source_id: IncomeSourceId,
        income: Money,
    ) -> WaterfallResult<TemplatePlan> {
        Self::check_total(income)?;
        let snapshot = self.storage.catalog.snapshot()?;
        self.resolve_template(&snapshot, source_id, income)
    }

    /// Preview, then create the missing categories and apply the account
    /// deposits and category assignments in one step
    ///
    /// A category name shared by several templates of one account is created
    /// once. If any target is missing, no category is created.
    pub fn execute_template(
        &self,
        source_id: IncomeSourceId,
        income: Money,
    ) -> WaterfallResult<TemplatePlan> {
        let mut plan = self.preview_template(source_id, income)?;

        let mut created: HashMap<(AccountId, String), CategoryId> = HashMap::new();
        let mut categories = Vec::new();
        for share in &mut plan.accounts {
            for line in share.categories.iter_mut().filter(|c| c.category_id.is_none()) {
                let key = (share.account_id, line.category_name.trim().to_lowercase());
                let id = match created.get(&key) {
                    Some(id) => *id,
                    None => {
                        let category = Category::new(line.category_name.trim(), share.budget_id)
                            .for_account(share.account_id);
                        category
                            .validate()
                            .map_err(|e| WaterfallError::Validation(e.to_string()))?;
                        created.insert(key, category.id);
                        let id = category.id;
                        categories.push(category);
                        id
                    }
                };
                line.category_id = Some(id);
            }
        }

        let results = template_results(&plan);
        self.storage.apply_with_categories(categories, &results)?;
        info!(source = %source_id, income = %income, created = created.len(), "template executed");
        Ok(plan)
    }

    fn resolve_template(
        &self,
        snapshot: &CatalogSnapshot,
        source_id: IncomeSourceId,
        income: Money,
    ) -> WaterfallResult<TemplatePlan> {
        let splits = self.storage.list_rules(RuleOwner::IncomeSource(source_id))?;
        let templates = self.storage.list_category_templates(source_id)?;
        TemplateResolver::new(snapshot).resolve(source_id, &splits, &templates, income)
    }
}

/// Flatten a plan into applier input: each account deposit followed by the
/// category assignments made from it
///
/// Category lines are attributed to the account split rule that funded them.
fn template_results(plan: &TemplatePlan) -> Vec<AllocationResult> {
    let mut results = Vec::new();
    for share in &plan.accounts {
        results.push(share.split.clone());
        for line in &share.categories {
            if let Some(id) = line.category_id {
                results.push(AllocationResult::new(
                    ResultTarget::Category(id),
                    line.category_name.clone(),
                    line.amount,
                    share.split.rule_id,
                ));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::config::paths::WaterfallPaths;
    use crate::models::{
        Account, AllocationMethod, BudgetId, Category, CategoryTemplate, Goal, IncomeSource,
        OverflowTarget, PaycheckPlan, Percentage, RecurringCharge, Rule, RuleTarget, UserId,
    };
    use crate::services::RuleService;
    use crate::storage::{CatalogData, RuleSet};
    use tempfile::TempDir;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    struct Fixture {
        _temp: TempDir,
        storage: Storage,
        settings: Settings,
        budget: BudgetId,
        user: UserId,
        checking: Account,
        savings: Account,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let paths = WaterfallPaths::with_base_dir(temp.path().to_path_buf());
            let mut storage = Storage::new(paths).unwrap();
            storage.load_all().unwrap();

            let budget = BudgetId::new();
            let user = UserId::new();
            Self {
                checking: Account::new("Checking", budget, user),
                savings: Account::new("Savings", budget, user),
                _temp: temp,
                storage,
                settings: Settings::default(),
                budget,
                user,
            }
        }

        fn catalog(&self, mut data: CatalogData) {
            data.accounts.push(self.checking.clone());
            data.accounts.push(self.savings.clone());
            self.storage.catalog.replace(data).unwrap();
        }

        fn load(&self, rules: Vec<Rule>, templates: Vec<CategoryTemplate>) {
            RuleService::new(&self.storage)
                .load(RuleSet { rules, templates })
                .unwrap();
        }

        fn service(&self) -> WaterfallService<'_> {
            WaterfallService::new(&self.storage, &self.settings)
        }
    }

    #[test]
    fn test_allocation_preview_does_not_mutate() {
        let fx = Fixture::new();
        let rent = Category::new("Rent", fx.budget);
        fx.catalog(CatalogData {
            categories: vec![rent.clone()],
            ..Default::default()
        });
        let owner = RuleOwner::Account(fx.checking.id);
        fx.load(
            vec![Rule::new(owner, 0, RuleTarget::Category { id: rent.id }, AllocationMethod::fixed(cents(800)))],
            vec![],
        );

        let resolution = fx
            .service()
            .preview_allocation(fx.checking.id, cents(1_000), RunDate::new(date(1)))
            .unwrap();
        assert_eq!(resolution.results[0].amount.cents(), 800);
        assert_eq!(resolution.remaining.cents(), 200);

        let snapshot = fx.storage.catalog.snapshot().unwrap();
        assert_eq!(snapshot.get_category(rent.id).unwrap().current, Money::zero());
    }

    #[test]
    fn test_allocation_execute_applies_overflow() {
        let fx = Fixture::new();
        let fun = Category::new("Fun", fx.budget);
        let goal = Goal::new("Vacation", fx.user, cents(500)).with_current(cents(400));
        fx.catalog(CatalogData {
            categories: vec![fun.clone()],
            goals: vec![goal.clone()],
            ..Default::default()
        });
        let owner = RuleOwner::Account(fx.checking.id);
        fx.load(
            vec![Rule::new(
                owner,
                0,
                RuleTarget::Goal {
                    id: goal.id,
                    overflow: Some(OverflowTarget::Category(fun.id)),
                },
                AllocationMethod::fixed(cents(300)),
            )],
            vec![],
        );

        fx.service()
            .execute_allocation(fx.checking.id, cents(1_000), RunDate::new(date(1)))
            .unwrap();

        let snapshot = fx.storage.catalog.snapshot().unwrap();
        assert_eq!(snapshot.get_goal(goal.id).unwrap().current.cents(), 500);
        assert_eq!(snapshot.get_category(fun.id).unwrap().current.cents(), 200);
    }

    #[test]
    fn test_allocation_uses_next_pay_window() {
        let fx = Fixture::new();
        let streaming = Category::new("Streaming", fx.budget);
        let charge = RecurringCharge::new("Netflix", fx.user, Some(streaming.id), cents(1_500), date(20));
        fx.catalog(CatalogData {
            categories: vec![streaming.clone()],
            charges: vec![charge],
            ..Default::default()
        });
        let owner = RuleOwner::Account(fx.checking.id);
        fx.load(
            vec![Rule::new(
                owner,
                0,
                RuleTarget::Category { id: streaming.id },
                AllocationMethod::fixed(cents(100)),
            )
            .due_date_aware()],
            vec![],
        );

        let service = fx.service();
        let default_window = service
            .preview_allocation(fx.checking.id, cents(5_000), RunDate::new(date(1)))
            .unwrap();
        assert!(default_window.results.iter().all(|r| r.due_date.is_none()));

        let until_payday = service
            .preview_allocation(
                fx.checking.id,
                cents(5_000),
                RunDate::new(date(1)).with_next_pay(Some(date(25))),
            )
            .unwrap();
        assert_eq!(until_payday.results[0].amount.cents(), 1_500);
        assert_eq!(until_payday.results[0].due_date, Some(date(20)));
    }

    #[test]
    fn test_no_rules_is_reported() {
        let fx = Fixture::new();
        fx.catalog(CatalogData::default());
        let err = fx
            .service()
            .preview_allocation(fx.checking.id, cents(100), RunDate::new(date(1)))
            .unwrap_err();
        assert!(err.is_no_rules());
    }

    #[test]
    fn test_negative_total_rejected() {
        let fx = Fixture::new();
        fx.catalog(CatalogData::default());
        let err = fx
            .service()
            .preview_allocation(fx.checking.id, cents(-1), RunDate::new(date(1)))
            .unwrap_err();
        assert!(matches!(err, WaterfallError::Validation(_)));
    }

    #[test]
    fn test_distribution_execute_deposits() {
        let fx = Fixture::new();
        let plan = PaycheckPlan::new("Biweekly", fx.user);
        fx.catalog(CatalogData {
            paycheck_plans: vec![plan.clone()],
            ..Default::default()
        });
        let owner = RuleOwner::PaycheckPlan(plan.id);
        fx.load(
            vec![
                Rule::new(owner, 0, RuleTarget::Account { id: fx.savings.id }, AllocationMethod::percentage(Percentage::from_percent(25))),
                Rule::new(owner, 1, RuleTarget::Account { id: fx.checking.id }, AllocationMethod::Remainder),
            ],
            vec![],
        );

        let resolution = fx.service().execute_distribution(plan.id, cents(2_000)).unwrap();
        assert_eq!(resolution.remaining, Money::zero());

        let snapshot = fx.storage.catalog.snapshot().unwrap();
        assert_eq!(snapshot.get_account(fx.savings.id).unwrap().balance.cents(), 500);
        assert_eq!(snapshot.get_account(fx.checking.id).unwrap().balance.cents(), 1_500);
    }

    #[test]
    fn test_template_execute_creates_categories_once() {
        let fx = Fixture::new();
        let source = IncomeSource::new("Payroll", fx.user);
        fx.catalog(CatalogData {
            income_sources: vec![source.clone()],
            ..Default::default()
        });
        let owner = RuleOwner::IncomeSource(source.id);
        let split = Rule::new(owner, 0, RuleTarget::Account { id: fx.checking.id }, AllocationMethod::Remainder);
        fx.load(
            vec![split.clone()],
            vec![
                CategoryTemplate::new(source.id, Some(split.id), 0, "Groceries", AllocationMethod::fixed(cents(300))),
                CategoryTemplate::new(source.id, None, 1, "groceries", AllocationMethod::fixed(cents(200))),
            ],
        );

        let service = fx.service();
        let preview = service.preview_template(source.id, cents(1_000)).unwrap();
        assert_eq!(preview.missing_categories().count(), 2);
        assert!(fx.storage.catalog.snapshot().unwrap().categories.is_empty());

        let plan = service.execute_template(source.id, cents(1_000)).unwrap();
        let ids: Vec<_> = plan.accounts[0].categories.iter().map(|c| c.category_id).collect();
        assert_eq!(ids[0], ids[1]);

        let snapshot = fx.storage.catalog.snapshot().unwrap();
        assert_eq!(snapshot.categories.len(), 1);
        assert_eq!(snapshot.categories[0].current.cents(), 500);
        assert_eq!(snapshot.categories[0].account_id, Some(fx.checking.id));
        assert_eq!(snapshot.get_account(fx.checking.id).unwrap().balance.cents(), 1_000);

        let creates = fx
            .storage
            .audit()
            .read_all()
            .unwrap()
            .into_iter()
            .filter(|e| e.operation == Operation::Create && e.entity_type == crate::audit::EntityType::Category)
            .count();
        assert_eq!(creates, 1);

        let again = service.preview_template(source.id, cents(1_000)).unwrap();
        assert_eq!(again.missing_categories().count(), 0);
    }

    #[test]
    fn test_template_execute_reuses_non_ascii_category() {
        let fx = Fixture::new();
        let source = IncomeSource::new("Payroll", fx.user);
        let savings = Category::new("Épargne", fx.budget);
        fx.catalog(CatalogData {
            categories: vec![savings.clone()],
            income_sources: vec![source.clone()],
            ..Default::default()
        });
        let owner = RuleOwner::IncomeSource(source.id);
        let split = Rule::new(owner, 0, RuleTarget::Account { id: fx.checking.id }, AllocationMethod::Remainder);
        fx.load(
            vec![split],
            vec![CategoryTemplate::new(source.id, None, 0, "épargne", AllocationMethod::Remainder)],
        );

        let service = fx.service();
        let preview = service.preview_template(source.id, cents(400)).unwrap();
        assert_eq!(preview.missing_categories().count(), 0);

        service.execute_template(source.id, cents(400)).unwrap();
        let snapshot = fx.storage.catalog.snapshot().unwrap();
        assert_eq!(snapshot.categories.len(), 1);
        assert_eq!(snapshot.get_category(savings.id).unwrap().current.cents(), 400);
    }
}
