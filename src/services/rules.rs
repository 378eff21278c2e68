//! Rule service
//!
//! Write-time validation for rule sets and category templates. Everything
//! the resolvers later assume about a rule (sane method parameters, one
//! remainder per scope, compatible owner and target, goals owned by the right
//! user) is enforced here, so a bad rule never reaches storage.

use std::collections::HashSet;

use tracing::info;

use crate::audit::{AuditEntry, EntityType};
use crate::engine::TargetCatalog;
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{
    validate_rule_set, validate_template_set, CategoryTemplate, IncomeSourceId, OverflowTarget,
    Rule, RuleId, RuleOwner, RuleTarget, UserId,
};
use crate::storage::{CatalogData, RuleSet, Storage};

/// Service for rule management
pub struct RuleService<'a> {
    storage: &'a Storage,
}

/// Counts of what a load wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub owners: usize,
    pub rules: usize,
    pub templates: usize,
}

impl<'a> RuleService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Rules of one owner in evaluation order
    pub fn list(&self, owner: RuleOwner) -> WaterfallResult<Vec<Rule>> {
        self.storage.rules.list_for(owner)
    }

    pub fn list_templates(&self, source: IncomeSourceId) -> WaterfallResult<Vec<CategoryTemplate>> {
        self.storage.rules.templates_for(source)
    }

    /// Replace the rule list of `owner` after validating it
    pub fn set_rules(&self, owner: RuleOwner, rules: Vec<Rule>) -> WaterfallResult<Vec<Rule>> {
        let catalog = self.storage.catalog.data()?;
        check_rules(&catalog, owner, &rules)?;

        let removed = self.storage.rules.replace_rules(owner, rules.clone())?;
        self.storage.rules.save()?;
        self.storage.log_audit(&rule_audit(&removed, &rules))?;

        info!(%owner, rules = rules.len(), "rules replaced");
        Ok(rules)
    }

    /// Replace the category templates of `source` after validating them
    pub fn set_templates(
        &self,
        source: IncomeSourceId,
        templates: Vec<CategoryTemplate>,
    ) -> WaterfallResult<Vec<CategoryTemplate>> {
        let splits = self.storage.rules.list_for(RuleOwner::IncomeSource(source))?;
        check_templates(source, &splits, &templates)?;

        let removed = self.storage.rules.replace_templates(source, templates.clone())?;
        self.storage.rules.save()?;
        self.storage.log_audit(&template_audit(&removed, &templates))?;

        info!(%source, templates = templates.len(), "templates replaced");
        Ok(templates)
    }

    /// Validate and store a whole rule document
    ///
    /// Each owner named in the document has its rule list replaced; each
    /// income source named by a template has its templates replaced. Nothing
    /// is written unless the whole document is valid.
    pub fn load(&self, document: RuleSet) -> WaterfallResult<LoadSummary> {
        let catalog = self.storage.catalog.data()?;

        let mut owners: Vec<RuleOwner> = Vec::new();
        for rule in &document.rules {
            if !owners.contains(&rule.owner) {
                owners.push(rule.owner);
            }
        }
        let mut sources: Vec<IncomeSourceId> = Vec::new();
        for template in &document.templates {
            if !sources.contains(&template.income_source) {
                sources.push(template.income_source);
            }
        }

        let grouped: Vec<(RuleOwner, Vec<Rule>)> = owners
            .iter()
            .map(|&owner| {
                let rules = document
                    .rules
                    .iter()
                    .filter(|r| r.owner == owner)
                    .cloned()
                    .collect();
                (owner, rules)
            })
            .collect();
        for (owner, rules) in &grouped {
            check_rules(&catalog, *owner, rules)?;
        }

        let mut template_groups = Vec::with_capacity(sources.len());
        for source in sources {
            let owner = RuleOwner::IncomeSource(source);
            let splits = match grouped.iter().find(|(o, _)| *o == owner) {
                Some((_, rules)) => rules.clone(),
                None => self.storage.rules.list_for(owner)?,
            };
            let templates: Vec<CategoryTemplate> = document
                .templates
                .iter()
                .filter(|t| t.income_source == source)
                .cloned()
                .collect();
            check_templates(source, &splits, &templates)?;
            template_groups.push((source, templates));
        }

        let mut summary = LoadSummary {
            owners: grouped.len(),
            ..Default::default()
        };
        let mut entries = Vec::new();
        for (owner, rules) in grouped {
            summary.rules += rules.len();
            let removed = self.storage.rules.replace_rules(owner, rules.clone())?;
            entries.extend(rule_audit(&removed, &rules));
        }
        for (source, templates) in template_groups {
            summary.templates += templates.len();
            let removed = self.storage.rules.replace_templates(source, templates.clone())?;
            entries.extend(template_audit(&removed, &templates));
        }

        self.storage.rules.save()?;
        self.storage.log_audit(&entries)?;

        info!(owners = summary.owners, rules = summary.rules, templates = summary.templates, "rule document loaded");
        Ok(summary)
    }
}

fn invalid(context: impl std::fmt::Display, err: impl std::fmt::Display) -> WaterfallError {
    WaterfallError::InvalidRule(format!("{}: {}", context, err))
}

/// User whose goals an owner may target, checking the owner exists
fn owner_user(catalog: &CatalogData, owner: RuleOwner) -> WaterfallResult<UserId> {
    match owner {
        RuleOwner::Account(id) => catalog
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.user_id)
            .ok_or_else(|| WaterfallError::account_not_found(id.to_string())),
        RuleOwner::PaycheckPlan(id) => catalog
            .paycheck_plans
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.user_id)
            .ok_or_else(|| WaterfallError::plan_not_found(id.to_string())),
        RuleOwner::IncomeSource(id) => catalog
            .income_sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.user_id)
            .ok_or_else(|| WaterfallError::income_source_not_found(id.to_string())),
    }
}

fn check_rules(catalog: &CatalogData, owner: RuleOwner, rules: &[Rule]) -> WaterfallResult<()> {
    let user = owner_user(catalog, owner)?;

    if let Some(stray) = rules.iter().find(|r| r.owner != owner) {
        return Err(invalid(
            format!("rule {}", stray.id),
            format!("belongs to {}, not {}", stray.owner, owner),
        ));
    }

    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.id) {
            return Err(invalid(format!("rule {}", rule.id), "duplicate id"));
        }
    }

    validate_rule_set(rules).map_err(|e| invalid(owner, e))?;

    let snapshot = catalog.to_snapshot();
    let user_goals: HashSet<_> = snapshot.list_goals_for_user(user).iter().map(|g| g.id).collect();

    for rule in rules {
        let context = format!("rule {}", rule.id);
        match rule.target {
            RuleTarget::Category { id } => {
                if snapshot.get_category(id).is_none() {
                    return Err(invalid(context, format!("unknown category {}", id)));
                }
            }
            RuleTarget::Goal { id, overflow } => {
                if !user_goals.contains(&id) {
                    return Err(invalid(context, format!("goal {} does not belong to this user", id)));
                }
                match overflow {
                    Some(OverflowTarget::Goal(overflow_id)) if !user_goals.contains(&overflow_id) => {
                        return Err(invalid(
                            context,
                            format!("overflow goal {} does not belong to this user", overflow_id),
                        ));
                    }
                    Some(OverflowTarget::Category(category_id))
                        if snapshot.get_category(category_id).is_none() =>
                    {
                        return Err(invalid(context, format!("unknown overflow category {}", category_id)));
                    }
                    _ => {}
                }
            }
            RuleTarget::Account { id } => {
                if snapshot.get_account(id).is_none() {
                    return Err(invalid(context, format!("unknown account {}", id)));
                }
            }
            RuleTarget::SplitRemaining | RuleTarget::Unallocated => {}
        }
    }

    Ok(())
}

fn check_templates(
    source: IncomeSourceId,
    splits: &[Rule],
    templates: &[CategoryTemplate],
) -> WaterfallResult<()> {
    let split_ids: HashSet<RuleId> = splits.iter().map(|r| r.id).collect();

    for template in templates {
        let context = format!("template {}", template.id);
        if template.income_source != source {
            return Err(invalid(context, format!("belongs to income source {}", template.income_source)));
        }
        if let Some(split) = template.account_split {
            if !split_ids.contains(&split) {
                return Err(invalid(context, format!("unknown account split {}", split)));
            }
        }
    }

    validate_template_set(templates).map_err(|e| invalid(format!("income source {}", source), e))
}

fn rule_audit(removed: &[Rule], added: &[Rule]) -> Vec<AuditEntry> {
    removed
        .iter()
        .map(|r| AuditEntry::delete(EntityType::Rule, r.id.to_string(), None, r))
        .chain(
            added
                .iter()
                .map(|r| AuditEntry::create(EntityType::Rule, r.id.to_string(), None, r)),
        )
        .collect()
}

fn template_audit(removed: &[CategoryTemplate], added: &[CategoryTemplate]) -> Vec<AuditEntry> {
    let entry = |t: &CategoryTemplate, create: bool| {
        let name = Some(t.category_name.clone());
        if create {
            AuditEntry::create(EntityType::CategoryTemplate, t.id.to_string(), name, t)
        } else {
            AuditEntry::delete(EntityType::CategoryTemplate, t.id.to_string(), name, t)
        }
    };
    removed
        .iter()
        .map(|t| entry(t, false))
        .chain(added.iter().map(|t| entry(t, true)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::config::paths::WaterfallPaths;
    use crate::models::{
        Account, AllocationMethod, BudgetId, Category, Goal, IncomeSource, Money, Percentage,
    };
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        storage: Storage,
        account: Account,
        category: Category,
        goal: Goal,
        foreign_goal: Goal,
        source: IncomeSource,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let paths = WaterfallPaths::with_base_dir(temp.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let budget = BudgetId::new();
        let user = UserId::new();
        let account = Account::new("Checking", budget, user);
        let category = Category::new("Rent", budget);
        let goal = Goal::new("Vacation", user, Money::from_cents(50_000));
        let foreign_goal = Goal::new("Not Mine", UserId::new(), Money::from_cents(50_000));
        let source = IncomeSource::new("Payroll", user);

        storage
            .catalog
            .replace(CatalogData {
                accounts: vec![account.clone()],
                categories: vec![category.clone()],
                goals: vec![goal.clone(), foreign_goal.clone()],
                income_sources: vec![source.clone()],
                ..Default::default()
            })
            .unwrap();

        Fixture {
            _temp: temp,
            storage,
            account,
            category,
            goal,
            foreign_goal,
            source,
        }
    }

    fn fixed(cents: i64) -> AllocationMethod {
        AllocationMethod::fixed(Money::from_cents(cents))
    }

    #[test]
    fn test_set_rules_and_list() {
        let fx = fixture();
        let service = RuleService::new(&fx.storage);
        let owner = RuleOwner::Account(fx.account.id);

        let rules = vec![
            Rule::new(owner, 1, RuleTarget::Unallocated, AllocationMethod::Remainder),
            Rule::new(owner, 0, RuleTarget::Category { id: fx.category.id }, fixed(100)),
        ];
        service.set_rules(owner, rules).unwrap();

        let listed = service.list(owner).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].priority, 0);

        let log = fx.storage.audit().read_all().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e.operation == Operation::Create));
    }

    #[test]
    fn test_rejects_invalid_methods() {
        let fx = fixture();
        let service = RuleService::new(&fx.storage);
        let owner = RuleOwner::Account(fx.account.id);
        let target = RuleTarget::Category { id: fx.category.id };

        let negative = vec![Rule::new(owner, 0, target, fixed(-1))];
        assert!(service.set_rules(owner, negative).unwrap_err().is_invalid_rule());

        let over = vec![Rule::new(
            owner,
            0,
            target,
            AllocationMethod::percentage(Percentage::from_basis_points(10_001)),
        )];
        assert!(service.set_rules(owner, over).unwrap_err().is_invalid_rule());

        let two_remainders = vec![
            Rule::new(owner, 0, target, AllocationMethod::Remainder),
            Rule::new(owner, 1, RuleTarget::Unallocated, AllocationMethod::Remainder),
        ];
        assert!(service.set_rules(owner, two_remainders).unwrap_err().is_invalid_rule());

        assert!(service.list(owner).unwrap().is_empty());
    }

    #[test]
    fn test_goal_must_belong_to_account_user() {
        let fx = fixture();
        let service = RuleService::new(&fx.storage);
        let owner = RuleOwner::Account(fx.account.id);

        let mine = vec![Rule::new(
            owner,
            0,
            RuleTarget::Goal {
                id: fx.goal.id,
                overflow: None,
            },
            fixed(100),
        )];
        assert!(service.set_rules(owner, mine).is_ok());

        let theirs = vec![Rule::new(
            owner,
            0,
            RuleTarget::Goal {
                id: fx.foreign_goal.id,
                overflow: None,
            },
            fixed(100),
        )];
        assert!(service.set_rules(owner, theirs).unwrap_err().is_invalid_rule());

        let overflow_to_theirs = vec![Rule::new(
            owner,
            0,
            RuleTarget::Goal {
                id: fx.goal.id,
                overflow: Some(OverflowTarget::Goal(fx.foreign_goal.id)),
            },
            fixed(100),
        )];
        assert!(service
            .set_rules(owner, overflow_to_theirs)
            .unwrap_err()
            .is_invalid_rule());
    }

    #[test]
    fn test_unknown_owner_is_not_found() {
        let fx = fixture();
        let service = RuleService::new(&fx.storage);
        let owner = RuleOwner::Account(crate::models::AccountId::new());
        let err = service
            .set_rules(owner, vec![Rule::new(owner, 0, RuleTarget::Unallocated, fixed(1))])
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_document_with_templates() {
        let fx = fixture();
        let service = RuleService::new(&fx.storage);
        let source_owner = RuleOwner::IncomeSource(fx.source.id);
        let split = Rule::new(
            source_owner,
            0,
            RuleTarget::Account { id: fx.account.id },
            AllocationMethod::Remainder,
        );
        let document = RuleSet {
            templates: vec![
                CategoryTemplate::new(fx.source.id, Some(split.id), 0, "Groceries", fixed(200)),
                CategoryTemplate::new(fx.source.id, None, 1, "Fun", AllocationMethod::Remainder),
            ],
            rules: vec![split],
        };

        let summary = service.load(document).unwrap();
        assert_eq!(
            summary,
            LoadSummary {
                owners: 1,
                rules: 1,
                templates: 2
            }
        );
        assert_eq!(service.list_templates(fx.source.id).unwrap().len(), 2);
    }

    #[test]
    fn test_load_rejects_unknown_split_and_writes_nothing() {
        let fx = fixture();
        let service = RuleService::new(&fx.storage);
        let owner = RuleOwner::Account(fx.account.id);
        let document = RuleSet {
            rules: vec![Rule::new(owner, 0, RuleTarget::Unallocated, fixed(1))],
            templates: vec![CategoryTemplate::new(
                fx.source.id,
                Some(RuleId::new()),
                0,
                "Groceries",
                fixed(1),
            )],
        };

        assert!(service.load(document).unwrap_err().is_invalid_rule());
        assert!(service.list(owner).unwrap().is_empty());
    }
}
