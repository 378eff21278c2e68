//! Rule repository for JSON storage
//!
//! Manages loading and saving rules and category templates to rules.json.
//! Both are kept as plain vectors so that insertion order survives a round
//! trip; evaluation order ties are broken by it.

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::engine::RuleSource;
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{CategoryTemplate, IncomeSourceId, Rule, RuleId, RuleOwner};

use super::file_io::{read_json, write_json_atomic};

/// Serializable rule data; also the document format accepted by `rules load`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub templates: Vec<CategoryTemplate>,
}

/// Repository for rule persistence
pub struct RuleRepository {
    path: PathBuf,
    data: RwLock<RuleSet>,
}

impl RuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(RuleSet::default()),
        }
    }

    fn read(&self) -> WaterfallResult<RwLockReadGuard<'_, RuleSet>> {
        self.data
            .read()
            .map_err(|e| WaterfallError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> WaterfallResult<RwLockWriteGuard<'_, RuleSet>> {
        self.data
            .write()
            .map_err(|e| WaterfallError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    pub fn load(&self) -> WaterfallResult<()> {
        let file_data: RuleSet = read_json(&self.path)?;
        *self.write()? = file_data;
        Ok(())
    }

    pub fn save(&self) -> WaterfallResult<()> {
        let data = self.read()?;
        write_json_atomic(&self.path, &*data)
    }

    /// Rules of one owner, priority ascending, ties in insertion order
    pub fn list_for(&self, owner: RuleOwner) -> WaterfallResult<Vec<Rule>> {
        let data = self.read()?;
        let mut rules: Vec<Rule> = data
            .rules
            .iter()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.priority);
        Ok(rules)
    }

    /// Category templates of one income source, ordered like rules
    pub fn templates_for(&self, source: IncomeSourceId) -> WaterfallResult<Vec<CategoryTemplate>> {
        let data = self.read()?;
        let mut templates: Vec<CategoryTemplate> = data
            .templates
            .iter()
            .filter(|t| t.income_source == source)
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.priority);
        Ok(templates)
    }

    pub fn get(&self, id: RuleId) -> WaterfallResult<Option<Rule>> {
        Ok(self.read()?.rules.iter().find(|r| r.id == id).cloned())
    }

    /// Every stored owner, in order of first appearance
    pub fn owners(&self) -> WaterfallResult<Vec<RuleOwner>> {
        let data = self.read()?;
        let mut owners = Vec::new();
        for rule in &data.rules {
            if !owners.contains(&rule.owner) {
                owners.push(rule.owner);
            }
        }
        Ok(owners)
    }

    /// Replace the whole rule list of `owner`, returning the rules removed
    pub fn replace_rules(&self, owner: RuleOwner, rules: Vec<Rule>) -> WaterfallResult<Vec<Rule>> {
        let mut data = self.write()?;
        let (removed, kept): (Vec<Rule>, Vec<Rule>) =
            data.rules.drain(..).partition(|r| r.owner == owner);
        data.rules = kept;
        data.rules.extend(rules);
        Ok(removed)
    }

    /// Replace every template of `source`, returning the templates removed
    pub fn replace_templates(
        &self,
        source: IncomeSourceId,
        templates: Vec<CategoryTemplate>,
    ) -> WaterfallResult<Vec<CategoryTemplate>> {
        let mut data = self.write()?;
        let (removed, kept): (Vec<CategoryTemplate>, Vec<CategoryTemplate>) =
            data.templates.drain(..).partition(|t| t.income_source == source);
        data.templates = kept;
        data.templates.extend(templates);
        Ok(removed)
    }

    pub fn count(&self) -> WaterfallResult<(usize, usize)> {
        let data = self.read()?;
        Ok((data.rules.len(), data.templates.len()))
    }
}

impl RuleSource for RuleRepository {
    fn list_rules(&self, owner: RuleOwner) -> WaterfallResult<Vec<Rule>> {
        self.list_for(owner)
    }

    fn list_category_templates(
        &self,
        source: IncomeSourceId,
    ) -> WaterfallResult<Vec<CategoryTemplate>> {
        self.templates_for(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AccountId, AllocationMethod, CategoryId, Money, PaycheckPlanId, RuleTarget,
    };
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, RuleRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = RuleRepository::new(temp_dir.path().join("rules.json"));
        (temp_dir, repo)
    }

    fn category_rule(owner: RuleOwner, priority: i32) -> Rule {
        Rule::new(
            owner,
            priority,
            RuleTarget::Category {
                id: CategoryId::new(),
            },
            AllocationMethod::fixed(Money::from_cents(100)),
        )
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), (0, 0));
    }

    #[test]
    fn test_list_orders_by_priority_then_insertion() {
        let (_temp_dir, repo) = create_test_repo();
        let owner = RuleOwner::Account(AccountId::new());
        let rules = vec![
            category_rule(owner, 5),
            category_rule(owner, 1),
            category_rule(owner, 5),
        ];
        let ids: Vec<_> = rules.iter().map(|r| r.id).collect();

        repo.replace_rules(owner, rules).unwrap();

        let listed: Vec<_> = repo.list_for(owner).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn test_replace_only_touches_owner() {
        let (_temp_dir, repo) = create_test_repo();
        let a = RuleOwner::Account(AccountId::new());
        let b = RuleOwner::PaycheckPlan(PaycheckPlanId::new());

        repo.replace_rules(a, vec![category_rule(a, 0)]).unwrap();
        repo.replace_rules(b, vec![category_rule(b, 0), category_rule(b, 1)])
            .unwrap();

        let removed = repo.replace_rules(a, vec![category_rule(a, 3)]).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(repo.list_for(a).unwrap()[0].priority, 3);
        assert_eq!(repo.list_for(b).unwrap().len(), 2);
        assert_eq!(repo.owners().unwrap(), vec![b, a]);
    }

    #[test]
    fn test_save_and_reload_keeps_order() {
        let (temp_dir, repo) = create_test_repo();
        let owner = RuleOwner::Account(AccountId::new());
        let rules = vec![category_rule(owner, 0), category_rule(owner, 0)];
        let ids: Vec<_> = rules.iter().map(|r| r.id).collect();

        repo.replace_rules(owner, rules).unwrap();
        repo.save().unwrap();

        let reloaded = RuleRepository::new(temp_dir.path().join("rules.json"));
        reloaded.load().unwrap();
        let listed: Vec<_> = reloaded.list_rules(owner).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(listed, ids);
        assert!(reloaded.get(ids[0]).unwrap().is_some());
    }
}
