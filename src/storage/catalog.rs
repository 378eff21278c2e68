//! Catalog repository for JSON storage
//!
//! Holds everything rules point at (accounts, categories, goals, recurring
//! charges) plus the non-account rule owners, in catalog.json.

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::audit::{AuditEntry, EntityType};
use crate::engine::CatalogSnapshot;
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{
    Account, AccountId, AllocationResult, Category, Goal, IncomeSource, PaycheckPlan,
    RecurringCharge, ResultTarget,
};

use super::file_io::{read_json, write_json_atomic};

/// Serializable catalog data; also the document format accepted by
/// `catalog load`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub charges: Vec<RecurringCharge>,
    #[serde(default)]
    pub paycheck_plans: Vec<PaycheckPlan>,
    #[serde(default)]
    pub income_sources: Vec<IncomeSource>,
}

impl CatalogData {
    /// Copy of every target for one resolve call
    pub fn to_snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            accounts: self.accounts.clone(),
            categories: self.categories.clone(),
            goals: self.goals.clone(),
            charges: self.charges.clone(),
        }
    }

    /// Check every entity's own invariants
    pub fn validate(&self) -> WaterfallResult<()> {
        for account in &self.accounts {
            account
                .validate()
                .map_err(|e| WaterfallError::Validation(format!("account {}: {}", account.name, e)))?;
        }
        for category in &self.categories {
            category
                .validate()
                .map_err(|e| WaterfallError::Validation(format!("category {}: {}", category.name, e)))?;
        }
        for goal in &self.goals {
            goal.validate()
                .map_err(|e| WaterfallError::Validation(format!("goal {}: {}", goal.name, e)))?;
        }
        Ok(())
    }
}

/// Find an entity by id string or case-insensitive name
fn find_by<'a, T>(
    items: &'a [T],
    query: &str,
    id: impl Fn(&T) -> String,
    name: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let query = query.trim();
    items
        .iter()
        .find(|item| id(item) == query)
        .or_else(|| {
            let lower = query.to_lowercase();
            items.iter().find(|item| name(item).to_lowercase() == lower)
        })
}

/// Repository for catalog persistence
pub struct CatalogRepository {
    path: PathBuf,
    data: RwLock<CatalogData>,
}

impl CatalogRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(CatalogData::default()),
        }
    }

    fn read(&self) -> WaterfallResult<RwLockReadGuard<'_, CatalogData>> {
        self.data
            .read()
            .map_err(|e| WaterfallError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> WaterfallResult<RwLockWriteGuard<'_, CatalogData>> {
        self.data
            .write()
            .map_err(|e| WaterfallError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    pub fn load(&self) -> WaterfallResult<()> {
        let file_data: CatalogData = read_json(&self.path)?;
        *self.write()? = file_data;
        Ok(())
    }

    pub fn save(&self) -> WaterfallResult<()> {
        let data = self.read()?;
        write_json_atomic(&self.path, &*data)
    }

    pub fn snapshot(&self) -> WaterfallResult<CatalogSnapshot> {
        Ok(self.read()?.to_snapshot())
    }

    pub fn data(&self) -> WaterfallResult<CatalogData> {
        Ok(self.read()?.clone())
    }

    /// Replace the whole catalog
    pub fn replace(&self, data: CatalogData) -> WaterfallResult<()> {
        data.validate()?;
        *self.write()? = data;
        Ok(())
    }

    /// Get an account by id or name (case-insensitive)
    pub fn find_account(&self, query: &str) -> WaterfallResult<Option<Account>> {
        let data = self.read()?;
        Ok(find_by(&data.accounts, query, |a| a.id.as_uuid().to_string(), |a| &a.name).cloned())
    }

    pub fn find_paycheck_plan(&self, query: &str) -> WaterfallResult<Option<PaycheckPlan>> {
        let data = self.read()?;
        Ok(find_by(&data.paycheck_plans, query, |p| p.id.as_uuid().to_string(), |p| &p.name).cloned())
    }

    pub fn find_income_source(&self, query: &str) -> WaterfallResult<Option<IncomeSource>> {
        let data = self.read()?;
        Ok(find_by(&data.income_sources, query, |s| s.id.as_uuid().to_string(), |s| &s.name).cloned())
    }

    pub fn get_account(&self, id: AccountId) -> WaterfallResult<Option<Account>> {
        Ok(self.read()?.accounts.iter().find(|a| a.id == id).cloned())
    }

    /// Add every disbursement in `results` to its target's balance
    pub fn apply(&self, results: &[AllocationResult]) -> WaterfallResult<Vec<AuditEntry>> {
        self.apply_with_categories(Vec::new(), results)
    }

    /// Insert `categories`, then add every disbursement in `results` to its
    /// target's balance, under one write lock
    ///
    /// All targets are checked (new categories included) before anything is
    /// changed, so a missing target leaves the catalog untouched. Returns one
    /// audit entry per created category and per balance change.
    pub fn apply_with_categories(
        &self,
        categories: Vec<Category>,
        results: &[AllocationResult],
    ) -> WaterfallResult<Vec<AuditEntry>> {
        let mut data = self.write()?;
        let disbursements: Vec<&AllocationResult> = results
            .iter()
            .filter(|r| r.target != ResultTarget::Unallocated && r.amount.is_positive())
            .collect();

        for result in &disbursements {
            let exists = match result.target {
                ResultTarget::Category(id) => data
                    .categories
                    .iter()
                    .chain(categories.iter())
                    .any(|c| c.id == id),
                ResultTarget::Goal(id) => data.goals.iter().any(|g| g.id == id),
                ResultTarget::Account(id) => data.accounts.iter().any(|a| a.id == id),
                ResultTarget::Unallocated => true,
            };
            if !exists {
                return Err(WaterfallError::NotFound {
                    entity_type: "Target",
                    identifier: format!("{} {}", result.target.type_name(), result.target),
                });
            }
        }

        let mut entries = Vec::with_capacity(categories.len() + disbursements.len());
        for category in categories {
            entries.push(AuditEntry::create(
                EntityType::Category,
                category.id.to_string(),
                Some(category.name.clone()),
                &category,
            ));
            data.categories.push(category);
        }
        for result in disbursements {
            let entry = match result.target {
                ResultTarget::Category(id) => data
                    .categories
                    .iter_mut()
                    .find(|c| c.id == id)
                    .map(|category| {
                        let before = category.current;
                        category.assign(result.amount);
                        AuditEntry::apply(
                            EntityType::Category,
                            id.to_string(),
                            category.name.clone(),
                            result.rule_id,
                            before,
                            category.current,
                        )
                    }),
                ResultTarget::Goal(id) => data.goals.iter_mut().find(|g| g.id == id).map(|goal| {
                    let before = goal.current;
                    goal.contribute(result.amount);
                    AuditEntry::apply(
                        EntityType::Goal,
                        id.to_string(),
                        goal.name.clone(),
                        result.rule_id,
                        before,
                        goal.current,
                    )
                }),
                ResultTarget::Account(id) => {
                    data.accounts.iter_mut().find(|a| a.id == id).map(|account| {
                        let before = account.balance;
                        account.deposit(result.amount);
                        AuditEntry::apply(
                            EntityType::Account,
                            id.to_string(),
                            account.name.clone(),
                            result.rule_id,
                            before,
                            account.balance,
                        )
                    })
                }
                ResultTarget::Unallocated => None,
            };
            entries.extend(entry);
        }

        Ok(entries)
    }
}
