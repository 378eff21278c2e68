//! Storage layer
//!
//! JSON file storage with atomic writes. `Storage` is the concrete
//! collaborator behind the engine's traits: it serves rules, hands out
//! catalog snapshots and applies executed results.

pub mod catalog;
pub mod file_io;
pub mod init;
pub mod rules;

pub use catalog::{CatalogData, CatalogRepository};
pub use file_io::{read_json, read_json_required, write_json_atomic};
pub use init::initialize_storage;
pub use rules::{RuleRepository, RuleSet};

use tracing::info;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::WaterfallPaths;
use crate::engine::{ExecutionApplier, RuleSource};
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::{AllocationResult, Category, CategoryTemplate, IncomeSourceId, Rule, RuleOwner};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: WaterfallPaths,
    pub rules: RuleRepository,
    pub catalog: CatalogRepository,
    audit: AuditLogger,
}

impl Storage {
    pub fn new(paths: WaterfallPaths) -> Result<Self, WaterfallError> {
        paths.ensure_directories()?;

        Ok(Self {
            rules: RuleRepository::new(paths.rules_file()),
            catalog: CatalogRepository::new(paths.catalog_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &WaterfallPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), WaterfallError> {
        self.rules.load()?;
        self.catalog.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), WaterfallError> {
        self.rules.save()?;
        self.catalog.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    /// Append audit entries; an empty batch is a no-op
    pub fn log_audit(&self, entries: &[AuditEntry]) -> WaterfallResult<()> {
        self.audit.log_batch(entries)
    }
}

impl RuleSource for Storage {
    fn list_rules(&self, owner: RuleOwner) -> WaterfallResult<Vec<Rule>> {
        self.rules.list_for(owner)
    }

    fn list_category_templates(
        &self,
        source: IncomeSourceId,
    ) -> WaterfallResult<Vec<CategoryTemplate>> {
        self.rules.templates_for(source)
    }
}

impl ExecutionApplier for Storage {
    fn apply_with_categories(
        &self,
        categories: Vec<Category>,
        results: &[AllocationResult],
    ) -> WaterfallResult<()> {
        let created = categories.len();
        let entries = self.catalog.apply_with_categories(categories, results)?;
        self.catalog.save()?;
        self.audit.log_batch(&entries)?;
        info!(created, changes = entries.len() - created, "applied waterfall results");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::engine::TargetCatalog;
    use crate::models::{Account, BudgetId, Money, ResultTarget, RuleId, UserId};
    use tempfile::TempDir;

    fn create_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WaterfallPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_storage();
        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_apply_with_new_category() {
        let (_temp_dir, storage) = create_storage();
        let account = Account::new("Checking", BudgetId::new(), UserId::new());
        storage
            .catalog
            .replace(CatalogData {
                accounts: vec![account.clone()],
                ..Default::default()
            })
            .unwrap();

        let category = Category::new("Groceries", account.budget_id).for_account(account.id);
        let result = AllocationResult::new(
            ResultTarget::Category(category.id),
            "Groceries",
            Money::from_cents(300),
            RuleId::new(),
        );
        storage
            .apply_with_categories(vec![category.clone()], &[result])
            .unwrap();

        let snapshot = storage.catalog.snapshot().unwrap();
        assert_eq!(snapshot.get_category(category.id).unwrap().current.cents(), 300);

        let log = storage.audit().read_all().unwrap();
        let ops: Vec<_> = log.iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec![Operation::Create, Operation::Apply]);
    }

    #[test]
    fn test_apply_persists() {
        let (temp_dir, storage) = create_storage();
        let account = Account::new("Savings", BudgetId::new(), UserId::new());
        storage
            .catalog
            .replace(CatalogData {
                accounts: vec![account.clone()],
                ..Default::default()
            })
            .unwrap();

        let result = AllocationResult::new(
            ResultTarget::Account(account.id),
            "Savings",
            Money::from_cents(1_000),
            RuleId::new(),
        );
        storage.apply(&[result]).unwrap();

        let paths = WaterfallPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut reopened = Storage::new(paths).unwrap();
        reopened.load_all().unwrap();
        let saved = reopened.catalog.get_account(account.id).unwrap().unwrap();
        assert_eq!(saved.balance.cents(), 1_000);
    }
}
