//! CLI command handlers
//!
//! Bridges clap argument parsing with the service layer.

pub mod catalog;
pub mod rules;
pub mod run;

pub use catalog::{handle_catalog_command, CatalogCommands};
pub use rules::{handle_rules_command, RulesCommands};
pub use run::{handle_allocate, handle_distribute, handle_template, DueArgs, RunArgs};

use clap::Args;

use crate::error::{WaterfallError, WaterfallResult};
use crate::models::RuleOwner;
use crate::storage::Storage;

/// Pick one rule owner by name or id
#[derive(Args, Default)]
pub struct OwnerArgs {
    /// Account name or ID
    #[arg(long, conflicts_with_all = ["plan", "income"])]
    pub account: Option<String>,
    /// Paycheck plan name or ID
    #[arg(long, conflicts_with = "income")]
    pub plan: Option<String>,
    /// Income source name or ID
    #[arg(long)]
    pub income: Option<String>,
}

/// Resolve the owner named by `args`, or `None` if none was given
pub fn resolve_owner(storage: &Storage, args: &OwnerArgs) -> WaterfallResult<Option<RuleOwner>> {
    if let Some(name) = &args.account {
        let account = storage
            .catalog
            .find_account(name)?
            .ok_or_else(|| WaterfallError::account_not_found(name))?;
        return Ok(Some(RuleOwner::Account(account.id)));
    }
    if let Some(name) = &args.plan {
        let plan = storage
            .catalog
            .find_paycheck_plan(name)?
            .ok_or_else(|| WaterfallError::plan_not_found(name))?;
        return Ok(Some(RuleOwner::PaycheckPlan(plan.id)));
    }
    if let Some(name) = &args.income {
        let source = storage
            .catalog
            .find_income_source(name)?
            .ok_or_else(|| WaterfallError::income_source_not_found(name))?;
        return Ok(Some(RuleOwner::IncomeSource(source.id)));
    }
    Ok(None)
}
