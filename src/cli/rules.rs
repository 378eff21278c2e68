//! Rule CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use crate::display::{format_rule_list, format_template_list};
use crate::error::WaterfallResult;
use crate::models::RuleOwner;
use crate::services::RuleService;
use crate::storage::{read_json_required, RuleSet, Storage};

use super::{resolve_owner, OwnerArgs};

/// Rule subcommands
#[derive(Subcommand)]
pub enum RulesCommands {
    /// List rules, for one owner or for every owner
    List {
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Load a rule document (JSON with `rules` and `templates`)
    ///
    /// Every owner named in the document has its rules replaced. Amounts are
    /// in cents; percentages are 0-100 (e.g. `"percent": 30`).
    Load {
        /// Path to the JSON document
        file: PathBuf,
    },
}

/// Handle a rules command
pub fn handle_rules_command(storage: &Storage, cmd: RulesCommands) -> WaterfallResult<()> {
    let service = RuleService::new(storage);

    match cmd {
        RulesCommands::List { owner } => {
            let snapshot = storage.catalog.snapshot()?;
            let owners = match resolve_owner(storage, &owner)? {
                Some(owner) => vec![owner],
                None => storage.rules.owners()?,
            };

            if owners.is_empty() {
                println!("No rules configured.");
                println!();
                println!("Run 'waterfall rules load <file>' to set up rules.");
                return Ok(());
            }

            for (i, owner) in owners.into_iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("Rules for {}", owner_label(storage, owner)?);
                print!("{}", format_rule_list(&service.list(owner)?, &snapshot));
                if let RuleOwner::IncomeSource(source) = owner {
                    println!();
                    print!("{}", format_template_list(&service.list_templates(source)?));
                }
            }
        }

        RulesCommands::Load { file } => {
            let document: RuleSet = read_json_required(&file)?;
            let summary = service.load(document)?;
            println!(
                "Loaded {} rule(s) and {} template(s) for {} owner(s).",
                summary.rules, summary.templates, summary.owners
            );
        }
    }

    Ok(())
}

/// Owner name for headings, falling back to the id
fn owner_label(storage: &Storage, owner: RuleOwner) -> WaterfallResult<String> {
    let data = storage.catalog.data()?;
    let name = match owner {
        RuleOwner::Account(id) => data.accounts.iter().find(|a| a.id == id).map(|a| a.name.clone()),
        RuleOwner::PaycheckPlan(id) => data
            .paycheck_plans
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone()),
        RuleOwner::IncomeSource(id) => data
            .income_sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone()),
    };
    Ok(match name {
        Some(name) => format!("{} '{}'", owner.kind(), name),
        None => owner.to_string(),
    })
}
