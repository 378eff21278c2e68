//! Catalog CLI commands
//!
//! The catalog (accounts, categories, goals, recurring charges, paycheck
//! plans, income sources) is maintained elsewhere and loaded as a JSON
//! document.

use std::path::PathBuf;

use clap::Subcommand;

use crate::error::WaterfallResult;
use crate::storage::{read_json_required, CatalogData, Storage};

/// Catalog subcommands
#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Replace the catalog with a JSON document
    Load {
        /// Path to the JSON document
        file: PathBuf,
    },
    /// Show balances of everything rules can target
    Show,
}

/// Handle a catalog command
pub fn handle_catalog_command(
    storage: &Storage,
    symbol: &str,
    cmd: CatalogCommands,
) -> WaterfallResult<()> {
    match cmd {
        CatalogCommands::Load { file } => {
            let data: CatalogData = read_json_required(&file)?;
            let counts = (data.accounts.len(), data.categories.len(), data.goals.len());
            storage.catalog.replace(data)?;
            storage.catalog.save()?;
            println!(
                "Loaded catalog: {} accounts, {} categories, {} goals.",
                counts.0, counts.1, counts.2
            );
        }

        CatalogCommands::Show => {
            let data = storage.catalog.data()?;
            if data.accounts.is_empty() {
                println!("Catalog is empty.");
                println!();
                println!("Run 'waterfall catalog load <file>' to load one.");
                return Ok(());
            }

            println!("Accounts:");
            for account in &data.accounts {
                println!("  {:<24} {:>12}", account.name, account.balance.format_with_symbol(symbol));
            }

            if !data.categories.is_empty() {
                println!();
                println!("Categories:");
                for category in &data.categories {
                    let planned = category
                        .planned
                        .map(|p| format!(" of {}", p.format_with_symbol(symbol)))
                        .unwrap_or_default();
                    println!(
                        "  {:<24} {:>12}{}",
                        category.name,
                        category.current.format_with_symbol(symbol),
                        planned
                    );
                }
            }

            if !data.goals.is_empty() {
                println!();
                println!("Goals:");
                for goal in &data.goals {
                    println!(
                        "  {:<24} {:>12} of {}",
                        goal.name,
                        goal.current.format_with_symbol(symbol),
                        goal.target_amount.format_with_symbol(symbol)
                    );
                }
            }
        }
    }

    Ok(())
}
