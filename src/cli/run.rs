//! Waterfall run commands: allocate, distribute, template
//!
//! Each previews by default and only moves money with `--execute`.

use chrono::NaiveDate;
use clap::Args;

use crate::config::Settings;
use crate::display::{format_execution_summary, format_resolution, format_template_plan};
use crate::error::{WaterfallError, WaterfallResult};
use crate::models::Money;
use crate::services::{RunDate, WaterfallService};
use crate::storage::Storage;

/// Options shared by every run
#[derive(Args)]
pub struct RunArgs {
    /// Amount to run through the waterfall (e.g., "1500" or "1500.00")
    pub amount: String,
    /// Apply the results instead of previewing them
    #[arg(short, long)]
    pub execute: bool,
}

/// Due-soon window options, only meaningful for account allocations
#[derive(Args)]
pub struct DueArgs {
    /// Run date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<String>,
    /// Next pay date (YYYY-MM-DD); ends the due-soon window
    #[arg(long)]
    pub next_pay: Option<String>,
}

impl RunArgs {
    fn amount(&self) -> WaterfallResult<Money> {
        Money::parse(&self.amount).map_err(|e| {
            WaterfallError::Validation(format!(
                "Invalid amount: '{}'. Use format like '1500.00' or '1500'. Error: {}",
                self.amount, e
            ))
        })
    }
}

impl DueArgs {
    fn run_date(&self) -> WaterfallResult<RunDate> {
        let as_of = match &self.date {
            Some(date) => parse_date(date)?,
            None => chrono::Local::now().date_naive(),
        };
        let next_pay = self.next_pay.as_deref().map(parse_date).transpose()?;
        Ok(RunDate::new(as_of).with_next_pay(next_pay))
    }
}

fn parse_date(s: &str) -> WaterfallResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        WaterfallError::Validation(format!("Invalid date: '{}'. Use YYYY-MM-DD.", s))
    })
}

fn banner(execute: bool) {
    if !execute {
        println!("Preview only; run again with --execute to apply.");
        println!();
    }
}

/// Allocate money leaving an account into its categories and goals
pub fn handle_allocate(
    storage: &Storage,
    settings: &Settings,
    account: &str,
    args: RunArgs,
    due: DueArgs,
) -> WaterfallResult<()> {
    let account = storage
        .catalog
        .find_account(account)?
        .ok_or_else(|| WaterfallError::account_not_found(account))?;
    let amount = args.amount()?;
    let date = due.run_date()?;
    let service = WaterfallService::new(storage, settings);

    let resolution = if args.execute {
        service.execute_allocation(account.id, amount, date)?
    } else {
        service.preview_allocation(account.id, amount, date)?
    };

    banner(args.execute);
    println!("Allocation from {}", account.name);
    print!("{}", format_resolution(&resolution, &settings.currency_symbol));
    if args.execute {
        println!("{}", format_execution_summary(&resolution, &settings.currency_symbol));
    }
    Ok(())
}

/// Distribute a paycheck across accounts
pub fn handle_distribute(
    storage: &Storage,
    settings: &Settings,
    plan: &str,
    args: RunArgs,
) -> WaterfallResult<()> {
    let plan = storage
        .catalog
        .find_paycheck_plan(plan)?
        .ok_or_else(|| WaterfallError::plan_not_found(plan))?;
    let amount = args.amount()?;
    let service = WaterfallService::new(storage, settings);

    let resolution = if args.execute {
        service.execute_distribution(plan.id, amount)?
    } else {
        service.preview_distribution(plan.id, amount)?
    };

    banner(args.execute);
    println!("Distribution of {}", plan.name);
    print!("{}", format_resolution(&resolution, &settings.currency_symbol));
    if args.execute {
        println!("{}", format_execution_summary(&resolution, &settings.currency_symbol));
    }
    Ok(())
}

/// Apply an income template
pub fn handle_template(
    storage: &Storage,
    settings: &Settings,
    source: &str,
    args: RunArgs,
) -> WaterfallResult<()> {
    let source = storage
        .catalog
        .find_income_source(source)?
        .ok_or_else(|| WaterfallError::income_source_not_found(source))?;
    let amount = args.amount()?;
    let service = WaterfallService::new(storage, settings);

    let plan = if args.execute {
        service.execute_template(source.id, amount)?
    } else {
        service.preview_template(source.id, amount)?
    };

    banner(args.execute);
    println!("Income template for {}", source.name);
    print!(
        "{}",
        format_template_plan(&plan, &settings.currency_symbol, args.execute)
    );
    Ok(())
}
