use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

use envelope_waterfall::cli::{
    handle_allocate, handle_catalog_command, handle_distribute, handle_rules_command,
    handle_template, CatalogCommands, DueArgs, RulesCommands, RunArgs,
};
use envelope_waterfall::config::{paths::WaterfallPaths, settings::Settings};
use envelope_waterfall::error::WaterfallResult;
use envelope_waterfall::storage::Storage;

#[derive(Parser)]
#[command(
    name = "waterfall",
    author = "Kaylee Beyene",
    version,
    about = "Waterfall allocation for envelope budgets",
    long_about = "Runs money through prioritized rules: out of an account into its \
                  categories and goals, across accounts from a paycheck, or through \
                  an income source's account splits and category templates."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Show configuration
    Config,

    /// Rule management commands
    #[command(subcommand)]
    Rules(RulesCommands),

    /// Catalog commands (accounts, categories, goals, charges)
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Allocate money from an account into its categories and goals
    Allocate {
        /// Account name or ID
        account: String,
        #[command(flatten)]
        run: RunArgs,
        #[command(flatten)]
        due: DueArgs,
    },

    /// Distribute a paycheck across accounts
    Distribute {
        /// Paycheck plan name or ID
        plan: String,
        #[command(flatten)]
        run: RunArgs,
    },

    /// Run income through an income source's template
    Template {
        /// Income source name or ID
        source: String,
        #[command(flatten)]
        run: RunArgs,
    },
}

/// Turn "no rules" into a setup hint instead of a failure
fn or_setup_hint(result: WaterfallResult<()>) -> Result<()> {
    match result {
        Err(e) if e.is_no_rules() => {
            println!("{}.", e);
            println!();
            println!("Set up rules first with 'waterfall rules load <file>'.");
            Ok(())
        }
        other => Ok(other?),
    }
}

fn main() -> Result<()> {
    fn get_rust_log() -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into())
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(get_rust_log()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = WaterfallPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing waterfall at: {}", paths.base_dir().display());
            envelope_waterfall::storage::initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Next steps:");
            println!("  waterfall catalog load <catalog.json>");
            println!("  waterfall rules load <rules.json>");
        }
        Some(Commands::Config) => {
            println!("Waterfall Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol:       {}", settings.currency_symbol);
            println!("  Date format:           {}", settings.date_format);
            println!("  Due-soon lookahead:    {} days", settings.due_soon_lookahead_days);
        }
        Some(Commands::Rules(cmd)) => {
            handle_rules_command(&storage, cmd)?;
        }
        Some(Commands::Catalog(cmd)) => {
            handle_catalog_command(&storage, &settings.currency_symbol, cmd)?;
        }
        Some(Commands::Allocate { account, run, due }) => {
            or_setup_hint(handle_allocate(&storage, &settings, &account, run, due))?;
        }
        Some(Commands::Distribute { plan, run }) => {
            or_setup_hint(handle_distribute(&storage, &settings, &plan, run))?;
        }
        Some(Commands::Template { source, run }) => {
            or_setup_hint(handle_template(&storage, &settings, &source, run))?;
        }
        None => {
            println!("waterfall - prioritized allocation for envelope budgets");
            println!();
            println!("Run 'waterfall --help' for usage information.");
        }
    }

    Ok(())
}
