//! Envelope Waterfall - prioritized allocation for envelope budgets
//!
//! Money moves through ordered rules in three flavors:
//!
//! - **Allocation**: money leaving an account fills its categories and goals
//! - **Distribution**: a paycheck is spread across accounts
//! - **Templates**: an income source's account splits, then per-account
//!   category templates
//!
//! # Architecture
//!
//! - `engine`: pure resolvers over a catalog snapshot
//! - `models`: rules, targets, money and allocation results
//! - `storage`: JSON file storage for rules and the catalog
//! - `services`: rule validation on write, preview and execute
//! - `audit`: JSONL audit log of rule changes and applied balances
//! - `config`: paths and settings
//! - `cli` / `display`: command handlers and text formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use envelope_waterfall::config::{paths::WaterfallPaths, settings::Settings};
//!
//! let paths = WaterfallPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::WaterfallError;
