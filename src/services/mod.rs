//! Service layer
//!
//! Business logic on top of storage: rule validation on write, and preview
//! or execute of the three waterfalls.

pub mod rules;
pub mod waterfall;

pub use rules::{LoadSummary, RuleService};
pub use waterfall::{RunDate, WaterfallService};
