//! Display formatting for terminal output

pub mod resolution;
pub mod rules;
pub mod template;

pub use resolution::{format_execution_summary, format_resolution};
pub use rules::{format_rule_list, format_template_list};
pub use template::format_template_plan;
