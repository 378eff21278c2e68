//! Resolution display formatting
//!
//! Formats allocation and distribution results as a table with the
//! unallocated advisory underneath.

use crate::models::{AllocationResult, Money, Resolution};

fn notes(result: &AllocationResult, symbol: &str) -> String {
    let mut notes = Vec::new();

    if let Some(due) = result.due_date {
        notes.push(format!("due {}", due.format("%Y-%m-%d")));
    }
    if let Some(overflow) = &result.overflow {
        let amount = overflow.amount.format_with_symbol(symbol);
        match &overflow.target_name {
            Some(name) => notes.push(format!("overflow {} -> {}", amount, name)),
            None => notes.push(format!("overflow {} kept in pool", amount)),
        }
    }

    notes.join("; ")
}

/// Format a resolution as a table
pub fn format_resolution(resolution: &Resolution, symbol: &str) -> String {
    let mut output = String::new();

    if resolution.results.is_empty() {
        output.push_str("No money was allocated.\n");
    } else {
        let name_width = resolution
            .results
            .iter()
            .map(|r| r.target_name.len())
            .max()
            .unwrap_or(6)
            .max(6);

        output.push_str(&format!(
            "{:<name_width$}  {:<11}  {:>12}  {}\n",
            "Target",
            "Type",
            "Amount",
            "Notes",
            name_width = name_width,
        ));
        output.push_str(&format!(
            "{:-<name_width$}  {:-<11}  {:->12}  {:-<10}\n",
            "",
            "",
            "",
            "",
            name_width = name_width,
        ));

        for result in &resolution.results {
            output.push_str(
                format!(
                    "{:<name_width$}  {:<11}  {:>12}  {}",
                    result.target_name,
                    result.target.type_name(),
                    result.amount.format_with_symbol(symbol),
                    notes(result, symbol),
                    name_width = name_width,
                )
                .trim_end(),
            );
            output.push('\n');
        }
    }

    let allocated: Money = resolution.disbursements().map(|r| r.amount).sum();
    output.push('\n');
    output.push_str(&format!(
        "Total:       {}\n",
        resolution.total.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Allocated:   {}\n",
        allocated.format_with_symbol(symbol)
    ));

    let unassigned = resolution.unassigned();
    if unassigned.is_positive() {
        output.push_str(&format!(
            "Unallocated: {} (not assigned to any target)\n",
            unassigned.format_with_symbol(symbol)
        ));
    }
    if resolution.dropped.is_positive() {
        output.push_str(&format!(
            "Dropped:     {} (uneven split remainder)\n",
            resolution.dropped.format_with_symbol(symbol)
        ));
    }

    output
}

/// One-line summary used after an execute
pub fn format_execution_summary(resolution: &Resolution, symbol: &str) -> String {
    let moved: Money = resolution.disbursements().map(|r| r.amount).sum();
    format!(
        "Applied {} across {} target(s).",
        moved.format_with_symbol(symbol),
        resolution.disbursements().count()
    )
}
