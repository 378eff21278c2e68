//! Income template display formatting

use crate::engine::TemplatePlan;

/// Format a two-level template plan
///
/// Lines for categories that did not exist are marked `(new)` in a preview
/// and `(created)` once executed.
pub fn format_template_plan(plan: &TemplatePlan, symbol: &str, executed: bool) -> String {
    let mut output = String::new();

    if plan.accounts.is_empty() {
        output.push_str("No account received any income.\n");
    }

    let marker = if executed { "(created)" } else { "(new)" };
    for share in &plan.accounts {
        output.push_str(&format!(
            "{}  {}\n",
            share.split.target_name,
            share.share().format_with_symbol(symbol)
        ));

        let count = share.categories.len();
        for (i, line) in share.categories.iter().enumerate() {
            let prefix = if i + 1 == count && !share.remaining.is_positive() {
                "└── "
            } else {
                "├── "
            };
            let flag = if line.exists { "" } else { marker };
            output.push_str(
                format!(
                    "  {}{:<24} {:>12} {}",
                    prefix,
                    line.category_name,
                    line.amount.format_with_symbol(symbol),
                    flag
                )
                .trim_end(),
            );
            output.push('\n');
        }
        if share.remaining.is_positive() {
            output.push_str(&format!(
                "  └── {:<24} {:>12}\n",
                "(unassigned)",
                share.remaining.format_with_symbol(symbol)
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "Income:      {}\n",
        plan.total.format_with_symbol(symbol)
    ));
    if plan.remaining.is_positive() {
        output.push_str(&format!(
            "Unallocated: {} (no account split claimed it)\n",
            plan.remaining.format_with_symbol(symbol)
        ));
    }

    output
}
