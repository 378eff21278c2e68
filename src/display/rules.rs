//! Rule display formatting

use crate::engine::TargetCatalog;
use crate::models::{CategoryTemplate, OverflowTarget, Rule, RuleTarget};

fn target_label(target: &RuleTarget, catalog: &impl TargetCatalog) -> String {
    let missing = || "(missing)".to_string();
    match target {
        RuleTarget::Category { id } => catalog
            .get_category(*id)
            .map(|c| c.name.clone())
            .unwrap_or_else(missing),
        RuleTarget::Goal { id, overflow } => {
            let name = catalog
                .get_goal(*id)
                .map(|g| g.name.clone())
                .unwrap_or_else(missing);
            let overflow_name = overflow.map(|o| match o {
                OverflowTarget::Category(id) => catalog.get_category(id).map(|c| c.name.clone()),
                OverflowTarget::Goal(id) => catalog.get_goal(id).map(|g| g.name.clone()),
            });
            match overflow_name {
                Some(Some(o)) => format!("{} (overflow -> {})", name, o),
                Some(None) => format!("{} (overflow -> (missing))", name),
                None => name,
            }
        }
        RuleTarget::Account { id } => catalog
            .get_account(*id)
            .map(|a| a.name.clone())
            .unwrap_or_else(missing),
        RuleTarget::SplitRemaining => "planned categories".to_string(),
        RuleTarget::Unallocated => "unallocated".to_string(),
    }
}

/// Format an owner's rules in evaluation order
pub fn format_rule_list(rules: &[Rule], catalog: &impl TargetCatalog) -> String {
    if rules.is_empty() {
        return "No rules configured.".to_string();
    }

    let labels: Vec<String> = rules.iter().map(|r| target_label(&r.target, catalog)).collect();
    let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(6).max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>4}  {:<15}  {:<label_width$}  {:<12}  {}\n",
        "Pri",
        "Kind",
        "Target",
        "Method",
        "Flags",
        label_width = label_width,
    ));
    output.push_str(&format!(
        "{:->4}  {:-<15}  {:-<label_width$}  {:-<12}  {:-<5}\n",
        "",
        "",
        "",
        "",
        "",
        label_width = label_width,
    ));

    for (rule, label) in rules.iter().zip(labels) {
        let flags = if rule.due_date_aware { "due-aware" } else { "" };
        output.push_str(
            format!(
                "{:>4}  {:<15}  {:<label_width$}  {:<12}  {}",
                rule.priority,
                rule.target.type_name(),
                label,
                rule.method.to_string(),
                flags,
                label_width = label_width,
            )
            .trim_end(),
        );
        output.push('\n');
    }

    output
}

/// Format an income source's category templates
pub fn format_template_list(templates: &[CategoryTemplate]) -> String {
    if templates.is_empty() {
        return "No category templates.".to_string();
    }

    let mut output = String::from("Category templates:\n");
    for template in templates {
        let scope = match template.account_split {
            Some(split) => format!("split {}", split),
            None => "every account".to_string(),
        };
        output.push_str(&format!(
            "  {:>4}  {:<24} {:<12} {}\n",
            template.priority, template.category_name, template.method.to_string(), scope
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CatalogSnapshot;
    use crate::models::{
        AccountId, AllocationMethod, BudgetId, Category, CategoryId, Goal, IncomeSourceId, Money,
        Percentage, RuleOwner, UserId,
    };

    #[test]
    fn test_format_rule_list() {
        let rent = Category::new("Rent", BudgetId::new());
        let fun = Category::new("Fun", BudgetId::new());
        let goal = Goal::new("Vacation", UserId::new(), Money::from_cents(1_000));
        let snapshot = CatalogSnapshot {
            categories: vec![rent.clone(), fun.clone()],
            goals: vec![goal.clone()],
            ..Default::default()
        };
        let owner = RuleOwner::Account(AccountId::new());
        let rules = vec![
            Rule::new(owner, 0, RuleTarget::Category { id: rent.id }, AllocationMethod::fixed(Money::from_cents(120_000)))
                .due_date_aware(),
            Rule::new(
                owner,
                1,
                RuleTarget::Goal {
                    id: goal.id,
                    overflow: Some(OverflowTarget::Category(fun.id)),
                },
                AllocationMethod::percentage(Percentage::from_percent(10)),
            ),
            Rule::new(owner, 2, RuleTarget::Category { id: CategoryId::new() }, AllocationMethod::Remainder),
        ];

        let output = format_rule_list(&rules, &snapshot);
        assert!(output.contains("Rent"));
        assert!(output.contains("due-aware"));
        assert!(output.contains("Vacation (overflow -> Fun)"));
        assert!(output.contains("10%"));
        assert!(output.contains("(missing)"));
        assert!(output.contains("remainder"));
    }

    #[test]
    fn test_empty_lists() {
        let snapshot = CatalogSnapshot::default();
        assert_eq!(format_rule_list(&[], &snapshot), "No rules configured.");
        assert_eq!(format_template_list(&[]), "No category templates.");
    }

    #[test]
    fn test_template_list_scope() {
        let source = IncomeSourceId::new();
        let templates = vec![CategoryTemplate::new(source, None, 0, "Giving", AllocationMethod::Remainder)];
        let output = format_template_list(&templates);
        assert!(output.contains("Giving"));
        assert!(output.contains("every account"));
    }
}
