//! Core data models
//!
//! Rules and templates (the user's waterfall configuration), the targets
//! money flows into, and the results a resolver run produces.

pub mod account;
pub mod allocation;
pub mod category;
pub mod charge;
pub mod goal;
pub mod ids;
pub mod money;
pub mod owner;
pub mod rule;

pub use account::Account;
pub use allocation::{AllocationResult, OverflowInfo, Resolution, ResultTarget};
pub use category::Category;
pub use charge::{DueCharge, RecurringCharge};
pub use goal::Goal;
pub use ids::{
    AccountId, BudgetId, CategoryId, ChargeId, GoalId, IncomeSourceId, PaycheckPlanId, RuleId,
    TemplateId, UserId,
};
pub use money::{Money, Percentage};
pub use owner::{IncomeSource, PaycheckPlan};
pub use rule::{
    validate_rule_set, validate_template_set, AllocationMethod, CategoryTemplate, OverflowTarget,
    Rule, RuleOwner, RuleTarget, RuleValidationError,
};
