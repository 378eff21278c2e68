//! Waterfall rule models
//!
//! A rule is a closed tagged union of what it targets and how it computes its
//! claim. Rules belong to exactly one owner: an account (allocation), a
//! paycheck plan (distribution) or an income source (template account
//! splits). Category templates are the second level of an income template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, GoalId, IncomeSourceId, PaycheckPlanId, RuleId, TemplateId};
use super::money::{Money, Percentage};

/// Who a rule set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RuleOwner {
    Account(AccountId),
    PaycheckPlan(PaycheckPlanId),
    IncomeSource(IncomeSourceId),
}

impl RuleOwner {
    /// Short label for the kind of owner
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Account(_) => "account",
            Self::PaycheckPlan(_) => "paycheck plan",
            Self::IncomeSource(_) => "income source",
        }
    }
}

impl fmt::Display for RuleOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account {}", id),
            Self::PaycheckPlan(id) => write!(f, "paycheck plan {}", id),
            Self::IncomeSource(id) => write!(f, "income source {}", id),
        }
    }
}

/// Where a goal's excess goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum OverflowTarget {
    Category(CategoryId),
    Goal(GoalId),
}

/// What a rule sends money to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleTarget {
    Category {
        id: CategoryId,
    },
    Goal {
        id: GoalId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overflow: Option<OverflowTarget>,
    },
    Account {
        id: AccountId,
    },
    /// Evenly across every planned category not yet funded in this run
    SplitRemaining,
    /// Leave everything that is left unassigned and stop
    Unallocated,
}

impl RuleTarget {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Category { .. } => "category",
            Self::Goal { .. } => "goal",
            Self::Account { .. } => "account",
            Self::SplitRemaining => "split_remaining",
            Self::Unallocated => "unallocated",
        }
    }

    fn is_account(&self) -> bool {
        matches!(self, Self::Account { .. })
    }
}

/// How a rule computes its claim on the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationMethod {
    Fixed { amount: Money },
    Percentage { percent: Percentage },
    Remainder,
    Split,
}

impl AllocationMethod {
    pub fn fixed(amount: Money) -> Self {
        Self::Fixed { amount }
    }

    pub fn percentage(percent: Percentage) -> Self {
        Self::Percentage { percent }
    }

    pub fn is_remainder(&self) -> bool {
        matches!(self, Self::Remainder)
    }

    /// Check the method's own parameters
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        match self {
            Self::Fixed { amount } if amount.is_negative() => {
                Err(RuleValidationError::NegativeAmount(*amount))
            }
            Self::Percentage { percent } if !percent.is_valid() => {
                Err(RuleValidationError::PercentageOutOfRange(*percent))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { amount } => write!(f, "{}", amount),
            Self::Percentage { percent } => write!(f, "{}", percent),
            Self::Remainder => write!(f, "remainder"),
            Self::Split => write!(f, "split"),
        }
    }
}

/// One ordered instruction in a waterfall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: RuleId,
    pub owner: RuleOwner,
    /// Ascending; ties keep insertion order
    pub priority: i32,
    pub target: RuleTarget,
    pub method: AllocationMethod,
    #[serde(default)]
    pub due_date_aware: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(owner: RuleOwner, priority: i32, target: RuleTarget, method: AllocationMethod) -> Self {
        Self {
            id: RuleId::new(),
            owner,
            priority,
            target,
            method,
            due_date_aware: false,
            created_at: Utc::now(),
        }
    }

    /// Mark this rule as due-date aware
    pub fn due_date_aware(mut self) -> Self {
        self.due_date_aware = true;
        self
    }

    /// Validate the rule on its own
    ///
    /// Set-level checks (a single remainder rule per owner) live in
    /// [`validate_rule_set`].
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        self.method.validate()?;

        match (self.target, self.method) {
            (RuleTarget::SplitRemaining, AllocationMethod::Split) => {}
            (RuleTarget::SplitRemaining, _) | (_, AllocationMethod::Split) => {
                return Err(RuleValidationError::SplitMismatch);
            }
            _ => {}
        }

        if self.due_date_aware && !matches!(self.target, RuleTarget::Category { .. }) {
            return Err(RuleValidationError::DueDateAwareNonCategory);
        }

        let target_allowed = match self.owner {
            RuleOwner::Account(_) => !self.target.is_account(),
            RuleOwner::PaycheckPlan(_) | RuleOwner::IncomeSource(_) => self.target.is_account(),
        };
        if !target_allowed {
            return Err(RuleValidationError::TargetNotAllowed {
                owner: self.owner.kind(),
                target: self.target.type_name(),
            });
        }

        if let RuleTarget::Goal {
            id,
            overflow: Some(OverflowTarget::Goal(overflow_id)),
        } = self.target
        {
            if id == overflow_id {
                return Err(RuleValidationError::SelfOverflow);
            }
        }

        Ok(())
    }
}

/// Second-level rule of an income template: a named category inside one
/// account's share, or inside every account's share when `account_split` is
/// `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTemplate {
    #[serde(default)]
    pub id: TemplateId,
    pub income_source: IncomeSourceId,
    /// The account-split rule this template hangs off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_split: Option<RuleId>,
    pub priority: i32,
    pub category_name: String,
    pub method: AllocationMethod,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl CategoryTemplate {
    pub fn new(
        income_source: IncomeSourceId,
        account_split: Option<RuleId>,
        priority: i32,
        category_name: impl Into<String>,
        method: AllocationMethod,
    ) -> Self {
        Self {
            id: TemplateId::new(),
            income_source,
            account_split,
            priority,
            category_name: category_name.into(),
            method,
            created_at: Utc::now(),
        }
    }

    /// Whether this template takes part in the given account split's run
    pub fn applies_to(&self, split: RuleId) -> bool {
        self.account_split.map_or(true, |id| id == split)
    }

    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.category_name.trim().is_empty() {
            return Err(RuleValidationError::EmptyCategoryName);
        }
        if matches!(self.method, AllocationMethod::Split) {
            return Err(RuleValidationError::SplitMismatch);
        }
        self.method.validate()
    }
}

/// Validate a complete rule set for one owner
pub fn validate_rule_set(rules: &[Rule]) -> Result<(), RuleValidationError> {
    for rule in rules {
        rule.validate()?;
    }

    let remainders = rules.iter().filter(|r| r.method.is_remainder()).count();
    if remainders > 1 {
        return Err(RuleValidationError::DuplicateRemainder);
    }

    Ok(())
}

/// Validate all category templates of one income source
///
/// Each remainder template claims the rest of an account's share, so an
/// account run may see at most one: one per split-specific scope, and none
/// alongside a cross-cutting remainder.
pub fn validate_template_set(templates: &[CategoryTemplate]) -> Result<(), RuleValidationError> {
    for template in templates {
        template.validate()?;
    }

    let remainders: Vec<_> = templates
        .iter()
        .filter(|t| t.method.is_remainder())
        .map(|t| t.account_split)
        .collect();

    let cross_cutting = remainders.iter().filter(|s| s.is_none()).count();
    if cross_cutting > 1 || (cross_cutting == 1 && remainders.len() > 1) {
        return Err(RuleValidationError::DuplicateRemainder);
    }

    let mut scoped: Vec<RuleId> = remainders.into_iter().flatten().collect();
    let before = scoped.len();
    scoped.sort();
    scoped.dedup();
    if scoped.len() != before {
        return Err(RuleValidationError::DuplicateRemainder);
    }

    Ok(())
}

/// Validation errors for rules and templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    NegativeAmount(Money),
    PercentageOutOfRange(Percentage),
    DuplicateRemainder,
    SplitMismatch,
    DueDateAwareNonCategory,
    TargetNotAllowed {
        owner: &'static str,
        target: &'static str,
    },
    SelfOverflow,
    EmptyCategoryName,
}

impl fmt::Display for RuleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeAmount(amount) => write!(f, "Fixed amount cannot be negative ({})", amount),
            Self::PercentageOutOfRange(p) => {
                write!(f, "Percentage must be above 0% and at most 100% (got {})", p)
            }
            Self::DuplicateRemainder => write!(f, "Only one remainder rule is allowed"),
            Self::SplitMismatch => {
                write!(f, "Split allocation is only valid with a split-remaining target")
            }
            Self::DueDateAwareNonCategory => {
                write!(f, "Only category rules can be due-date aware")
            }
            Self::TargetNotAllowed { owner, target } => {
                write!(f, "A {} cannot have a {} rule", owner, target)
            }
            Self::SelfOverflow => write!(f, "A goal cannot overflow into itself"),
            Self::EmptyCategoryName => write!(f, "Template category name cannot be empty"),
        }
    }
}

impl std::error::Error for RuleValidationError {}
