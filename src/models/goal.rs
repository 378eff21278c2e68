//! Savings goal model
//!
//! Goals are the only capacity-bounded targets: once `current` reaches
//! `target_amount` any further claim is overflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{GoalId, UserId};
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Money,
    #[serde(default)]
    pub current: Money,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(name: impl Into<String>, user_id: UserId, target_amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            user_id,
            name: name.into(),
            target_amount,
            current: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_current(mut self, current: Money) -> Self {
        self.current = current;
        self
    }

    /// Room left before the goal is complete, never negative
    pub fn remaining_capacity(&self) -> Money {
        (self.target_amount - self.current).non_negative()
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.target_amount
    }

    /// Add a delta to the saved amount
    pub fn contribute(&mut self, amount: Money) {
        self.current += amount;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }
        if !self.target_amount.is_positive() {
            return Err(GoalValidationError::NonPositiveTarget);
        }
        Ok(())
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} / {})", self.name, self.current, self.target_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyName,
    NonPositiveTarget,
}

impl fmt::Display for GoalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Goal name cannot be empty"),
            Self::NonPositiveTarget => write!(f, "Goal target must be greater than zero"),
        }
    }
}

impl std::error::Error for GoalValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_capacity() {
        let goal = Goal::new("Vacation", UserId::new(), Money::from_cents(500))
            .with_current(Money::from_cents(400));
        assert_eq!(goal.remaining_capacity().cents(), 100);
        assert!(!goal.is_complete());

        let over = goal.clone().with_current(Money::from_cents(650));
        assert_eq!(over.remaining_capacity(), Money::zero());
        assert!(over.is_complete());
    }

    #[test]
    fn test_validation() {
        let goal = Goal::new("Car", UserId::new(), Money::zero());
        assert_eq!(goal.validate(), Err(GoalValidationError::NonPositiveTarget));

        let goal = Goal::new("", UserId::new(), Money::from_cents(1));
        assert_eq!(goal.validate(), Err(GoalValidationError::EmptyName));
    }
}
