//! Amount calculator and pool bookkeeping shared by every resolver

use crate::models::{AllocationMethod, Money};

/// Gross amount a rule claims before any capacity limit.
///
/// Percentages are taken of the original `total`, never of the shrinking
/// `remaining`, and every claim is capped at what is left. `Split` claims
/// nothing here; the allocation resolver spreads it across categories itself.
pub fn calculate_rule_amount(method: &AllocationMethod, remaining: Money, total: Money) -> Money {
    let remaining = remaining.non_negative();
    match method {
        AllocationMethod::Fixed { amount } => amount.non_negative().min(remaining),
        AllocationMethod::Percentage { percent } => percent.of(total).non_negative().min(remaining),
        AllocationMethod::Remainder => remaining,
        AllocationMethod::Split => Money::zero(),
    }
}

/// The money being resolved in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    total: Money,
    remaining: Money,
}

impl Pool {
    pub fn new(total: Money) -> Self {
        Self {
            total,
            remaining: total,
        }
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn remaining(&self) -> Money {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        !self.remaining.is_positive()
    }

    /// What `method` would claim right now
    pub fn claim(&self, method: &AllocationMethod) -> Money {
        calculate_rule_amount(method, self.remaining, self.total)
    }

    /// Remove an emitted amount from the pool
    pub fn take(&mut self, amount: Money) {
        self.remaining -= amount;
    }

    /// Empty the pool, returning what was in it
    pub fn drain(&mut self) -> Money {
        let rest = self.remaining.non_negative();
        self.remaining = Money::zero();
        rest
    }
}
