//! Rule owners that are not accounts
//!
//! Paycheck plans own distribution rules and income sources own income
//! templates. Both are little more than a name to look rules up by.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{IncomeSourceId, PaycheckPlanId, UserId};

/// A recurring paycheck and how it is spread across accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaycheckPlan {
    pub id: PaycheckPlanId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl PaycheckPlan {
    pub fn new(name: impl Into<String>, user_id: UserId) -> Self {
        Self {
            id: PaycheckPlanId::new(),
            user_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Where income comes from; owns an income template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: IncomeSourceId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl IncomeSource {
    pub fn new(name: impl Into<String>, user_id: UserId) -> Self {
        Self {
            id: IncomeSourceId::new(),
            user_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}
