//! Custom error types for the waterfall engine
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for waterfall operations
#[derive(Error, Debug)]
pub enum WaterfallError {
    /// The owner has no rules yet; callers treat this as "not set up"
    #[error("No rules configured for {owner}")]
    NoRulesConfigured { owner: String },

    /// A rule failed write-time validation
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WaterfallError {
    /// Create a "no rules" error for the given owner
    pub fn no_rules(owner: impl ToString) -> Self {
        Self::NoRulesConfigured {
            owner: owner.to_string(),
        }
    }

    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for goals
    pub fn goal_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Goal",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for paycheck plans
    pub fn plan_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Paycheck plan",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for income sources
    pub fn income_source_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Income source",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "no rules configured" error
    pub fn is_no_rules(&self) -> bool {
        matches!(self, Self::NoRulesConfigured { .. })
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a rule validation error
    pub fn is_invalid_rule(&self) -> bool {
        matches!(self, Self::InvalidRule(_))
    }
}

impl From<std::io::Error> for WaterfallError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for WaterfallError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for waterfall operations
pub type WaterfallResult<T> = Result<T, WaterfallError>;
