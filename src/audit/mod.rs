//! Audit logging
//!
//! Rule writes, category creation and every balance change made by an
//! executed waterfall are appended to a JSONL audit log.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
