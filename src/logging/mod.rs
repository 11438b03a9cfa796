//! Audit logging for the admin API

pub mod audit;

pub use audit::{AuditEvent, AuditLogger, EventType};
