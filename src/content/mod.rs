//! Content editing for the admin panel
//!
//! Insights, phases, persona closings and vignettes, each stored as one
//! JSON document.

pub mod insights;
pub mod merge;
pub mod models;
pub mod service;

pub use insights::BulkSaveSummary;
pub use models::{InsightStatus, Persona, PhaseId};
pub use service::{ContentService, InsightsView};
