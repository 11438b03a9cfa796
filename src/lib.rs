//! MoodCycle admin API
//!
//! Backend for the content admin panel of the MoodCycle app: one editor
//! logs in, reads and edits the insight snippets, phase descriptions,
//! persona closings and vignettes kept as JSON documents on disk.
//!
//! ## Services
//!
//! - **Content**: whole-document read/merge/write over the data directory
//! - **Auth**: single admin credential, HS256 JWT sessions
//! - **Budget**: day/week/month spend guard for the companion chat service
//! - **Audit**: JSONL trail of logins, saves and tracked usage

pub mod auth;
pub mod budget;
pub mod config;
pub mod content;
pub mod logging;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AdminError, Result};
