//! Shared types

pub mod error;

pub use error::{AdminError, Result};
