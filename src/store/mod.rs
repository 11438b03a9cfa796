//! Document storage for admin content
//!
//! Each collection is one whole JSON document. Callers load it, edit it in
//! memory and save it back; the content service serializes that cycle per
//! collection.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::types::Result;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

/// The JSON documents edited through the admin API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Insights,
    Phases,
    Closings,
    Vignettes,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Insights,
        Collection::Phases,
        Collection::Closings,
        Collection::Vignettes,
    ];

    /// File name inside the data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Insights => "insights_validated.json",
            Self::Phases => "phases.json",
            Self::Closings => "persona-closings.json",
            Self::Vignettes => "vignettes.json",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Insights => 0,
            Self::Phases => 1,
            Self::Closings => 2,
            Self::Vignettes => 3,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Insights => "insights",
            Self::Phases => "phases",
            Self::Closings => "closings",
            Self::Vignettes => "vignettes",
        };
        f.write_str(name)
    }
}

/// Whole-document repository
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read and parse a collection's document
    async fn load(&self, collection: Collection) -> Result<Value>;

    /// Replace a collection's document
    async fn save(&self, collection: Collection, document: &Value) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(Collection::Insights.file_name(), "insights_validated.json");
        assert_eq!(Collection::Closings.file_name(), "persona-closings.json");
    }

    #[test]
    fn test_indexes_are_distinct() {
        let mut seen: Vec<usize> = Collection::ALL.iter().map(|c| c.index()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), Collection::ALL.len());
    }
}
