//! Identifiers shared by the content documents

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cycle phase ids, also the bucket keys of the insights document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseId {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl PhaseId {
    pub const ALL: [PhaseId; 4] = [
        PhaseId::Menstrual,
        PhaseId::Follicular,
        PhaseId::Ovulatory,
        PhaseId::Luteal,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menstrual => "menstrual",
            Self::Follicular => "follicular",
            Self::Ovulatory => "ovulatory",
            Self::Luteal => "luteal",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reader personas that content is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Emma,
    Laure,
    Sylvie,
    Christine,
    Clara,
}

impl Persona {
    pub const ALL: [Persona; 5] = [
        Persona::Emma,
        Persona::Laure,
        Persona::Sylvie,
        Persona::Christine,
        Persona::Clara,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emma => "emma",
            Self::Laure => "laure",
            Self::Sylvie => "sylvie",
            Self::Christine => "christine",
            Self::Clara => "clara",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editorial status of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    Draft,
    Enriched,
    Validated,
}

impl InsightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Enriched => "enriched",
            Self::Validated => "validated",
        }
    }
}
