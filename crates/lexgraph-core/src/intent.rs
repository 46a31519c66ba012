//! Parsed query intent: category, extracted entities, and derived complexity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four query classifications driving retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    DefinitionLookup,
    SectionRetrieval,
    RightsQuery,
    ScenarioAnalysis,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefinitionLookup => "definition_lookup",
            Self::SectionRetrieval => "section_retrieval",
            Self::RightsQuery => "rights_query",
            Self::ScenarioAnalysis => "scenario_analysis",
        }
    }
}

/// Temporal qualifier detected in a query.
///
/// Detected and carried for explainability, but not consumed by retrieval —
/// the store holds a single instrument version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemporalQualifier {
    Year { year: u16 },
    Current,
}

/// Target audience for a response. Closed enumeration; invalid values are
/// rejected before a request enters the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Citizen,
    Lawyer,
    Judge,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Lawyer => "lawyer",
            Self::Judge => "judge",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown audience '{0}', expected one of: citizen, lawyer, judge")]
pub struct UnknownAudience(pub String);

impl FromStr for Audience {
    type Err = UnknownAudience;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citizen" => Ok(Self::Citizen),
            "lawyer" => Ok(Self::Lawyer),
            "judge" => Ok(Self::Judge),
            other => Err(UnknownAudience(other.to_string())),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived 3-level complexity label used for routing and explainability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

/// Intent extracted from a natural-language query.
///
/// Parsing never fails: unmatched input resolves to `ScenarioAnalysis` at
/// low confidence rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryIntent {
    pub category: IntentCategory,
    /// Generic entities: quoted substrings and capitalised phrases.
    pub entities: Vec<String>,
    /// Bare section numbers extracted from numeric-reference surface forms.
    pub section_numbers: Vec<String>,
    /// Matches against the fixed legal vocabulary.
    pub legal_terms: Vec<String>,
    /// Winning pattern match-ratio, in [0, 1].
    pub confidence: f32,
    pub original_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalQualifier>,
}

impl QueryIntent {
    /// Catch-all intent for unparseable input.
    pub fn fallback(query: impl Into<String>) -> Self {
        Self {
            category: IntentCategory::ScenarioAnalysis,
            entities: Vec::new(),
            section_numbers: Vec::new(),
            legal_terms: Vec::new(),
            confidence: 0.3,
            original_query: query.into(),
            temporal: None,
        }
    }

    /// Total count of specifically extracted entities (terms + sections).
    pub fn extracted_entity_count(&self) -> usize {
        self.legal_terms.len() + self.section_numbers.len()
    }

    /// Derive the complexity label from entity counts, category, temporal
    /// qualifier, and classification confidence.
    pub fn complexity(&self) -> Complexity {
        let mut score = 0u8;
        if self.entities.len() > 2 {
            score += 1;
        }
        if self.legal_terms.len() > 3 {
            score += 1;
        }
        if self.category == IntentCategory::ScenarioAnalysis {
            score += 2;
        }
        if self.temporal.is_some() {
            score += 1;
        }
        if self.confidence < 0.6 {
            score += 1;
        }
        match score {
            0..=1 => Complexity::Simple,
            2..=3 => Complexity::Moderate,
            _ => Complexity::Complex,
        }
    }
}
