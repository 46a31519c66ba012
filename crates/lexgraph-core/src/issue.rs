//! Validation issue taxonomy and the validation report.
//!
//! Validation findings are structured data, not exceptions: the validator
//! always returns a report, and the pipeline decides display/blocking from
//! it.

use serde::{Deserialize, Serialize};

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Closed catalog of validation issue kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A citation token resolves neither to the citation map nor the graph.
    InvalidCitation,
    /// A section-number surface form absent from the section index.
    FabricatedSection,
    /// A legal-claim phrase with no citation token in its window.
    UncitedClaim,
    /// Predictive or opinion phrasing about judicial outcomes.
    PredictiveLanguage,
    /// Reference outside the knowledge base (other acts, case law).
    HallucinatedContent,
    /// A quoted definition claim not supported by the context.
    UnverifiedDefinition,
    /// No disclaimer-type phrase present.
    MissingDisclaimer,
    /// "Section N states X" where X does not match the section text.
    ContentMismatch,
    /// Fewer citations than the audience minimum.
    InsufficientCitations,
    /// Too many claims per citation for the audience.
    LowCitationDensity,
    /// Claims failing the citation-constraint policy.
    UnsupportedClaims,
    /// Non-standard citation token format.
    CitationFormat,
    /// Response too brief to be useful.
    InsufficientResponse,
    /// Response well past the expected length.
    ExcessiveLength,
    /// Long response without list/header structure.
    StructureSuggestion,
    /// Context was empty but the response does not say so.
    MissingLimitationNotice,
    /// Response claims no information despite relevant context.
    UnnecessaryLimitation,
    /// Repeated sentences above the tolerated ratio.
    RepetitiveContent,
    /// Contradictory word pairs co-occur.
    Contradiction,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCitation => "invalid_citation",
            Self::FabricatedSection => "fabricated_section",
            Self::UncitedClaim => "uncited_claim",
            Self::PredictiveLanguage => "predictive_language",
            Self::HallucinatedContent => "hallucinated_content",
            Self::UnverifiedDefinition => "unverified_definition",
            Self::MissingDisclaimer => "missing_disclaimer",
            Self::ContentMismatch => "content_mismatch",
            Self::InsufficientCitations => "insufficient_citations",
            Self::LowCitationDensity => "low_citation_density",
            Self::UnsupportedClaims => "unsupported_claims",
            Self::CitationFormat => "citation_format",
            Self::InsufficientResponse => "insufficient_response",
            Self::ExcessiveLength => "excessive_length",
            Self::StructureSuggestion => "structure_suggestion",
            Self::MissingLimitationNotice => "missing_limitation_notice",
            Self::UnnecessaryLimitation => "unnecessary_limitation",
            Self::RepetitiveContent => "repetitive_content",
            Self::Contradiction => "contradiction",
        }
    }

    /// Kinds that invalidate a response outright when present at error
    /// severity. Everything else degrades confidence or flags review.
    pub fn blocks_display(&self) -> bool {
        matches!(
            self,
            Self::FabricatedSection | Self::HallucinatedContent | Self::PredictiveLanguage
        )
    }

    /// The only kind the pipeline may repair automatically. Correction must
    /// never alter or invent legal content; appending a disclaimer is the
    /// single enumerated exception.
    pub fn auto_correctable(&self) -> bool {
        matches!(self, Self::MissingDisclaimer)
    }
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Impact on the validator's confidence estimate, in [-1, 0].
    pub confidence_impact: f32,
}

impl ValidationIssue {
    pub fn new(severity: Severity, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            location: None,
            suggestion: None,
            confidence_impact: 0.0,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn impact(mut self, delta: f32) -> Self {
        self.confidence_impact = delta;
        self
    }
}

/// Result of validating one generated response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Validator's own confidence estimate in [0, 1].
    pub confidence: f32,
    pub issues: Vec<ValidationIssue>,
    pub citation_count: usize,
    pub unsupported_claims: Vec<String>,
    pub fabricated_references: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_text: Option<String>,
    pub requires_review: bool,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn issues_of_kind(&self, kind: IssueKind) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.kind == kind).collect()
    }

    /// Blocking means the generated text must not be shown as-is: either a
    /// corrected text is substituted or the caller falls back to a
    /// graph-only excerpt.
    pub fn blocks_display(&self) -> bool {
        !self.is_valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_kinds() {
        assert!(IssueKind::FabricatedSection.blocks_display());
        assert!(IssueKind::PredictiveLanguage.blocks_display());
        assert!(IssueKind::HallucinatedContent.blocks_display());
        assert!(!IssueKind::UncitedClaim.blocks_display());
        assert!(!IssueKind::MissingDisclaimer.blocks_display());
    }

    #[test]
    fn only_missing_disclaimer_is_auto_correctable() {
        assert!(IssueKind::MissingDisclaimer.auto_correctable());
        assert!(!IssueKind::FabricatedSection.auto_correctable());
        assert!(!IssueKind::ContentMismatch.auto_correctable());
    }

    #[test]
    fn builder_sets_optional_fields() {
        let issue = ValidationIssue::new(
            Severity::Error,
            IssueKind::FabricatedSection,
            "Section 9999 does not exist",
        )
        .at("chars 10-22")
        .suggest("Only reference sections present in the knowledge base")
        .impact(-0.4);
        assert_eq!(issue.location.as_deref(), Some("chars 10-22"));
        assert!((issue.confidence_impact + 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn report_issue_queries() {
        let report = ValidationReport {
            is_valid: false,
            confidence: 0.4,
            issues: vec![
                ValidationIssue::new(Severity::Error, IssueKind::FabricatedSection, "x"),
                ValidationIssue::new(Severity::Warning, IssueKind::UncitedClaim, "y"),
            ],
            citation_count: 0,
            unsupported_claims: vec![],
            fabricated_references: vec!["section 9999".into()],
            corrected_text: None,
            requires_review: true,
        };
        assert!(report.has_errors());
        assert!(report.has_warnings());
        assert_eq!(report.issues_of_kind(IssueKind::FabricatedSection).len(), 1);
        assert!(report.blocks_display());
    }
}
