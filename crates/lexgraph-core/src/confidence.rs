//! Confidence score types: component breakdown, discrete levels, and the
//! human-review decision.

use serde::{Deserialize, Serialize};

use crate::intent::{Audience, IntentCategory};

/// Discrete confidence tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryHigh => "very_high",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }
}

/// The six independently computed confidence components, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Fraction of extracted query entities found among retrieved nodes.
    pub graph_coverage: f32,
    /// Generated citations vs. detected legal claims, against audience targets.
    pub citation_density: f32,
    /// Multi-hop breadth, cross-references, logical connectives, contradictions.
    pub reasoning_chain: f32,
    /// Length fit, structure, sentence length, completeness, repetition.
    pub response_quality: f32,
    /// Whether retrieved sections belong to the supported instrument.
    pub temporal_validity: f32,
    /// Technical vs. simplifying phrase density per audience.
    pub audience_appropriateness: f32,
}

/// Per-audience weight vector over the six components. Weights sum to 1;
/// a zero weight means the component is ignored for that audience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub graph_coverage: f32,
    pub citation_density: f32,
    pub reasoning_chain: f32,
    pub response_quality: f32,
    pub temporal_validity: f32,
    pub audience_appropriateness: f32,
}

impl ComponentScores {
    /// Weighted average of the components, normalised by total weight.
    pub fn weighted_average(&self, weights: &ComponentWeights) -> f32 {
        let total = weights.graph_coverage
            + weights.citation_density
            + weights.reasoning_chain
            + weights.response_quality
            + weights.temporal_validity
            + weights.audience_appropriateness;
        if total == 0.0 {
            return 0.0;
        }
        let sum = self.graph_coverage * weights.graph_coverage
            + self.citation_density * weights.citation_density
            + self.reasoning_chain * weights.reasoning_chain
            + self.response_quality * weights.response_quality
            + self.temporal_validity * weights.temporal_validity
            + self.audience_appropriateness * weights.audience_appropriateness;
        sum / total
    }
}

/// Request-level facts recorded alongside the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreMetadata {
    pub audience: Audience,
    pub category: IntentCategory,
    pub nodes_retrieved: usize,
    pub citation_count: usize,
    pub context_length: usize,
    pub response_length: usize,
}

/// Complete confidence score for one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub overall: f32,
    pub components: ComponentScores,
    pub level: ConfidenceLevel,
    pub requires_review: bool,
    pub review_reasons: Vec<String>,
    pub metadata: ScoreMetadata,
}

impl ConfidenceReport {
    /// Responses in the bottom tier must not be auto-displayed.
    pub fn should_block_display(&self) -> bool {
        self.level == ConfidenceLevel::VeryLow
    }

    /// User-facing confidence message.
    pub fn display_message(&self) -> &'static str {
        match self.level {
            ConfidenceLevel::VeryHigh => {
                "High confidence response based on comprehensive legal sources."
            }
            ConfidenceLevel::High => {
                "Response based on available legal sources with good coverage."
            }
            ConfidenceLevel::Medium => {
                "Response based on limited legal sources. Please verify independently."
            }
            ConfidenceLevel::Low => {
                "Limited confidence due to incomplete information. Expert review recommended."
            }
            ConfidenceLevel::VeryLow => {
                "Very limited confidence. This response requires expert validation."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(v: f32) -> ComponentScores {
        ComponentScores {
            graph_coverage: v,
            citation_density: v,
            reasoning_chain: v,
            response_quality: v,
            temporal_validity: v,
            audience_appropriateness: v,
        }
    }

    #[test]
    fn weighted_average_of_uniform_scores() {
        let weights = ComponentWeights {
            graph_coverage: 0.25,
            citation_density: 0.20,
            reasoning_chain: 0.15,
            response_quality: 0.25,
            temporal_validity: 0.10,
            audience_appropriateness: 0.05,
        };
        let avg = flat(0.8).weighted_average(&weights);
        assert!((avg - 0.8).abs() < 1e-6);
    }

    #[test]
    fn zero_weights_yield_zero() {
        let weights = ComponentWeights {
            graph_coverage: 0.0,
            citation_density: 0.0,
            reasoning_chain: 0.0,
            response_quality: 0.0,
            temporal_validity: 0.0,
            audience_appropriateness: 0.0,
        };
        assert_eq!(flat(1.0).weighted_average(&weights), 0.0);
    }

    #[test]
    fn ignored_component_does_not_move_score() {
        // Judge weighting zeroes audience_appropriateness.
        let weights = ComponentWeights {
            graph_coverage: 0.35,
            citation_density: 0.35,
            reasoning_chain: 0.25,
            response_quality: 0.05,
            temporal_validity: 0.0,
            audience_appropriateness: 0.0,
        };
        let mut a = flat(0.9);
        let mut b = flat(0.9);
        a.audience_appropriateness = 0.0;
        b.audience_appropriateness = 1.0;
        assert_eq!(a.weighted_average(&weights), b.weighted_average(&weights));
    }

    #[test]
    fn levels_order_from_very_low_to_very_high() {
        assert!(ConfidenceLevel::VeryLow < ConfidenceLevel::Low);
        assert!(ConfidenceLevel::High < ConfidenceLevel::VeryHigh);
    }
}
