//! Multi-factor confidence scoring for generated responses.
//!
//! Six independently computed components are combined through an
//! audience-specific weighted average into one scalar, discretised into
//! five ordinal tiers, and checked against the human-review triggers.
//! Thresholds and weight vectors are runtime-adjustable so recalibration
//! does not need a redeploy.

use lexgraph_core::{
    Audience, ComponentScores, ComponentWeights, ConfidenceLevel, ConfidenceReport, GraphContext,
    AssembledContext, IntentCategory, NodeKind, QueryIntent, ScoreMetadata,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

static CITATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\[Citation: [^\]]+\]",
        r"\[Ref: [^\]]+\]",
        r"(?i)\(Section\s+\d+[^)]*\)",
        r"(?i)\(CPA\s+\d{4}[^)]*\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static citation pattern"))
    .collect()
});

static LEGAL_CLAIM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bsection\s+\d+\s+(?:states|provides|requires|prohibits|defines|establishes)",
        r"(?i)\bthe\s+(?:consumer protection\s+)?act\s+(?:states|provides|requires|establishes)",
        r"(?i)\bconsumers?\s+(?:have the right|are entitled|can|must|shall)",
        r"(?i)\b(?:according to|under|pursuant to|as per)\s+(?:section|clause|the act)",
        r"(?i)\b(?:unfair trade practice|consumer right|complaint procedure)\s+(?:is|means|includes)",
        r"(?i)\b(?:the law|statute|provision)\s+(?:states|requires|provides|prohibits)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static claim pattern"))
    .collect()
});

static CROSS_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:see also|refer to|as per|according to)\b").expect("static pattern")
});

static LOGICAL_CONNECTIVES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:therefore|thus|consequently|as a result)\b",
        r"(?i)\b(?:because|since|due to|given that)\b",
        r"(?i)\b(?:however|but|although|while)\b",
        r"(?i)\b(?:first|second|third|finally)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Word pairs whose co-occurrence suggests contradictory guidance.
static CONTRADICTORY_PAIRS: Lazy<Vec<(Regex, Regex)>> = Lazy::new(|| {
    [
        (r"(?i)\ballowed\b", r"(?i)\bprohibited\b"),
        (r"(?i)\brequired\b", r"(?i)\boptional\b"),
        (r"(?i)\bmust\b", r"(?i)\bmay\b"),
    ]
    .iter()
    .map(|(a, b)| {
        (
            Regex::new(a).expect("static pattern"),
            Regex::new(b).expect("static pattern"),
        )
    })
    .collect()
});

static STRUCTURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:\d+\.|•|\*|-)\s+").expect("static pattern"));
static HEADERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:\*\*|##).*(?:\*\*|##)").expect("static pattern"));

static COMPLETENESS_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bin conclusion\b",
        r"(?i)\bto summarize\b",
        r"(?i)\btherefore\b",
        r"(?i)\bdisclaimer\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

static TECHNICAL_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bpursuant to\b",
        r"(?i)\bwhereas\b",
        r"(?i)\bnotwithstanding\b",
        r"(?i)\bhereinafter\b",
        r"(?i)\baforesaid\b",
        r"(?i)\bthereof\b",
        r"(?i)\binter alia\b",
        r"(?i)\bviz\b",
        r"(?i)\bqua\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

static SIMPLIFYING_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bin simple terms\b",
        r"(?i)\bthis means\b",
        r"(?i)\bfor example\b",
        r"(?i)\bin other words\b",
        r"(?i)\bto put it simply\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Ordered level thresholds; scores below `low` land in the bottom tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub very_high: f32,
    pub high: f32,
    pub medium: f32,
    pub low: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            very_high: 0.9,
            high: 0.8,
            medium: 0.7,
            low: 0.5,
        }
    }
}

impl Thresholds {
    pub fn level_for(&self, score: f32) -> ConfidenceLevel {
        if score >= self.very_high {
            ConfidenceLevel::VeryHigh
        } else if score >= self.high {
            ConfidenceLevel::High
        } else if score >= self.medium {
            ConfidenceLevel::Medium
        } else if score >= self.low {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

/// Citation expectations per audience.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CitationTargets {
    pub min_citations: usize,
    /// A response may carry at most this many claims per citation.
    pub max_claims_per_citation: f32,
}

#[derive(Debug, Error)]
#[error("threshold {0} outside [0, 1]")]
pub struct InvalidThreshold(pub f32);

/// Runtime-adjustable scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub thresholds: Thresholds,
    pub citizen_weights: ComponentWeights,
    pub lawyer_weights: ComponentWeights,
    pub judge_weights: ComponentWeights,
    pub citizen_targets: CitationTargets,
    pub lawyer_targets: CitationTargets,
    pub judge_targets: CitationTargets,
    /// Act name on section nodes accepted as temporally valid.
    pub supported_act: String,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            citizen_weights: ComponentWeights {
                graph_coverage: 0.25,
                citation_density: 0.20,
                reasoning_chain: 0.15,
                response_quality: 0.25,
                temporal_validity: 0.10,
                audience_appropriateness: 0.05,
            },
            lawyer_weights: ComponentWeights {
                graph_coverage: 0.30,
                citation_density: 0.30,
                reasoning_chain: 0.20,
                response_quality: 0.15,
                temporal_validity: 0.05,
                audience_appropriateness: 0.00,
            },
            judge_weights: ComponentWeights {
                graph_coverage: 0.35,
                citation_density: 0.35,
                reasoning_chain: 0.25,
                response_quality: 0.05,
                temporal_validity: 0.00,
                audience_appropriateness: 0.00,
            },
            citizen_targets: CitationTargets {
                min_citations: 1,
                max_claims_per_citation: 3.0,
            },
            lawyer_targets: CitationTargets {
                min_citations: 2,
                max_claims_per_citation: 2.0,
            },
            judge_targets: CitationTargets {
                min_citations: 3,
                max_claims_per_citation: 1.0,
            },
            supported_act: "Consumer Protection Act, 2019".to_string(),
        }
    }
}

impl ScorerConfig {
    pub fn weights(&self, audience: Audience) -> &ComponentWeights {
        match audience {
            Audience::Citizen => &self.citizen_weights,
            Audience::Lawyer => &self.lawyer_weights,
            Audience::Judge => &self.judge_weights,
        }
    }

    pub fn targets(&self, audience: Audience) -> CitationTargets {
        match audience {
            Audience::Citizen => self.citizen_targets,
            Audience::Lawyer => self.lawyer_targets,
            Audience::Judge => self.judge_targets,
        }
    }
}

/// Confidence scorer over a fixed configuration.
pub struct ConfidenceScorer {
    config: ScorerConfig,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ScorerConfig::default())
    }
}

impl ConfidenceScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Recalibrate level thresholds; values must lie in [0, 1].
    pub fn update_thresholds(&mut self, thresholds: Thresholds) -> Result<(), InvalidThreshold> {
        for value in [
            thresholds.very_high,
            thresholds.high,
            thresholds.medium,
            thresholds.low,
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(InvalidThreshold(value));
            }
        }
        self.config.thresholds = thresholds;
        info!(
            very_high = thresholds.very_high,
            high = thresholds.high,
            medium = thresholds.medium,
            low = thresholds.low,
            "confidence thresholds updated"
        );
        Ok(())
    }

    /// Score a generated (or fallback) response.
    pub fn score(
        &self,
        intent: &QueryIntent,
        graph: &GraphContext,
        assembled: &AssembledContext,
        response: &str,
        audience: Audience,
    ) -> ConfidenceReport {
        let components = ComponentScores {
            graph_coverage: self.graph_coverage(intent, graph),
            citation_density: self.citation_density(response, audience),
            reasoning_chain: self.reasoning_chain(intent, graph, response),
            response_quality: self.response_quality(response, audience),
            temporal_validity: self.temporal_validity(graph),
            audience_appropriateness: self.audience_appropriateness(response, audience),
        };

        let overall = components.weighted_average(self.config.weights(audience));
        let level = self.config.thresholds.level_for(overall);
        let review_reasons = self.review_reasons(overall, &components, audience, intent);
        let requires_review = !review_reasons.is_empty();

        let report = ConfidenceReport {
            overall,
            components,
            level,
            requires_review,
            review_reasons,
            metadata: ScoreMetadata {
                audience,
                category: intent.category,
                nodes_retrieved: graph.nodes.len(),
                citation_count: count_citations(response),
                context_length: assembled.total_length(),
                response_length: response.len(),
            },
        };
        info!(
            overall = report.overall,
            level = report.level.as_str(),
            audience = audience.as_str(),
            requires_review,
            "response scored"
        );
        report
    }

    /// Fraction of extracted query entities found among retrieved nodes,
    /// plus a capped node-count bonus. Falls back to the raw graph-context
    /// confidence when the query carried no specific entities.
    fn graph_coverage(&self, intent: &QueryIntent, graph: &GraphContext) -> f32 {
        if graph.nodes.is_empty() {
            return 0.0;
        }
        let total = intent.extracted_entity_count();
        if total == 0 {
            return graph.confidence;
        }

        let mut found = 0usize;
        for term in &intent.legal_terms {
            let term_lower = term.to_lowercase();
            let hit = graph.nodes.iter().any(|node| match node {
                lexgraph_core::Node::Definition(d) => d.term.to_lowercase().contains(&term_lower),
                other => other.text().to_lowercase().contains(&term_lower),
            });
            if hit {
                found += 1;
            }
        }
        for number in &intent.section_numbers {
            let hit = graph
                .nodes_of_kind(NodeKind::Section)
                .iter()
                .any(|n| n.as_section().is_some_and(|s| &s.number == number));
            if hit {
                found += 1;
            }
        }

        let coverage = found as f32 / total as f32;
        let bonus = (graph.nodes.len() as f32 / 10.0).min(0.3);
        (coverage + bonus).min(1.0)
    }

    /// Citation count versus detected legal-claim count, against the
    /// audience's targets.
    fn citation_density(&self, response: &str, audience: Audience) -> f32 {
        let citations = count_citations(response);
        let claims = count_legal_claims(response);

        if claims == 0 {
            // No claims: nothing needed a citation. A citation anyway is a
            // mild mismatch, not a fault.
            return if citations == 0 { 1.0 } else { 0.9 };
        }
        if citations == 0 {
            return 0.1;
        }

        let targets = self.config.targets(audience);
        let claims_per_citation = claims as f32 / citations as f32;
        let mut density = if claims_per_citation <= targets.max_claims_per_citation {
            1.0
        } else {
            (targets.max_claims_per_citation / claims_per_citation).max(0.2)
        };
        if citations < targets.min_citations {
            density *= citations as f32 / targets.min_citations as f32;
        }
        density.min(1.0)
    }

    /// Base value adjusted for complex intents, multi-hop breadth,
    /// cross-reference and connective phrases, and contradictions.
    fn reasoning_chain(&self, intent: &QueryIntent, graph: &GraphContext, response: &str) -> f32 {
        let mut score = 0.7f32;

        match intent.category {
            IntentCategory::ScenarioAnalysis => score += 0.1,
            IntentCategory::RightsQuery => score += 0.05,
            _ => {}
        }

        if graph.nodes.len() > 3 {
            score += ((graph.nodes.len() - 3) as f32 * 0.05).min(0.2);
        }

        let cross_refs = CROSS_REFERENCE.find_iter(response).count();
        if cross_refs > 0 {
            score += (cross_refs as f32 * 0.03).min(0.1);
        }

        let connectives: usize = LOGICAL_CONNECTIVES
            .iter()
            .map(|p| p.find_iter(response).count())
            .sum();
        if connectives > 0 {
            score += (connectives as f32 * 0.02).min(0.1);
        }

        for (positive, negative) in CONTRADICTORY_PAIRS.iter() {
            if positive.is_match(response) && negative.is_match(response) {
                score -= 0.2;
                break;
            }
        }

        score.clamp(0.0, 1.0)
    }

    /// Length fit per audience, structure bonus, sentence-length fit,
    /// completeness phrases, repetition penalty.
    fn response_quality(&self, response: &str, audience: Audience) -> f32 {
        let mut score = 0.8f32;
        let length = response.len();

        match audience {
            Audience::Citizen => {
                if (150..=1500).contains(&length) {
                    score += 0.1;
                } else if length < 100 {
                    score -= 0.3;
                } else if length > 2500 {
                    score -= 0.2;
                }
            }
            Audience::Lawyer => {
                if (300..=3000).contains(&length) {
                    score += 0.1;
                } else if length < 200 {
                    score -= 0.2;
                }
            }
            Audience::Judge => {
                if (400..=4000).contains(&length) {
                    score += 0.1;
                } else if length < 300 {
                    score -= 0.2;
                }
            }
        }

        let has_structure = STRUCTURE.is_match(response) || HEADERS.is_match(response);
        if has_structure && length > 300 {
            score += 0.1;
        }

        let sentences = split_sentences(response);
        if !sentences.is_empty() {
            let words = response.split_whitespace().count();
            let avg_sentence_len = words as f32 / sentences.len() as f32;
            match audience {
                Audience::Citizen => {
                    if avg_sentence_len <= 20.0 {
                        score += 0.05;
                    } else if avg_sentence_len > 30.0 {
                        score -= 0.1;
                    }
                }
                Audience::Lawyer | Audience::Judge => {
                    if (15.0..=35.0).contains(&avg_sentence_len) {
                        score += 0.05;
                    }
                }
            }
        }

        let completeness = COMPLETENESS_PHRASES
            .iter()
            .filter(|p| p.is_match(response))
            .count();
        if completeness > 0 {
            score += (completeness as f32 * 0.03).min(0.1);
        }

        if repetition_ratio(&sentences) > 0.3 {
            score -= 0.2;
        }

        score.clamp(0.0, 1.0)
    }

    /// 1.0 when all retrieved sections carry the supported act, a fixed
    /// penalty otherwise, neutral 0.5 on empty retrieval.
    fn temporal_validity(&self, graph: &GraphContext) -> f32 {
        if graph.nodes.is_empty() {
            return 0.5;
        }
        let sections = graph.nodes_of_kind(NodeKind::Section);
        let current = sections
            .iter()
            .filter_map(|n| n.as_section())
            .any(|s| s.act == self.config.supported_act);
        if current || sections.is_empty() {
            1.0
        } else {
            0.8
        }
    }

    /// Technical-phrase density versus simplifying-phrase density, judged
    /// per audience.
    fn audience_appropriateness(&self, response: &str, audience: Audience) -> f32 {
        let mut score = 0.8f32;
        let technical: usize = TECHNICAL_PHRASES
            .iter()
            .map(|p| p.find_iter(response).count())
            .sum();
        let simple: usize = SIMPLIFYING_PHRASES
            .iter()
            .map(|p| p.find_iter(response).count())
            .sum();

        match audience {
            Audience::Citizen => {
                if technical > 3 {
                    score -= 0.3;
                }
                if simple > 0 {
                    score += 0.2;
                }
            }
            Audience::Lawyer => {
                if technical > 0 {
                    score += 0.1;
                }
                if technical > 10 {
                    score -= 0.1;
                }
            }
            Audience::Judge => {
                if technical > 0 {
                    score += 0.2;
                }
            }
        }
        score.clamp(0.0, 1.0)
    }

    /// Human review triggers; any one is sufficient. Each records a
    /// human-readable reason.
    fn review_reasons(
        &self,
        overall: f32,
        components: &ComponentScores,
        audience: Audience,
        intent: &QueryIntent,
    ) -> Vec<String> {
        let thresholds = self.config.thresholds;
        let mut reasons = Vec::new();

        if overall < thresholds.high {
            reasons.push(format!(
                "Overall confidence score {overall:.2} below threshold {:.2}",
                thresholds.high
            ));
        }
        if audience == Audience::Judge && overall < thresholds.very_high {
            reasons.push("Judge audience requires very high confidence".to_string());
        }
        if components.graph_coverage < 0.3 {
            reasons.push(format!(
                "Low graph coverage: {:.2}",
                components.graph_coverage
            ));
        }
        if components.citation_density < 0.4 {
            reasons.push(format!(
                "Low citation density: {:.2}",
                components.citation_density
            ));
        }
        if intent.category == IntentCategory::ScenarioAnalysis && components.reasoning_chain < 0.6 {
            reasons.push("Complex scenario analysis with low reasoning score".to_string());
        }
        if components.response_quality < 0.5 {
            reasons.push(format!(
                "Low response quality: {:.2}",
                components.response_quality
            ));
        }
        reasons
    }
}

/// Count citation tokens across all accepted surface forms.
pub fn count_citations(response: &str) -> usize {
    CITATION_PATTERNS
        .iter()
        .map(|p| p.find_iter(response).count())
        .sum()
}

/// Count legal-claim trigger phrases.
pub fn count_legal_claims(response: &str) -> usize {
    LEGAL_CLAIM_PATTERNS
        .iter()
        .map(|p| p.find_iter(response).count())
        .sum()
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.len() > 5)
        .collect()
}

/// Share of sentences that repeat an earlier sentence.
fn repetition_ratio(sentences: &[&str]) -> f32 {
    if sentences.len() <= 3 {
        return 0.0;
    }
    let unique: std::collections::HashSet<String> =
        sentences.iter().map(|s| s.to_lowercase()).collect();
    1.0 - unique.len() as f32 / sentences.len() as f32
}
