//! The request pipeline: parse → retrieve → assemble → generate → score →
//! validate.
//!
//! Each request is one logical sequential unit; the generation call is the
//! sole suspension point and the only operation expected to block for
//! non-trivial time. Provider failure or timeout degrades deterministically
//! to a graph-only answer. Per-request failures always recover into a
//! degraded-but-valid response; nothing here returns an error to the
//! caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lexgraph_ai::{
    ConfidenceScorer, ContextAssembler, IntentParser, ResponseValidator,
};
use lexgraph_core::{
    Audience, Complexity, ConfidenceReport, GraphContext, Instrument, IntentCategory,
    ValidationReport,
};
use lexgraph_llm::{build_system_prompt, build_user_prompt, GenerationProvider, GenerationRequest};
use lexgraph_store::GraphStore;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::report::explain_reasoning;
use crate::stats::EngineStats;

const NO_RESULT_MESSAGE: &str = "I couldn't find specific information about your query in the \
knowledge base. Please try rephrasing your question or ask about consumer rights, definitions, \
or specific sections.";

const EXCERPT_NOTICE: &str = "[This is a direct excerpt from the legal text. For a detailed \
explanation, please try again later.]";

const CANNOT_VERIFY_NOTICE: &str = "[The generated answer could not be verified against the \
knowledge base and has been withheld. The excerpt above is quoted directly from the legal text.]";

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_context_length: usize,
    pub generation_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_context_length: lexgraph_ai::DEFAULT_MAX_CONTEXT_LENGTH,
            generation_timeout: Duration::from_secs(30),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

/// A resolvable citation attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub key: String,
    pub reference: String,
}

/// Request-level facts recorded on every answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerMetadata {
    pub category: IntentCategory,
    pub complexity: Complexity,
    pub audience: Audience,
    pub language: String,
    pub nodes_retrieved: usize,
    pub edges_traversed: usize,
    pub context_length: usize,
    pub citation_count: usize,
    pub elapsed_ms: u64,
    pub answered_at: DateTime<Utc>,
    /// Model that produced the text, absent for graph-only answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The pipeline's final output for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub confidence: ConfidenceReport,
    /// Present when generated text was validated; absent for graph-only
    /// answers, which contain no generated prose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    /// True when the generation collaborator failed or its output was
    /// blocked, and the text fell back to a graph-only excerpt.
    pub degraded: bool,
    pub metadata: AnswerMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Answer {
    /// The response must not be auto-displayed without expert verification.
    pub fn requires_review(&self) -> bool {
        self.confidence.requires_review
            || self
                .validation
                .as_ref()
                .is_some_and(|v| v.requires_review)
    }
}

/// The assembled request pipeline. Holds only read-only state plus the
/// injected stats accumulator; safe to share across request workers.
pub struct Pipeline {
    store: Arc<GraphStore>,
    parser: IntentParser,
    assembler: ContextAssembler,
    scorer: ConfidenceScorer,
    validator: ResponseValidator,
    provider: Option<Arc<dyn GenerationProvider>>,
    stats: Arc<EngineStats>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(store: Arc<GraphStore>, instrument: Instrument, config: PipelineConfig) -> Self {
        let assembler =
            ContextAssembler::new(instrument).with_max_length(config.max_context_length);
        Self {
            store,
            parser: IntentParser::new(),
            assembler,
            scorer: ConfidenceScorer::default(),
            validator: ResponseValidator::default(),
            provider: None,
            stats: Arc::new(EngineStats::new()),
            config,
        }
    }

    /// Attach a generation provider. Without one the pipeline runs in
    /// graph-only mode.
    pub fn with_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Inject the hosting service's stats accumulator.
    pub fn with_stats(mut self, stats: Arc<EngineStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_validator(mut self, validator: ResponseValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn stats(&self) -> &Arc<EngineStats> {
        &self.stats
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Answer one query. Never returns an error: generation failures,
    /// empty retrievals, and blocked responses all resolve into a valid
    /// degraded answer.
    pub async fn answer(&self, query: &str, language: &str, audience: Audience) -> Answer {
        let started = Instant::now();

        let intent = self.parser.parse(query);
        let graph = self.store.retrieve(&intent);
        let assembled = self.assembler.assemble(&graph, &intent, audience);

        let mut degraded = false;
        let mut blocked = false;
        let mut model = None;
        let mut validation: Option<ValidationReport> = None;

        let text = if graph.is_empty() {
            NO_RESULT_MESSAGE.to_string()
        } else if let Some(provider) = &self.provider {
            let request = GenerationRequest {
                system: build_system_prompt(audience, intent.category),
                user: build_user_prompt(query, &assembled),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };
            match timeout(self.config.generation_timeout, provider.generate(&request)).await {
                Ok(Ok(generated)) => {
                    model = Some(generated.model.clone());
                    let report = self.validator.validate(
                        &generated.text,
                        &assembled,
                        &graph,
                        &*self.store,
                        audience,
                    );
                    let text = if report.is_valid {
                        generated.text
                    } else if let Some(corrected) = report.corrected_text.clone() {
                        info!("substituting auto-corrected response");
                        corrected
                    } else {
                        warn!(
                            issues = report.issues.len(),
                            fabricated = report.fabricated_references.len(),
                            "generated response blocked, serving graph-only answer"
                        );
                        blocked = true;
                        degraded = true;
                        graph_only_text(&graph, CANNOT_VERIFY_NOTICE)
                    };
                    validation = Some(report);
                    text
                }
                Ok(Err(error)) => {
                    warn!(provider = provider.name(), %error, "generation failed, degrading to graph-only answer");
                    degraded = true;
                    graph_only_text(&graph, EXCERPT_NOTICE)
                }
                Err(_) => {
                    warn!(
                        provider = provider.name(),
                        timeout_ms = self.config.generation_timeout.as_millis() as u64,
                        "generation timed out, degrading to graph-only answer"
                    );
                    degraded = true;
                    graph_only_text(&graph, EXCERPT_NOTICE)
                }
            }
        } else {
            // Graph-only mode by construction, not degradation.
            graph_only_text(&graph, EXCERPT_NOTICE)
        };

        let confidence = self.scorer.score(&intent, &graph, &assembled, &text, audience);

        let explanation = matches!(audience, Audience::Lawyer | Audience::Judge)
            .then(|| explain_reasoning(&intent, &graph, &assembled, &confidence));

        let citations = assembled
            .citations
            .iter()
            .map(|(key, reference)| Citation {
                key: key.clone(),
                reference: reference.clone(),
            })
            .collect();

        let elapsed = started.elapsed();
        let requires_review = confidence.requires_review
            || validation.as_ref().is_some_and(|v| v.requires_review);
        self.stats.record(elapsed, degraded, blocked, requires_review);

        info!(
            category = intent.category.as_str(),
            audience = audience.as_str(),
            nodes = graph.nodes.len(),
            degraded,
            blocked,
            elapsed_ms = elapsed.as_millis() as u64,
            "query answered"
        );

        Answer {
            text,
            citations,
            confidence,
            validation,
            degraded,
            metadata: AnswerMetadata {
                category: intent.category,
                complexity: intent.complexity(),
                audience,
                language: language.to_string(),
                nodes_retrieved: graph.nodes.len(),
                edges_traversed: graph.edges.len(),
                context_length: assembled.total_length(),
                citation_count: assembled.citation_count(),
                elapsed_ms: elapsed.as_millis() as u64,
                answered_at: Utc::now(),
                model,
            },
            explanation,
        }
    }
}

/// Deterministic fallback: the first primary node's text plus citations,
/// no generated prose.
fn graph_only_text(graph: &GraphContext, notice: &str) -> String {
    match graph.nodes.first() {
        Some(node) => format!("{}\n\n{}\n\n{}", node.citation(), node.text(), notice),
        None => NO_RESULT_MESSAGE.to_string(),
    }
}
