//! Operational graph reporting and per-response reasoning explanations.

use lexgraph_core::{AssembledContext, ConfidenceReport, GraphContext, QueryIntent};
use lexgraph_store::{GraphStats, GraphStore};
use serde::{Deserialize, Serialize};

/// Completeness report over a loaded graph.
///
/// Distinct from the fatal load-time integrity check: integrity failures
/// prevent startup, while completeness findings are operational warnings
/// (an empty definitions collection is suspicious but servable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub sections: usize,
    pub clauses: usize,
    pub definitions: usize,
    pub rights: usize,
    pub edges: usize,
}

impl GraphReport {
    pub fn for_store(store: &GraphStore) -> Self {
        let stats: GraphStats = store.stats();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if stats.sections == 0 {
            errors.push("no sections loaded".to_string());
        }
        if stats.definitions == 0 {
            warnings.push("no definitions loaded".to_string());
        }
        if stats.rights == 0 {
            warnings.push("no rights loaded".to_string());
        }
        if stats.clauses == 0 {
            warnings.push("no clauses loaded".to_string());
        }
        if stats.total_edges() == 0 && stats.total_nodes() > 0 {
            warnings.push("graph has nodes but no edges".to_string());
        }

        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            sections: stats.sections,
            clauses: stats.clauses,
            definitions: stats.definitions,
            rights: stats.rights,
            edges: stats.total_edges(),
        }
    }
}

/// Human-readable trace of how an answer was produced, emitted for
/// professional audiences.
pub fn explain_reasoning(
    intent: &QueryIntent,
    graph: &GraphContext,
    assembled: &AssembledContext,
    confidence: &ConfidenceReport,
) -> String {
    let mut lines = Vec::new();

    lines.push("**Query Analysis:**".to_string());
    lines.push(format!("- Intent: {}", intent.category.as_str()));
    lines.push(format!("- Confidence: {:.2}", intent.confidence));
    lines.push(format!(
        "- Legal Terms Found: {}",
        if intent.legal_terms.is_empty() {
            "None".to_string()
        } else {
            intent.legal_terms.join(", ")
        }
    ));
    lines.push(format!(
        "- Section Numbers: {}",
        if intent.section_numbers.is_empty() {
            "None".to_string()
        } else {
            intent.section_numbers.join(", ")
        }
    ));

    lines.push(String::new());
    lines.push("**Knowledge Graph Traversal:**".to_string());
    lines.push(format!("- Nodes Retrieved: {}", graph.nodes.len()));
    lines.push(format!("- Relationships Found: {}", graph.edges.len()));
    let shown = graph.traversal_path.len().min(5);
    lines.push(format!(
        "- Traversal Path: {}{}",
        graph.traversal_path[..shown].join(" -> "),
        if graph.traversal_path.len() > 5 {
            " (truncated)"
        } else {
            ""
        }
    ));

    lines.push(String::new());
    lines.push("**Context Construction:**".to_string());
    lines.push(format!(
        "- Primary Provisions: {}",
        assembled.primary_provisions.len()
    ));
    lines.push(format!(
        "- Related Provisions: {}",
        assembled.related_provisions.len()
    ));
    lines.push(format!(
        "- Definitions Included: {}",
        assembled.definitions.len()
    ));
    lines.push(format!(
        "- Citations Generated: {}",
        assembled.citation_count()
    ));
    lines.push(format!(
        "- Context Length: {} characters",
        assembled.total_length()
    ));

    lines.push(String::new());
    lines.push("**Overall Assessment:**".to_string());
    lines.push(format!(
        "- Final Confidence: {:.2} ({})",
        confidence.overall,
        confidence.level.as_str()
    ));
    lines.push(format!("- Complexity: {}", intent.complexity().as_str()));
    lines.push(format!(
        "- Requires Review: {}",
        if confidence.requires_review { "Yes" } else { "No" }
    ));

    lines.join("\n")
}
