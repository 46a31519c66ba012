//! Intent-dispatched retrieval strategies.
//!
//! Each intent category has an explicit strategy; scenario answers must be
//! procedurally actionable, so scenario retrieval is keyword-routed to
//! curated handlers instead of similarity-ranked. Absence of results is a
//! valid state at reduced confidence, never an error.

use lexgraph_core::{
    Edge, GraphContext, IntentCategory, Node, QueryIntent, Relation, RightType,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::GraphStore;

/// Keyword search returns at most this many nodes.
const KEYWORD_SEARCH_LIMIT: usize = 5;
/// Scenario handlers attach at most this many rights.
const SCENARIO_RIGHTS_LIMIT: usize = 2;

/// Act-specific section numbers the scenario handlers route to.
///
/// These are dataset assumptions about one instrument, not general
/// algorithm; supporting another act means supplying different numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSections {
    /// How to file a complaint.
    pub complaint_filing: String,
    /// Remedies available.
    pub remedies: String,
    /// The definitions section.
    pub definitions: String,
    /// Powers of the central authority.
    pub authority_powers: String,
    /// Penalties for misleading advertisements.
    pub advertising_penalties: String,
}

impl Default for ScenarioSections {
    fn default() -> Self {
        Self {
            complaint_filing: "35".to_string(),
            remedies: "39".to_string(),
            definitions: "2".to_string(),
            authority_powers: "18".to_string(),
            advertising_penalties: "21".to_string(),
        }
    }
}

/// Accumulates one retrieval's nodes, edges, and provenance path without
/// duplicate nodes.
#[derive(Default)]
struct Retrieval {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    path: Vec<String>,
}

impl Retrieval {
    /// Add a node as a direct match, recording it on the traversal path.
    fn push_primary(&mut self, node: &Node) {
        if !self.contains(node.id()) {
            self.path.push(node.id().to_string());
            self.nodes.push(node.clone());
        }
    }

    /// Add a node reached through an edge (not recorded on the path).
    fn push_related(&mut self, node: &Node) {
        if !self.contains(node.id()) {
            self.nodes.push(node.clone());
        }
    }

    fn push_edge(&mut self, from: &str, to: &str, relation: Relation) {
        self.edges.push(Edge::new(from, to, relation));
    }

    fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id() == id)
    }
}

impl GraphStore {
    /// Retrieve graph context for a parsed intent.
    ///
    /// Deterministic for a fixed graph snapshot: identical intents produce
    /// identical nodes, edges, and traversal paths.
    pub fn retrieve(&self, intent: &QueryIntent) -> GraphContext {
        let retrieval = match intent.category {
            IntentCategory::DefinitionLookup => self.definition_lookup(intent),
            IntentCategory::SectionRetrieval => self.section_retrieval(intent),
            IntentCategory::RightsQuery => self.rights_query(),
            IntentCategory::ScenarioAnalysis => self.scenario_analysis(intent),
        };

        let confidence =
            context_confidence(intent.confidence, retrieval.nodes.len(), retrieval.edges.len());
        let citations = retrieval.nodes.iter().map(Node::citation).collect();
        debug!(
            category = intent.category.as_str(),
            nodes = retrieval.nodes.len(),
            edges = retrieval.edges.len(),
            confidence,
            "retrieval complete"
        );
        GraphContext {
            nodes: retrieval.nodes,
            edges: retrieval.edges,
            citations,
            confidence,
            traversal_path: retrieval.path,
        }
    }

    /// Exact term-index lookup per extracted term, attaching the defining
    /// section. Falls back to ranked keyword search when nothing matches.
    fn definition_lookup(&self, intent: &QueryIntent) -> Retrieval {
        let mut retrieval = Retrieval::default();

        for term in &intent.legal_terms {
            let Some(def_node) = self.definition_by_term(term) else {
                continue;
            };
            retrieval.push_primary(def_node);

            let defined_in = def_node
                .as_definition()
                .and_then(|d| d.defined_in.clone());
            if let Some(section_id) = defined_in
                && let Some(section) = self.node(&section_id)
            {
                retrieval.push_related(section);
                retrieval.push_edge(section.id(), def_node.id(), Relation::Defines);
            }
        }

        if retrieval.nodes.is_empty() {
            let terms = if intent.legal_terms.is_empty() {
                &intent.entities
            } else {
                &intent.legal_terms
            };
            for (_, node) in self.keyword_search(terms, KEYWORD_SEARCH_LIMIT) {
                retrieval.push_primary(node);
            }
        }
        retrieval
    }

    /// Exact lookup per extracted section number, attaching all child
    /// clauses via Contains edges.
    fn section_retrieval(&self, intent: &QueryIntent) -> Retrieval {
        let mut retrieval = Retrieval::default();

        for number in &intent.section_numbers {
            let Some(section) = self.section_by_number(number) else {
                continue;
            };
            retrieval.push_primary(section);

            let section_id = section.id().to_string();
            for clause_id in self.children_of(&section_id) {
                if let Some(clause) = self.node(clause_id) {
                    retrieval.push_related(clause);
                    retrieval.push_edge(&section_id, clause_id, Relation::Contains);
                }
            }
        }
        retrieval
    }

    /// Consumer-type rights with their granting sections, then any further
    /// rights reachable from those sections via GrantsRight edges. The
    /// fixed fundamental-right enumeration itself is emitted downstream by
    /// the assembler regardless of what this returns.
    fn rights_query(&self) -> Retrieval {
        let mut retrieval = Retrieval::default();
        let mut granting_sections: Vec<String> = Vec::new();

        for right_id in self.rights_of_type(RightType::ConsumerRight) {
            let Some(right) = self.node(right_id) else {
                continue;
            };
            retrieval.push_primary(right);

            let granted_by = right.as_right().and_then(|r| r.granted_by.clone());
            if let Some(section_id) = granted_by
                && let Some(section) = self.node(&section_id)
            {
                retrieval.push_related(section);
                retrieval.push_edge(section.id(), right.id(), Relation::GrantsRight);
                if !granting_sections.contains(&section_id) {
                    granting_sections.push(section_id);
                }
            }
        }

        // Procedurally-derived rights via GrantsRight edges.
        for section_id in granting_sections {
            for (target, relation) in self.edges_from(&section_id) {
                if *relation == Relation::GrantsRight
                    && let Some(node) = self.node(target)
                    && node.as_right().is_some()
                    && !retrieval.contains(target)
                {
                    retrieval.push_related(node);
                    retrieval.push_edge(&section_id, target, Relation::GrantsRight);
                }
            }
        }
        retrieval
    }

    /// Keyword-triggered routing to curated scenario handlers.
    fn scenario_analysis(&self, intent: &QueryIntent) -> Retrieval {
        let query = intent.original_query.to_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|k| query.contains(k));

        if matches(&["defective", "faulty", "damaged", "broken", "defect"]) {
            self.defective_goods_scenario()
        } else if matches(&["misleading", "false", "advertisement", "advertise"]) {
            self.misleading_ad_scenario()
        } else if matches(&["overcharg", "excess", "extra", "price", "refund"]) {
            self.overcharging_scenario()
        } else if matches(&["service", "deficiency", "poor service", "bad service"]) {
            self.service_deficiency_scenario()
        } else {
            self.generic_scenario()
        }
    }

    fn push_section_by_number(&self, retrieval: &mut Retrieval, number: &str) {
        if let Some(section) = self.section_by_number(number) {
            retrieval.push_primary(section);
        }
    }

    fn push_definition(&self, retrieval: &mut Retrieval, term: &str) {
        if let Some(def) = self.definition_by_term(term) {
            retrieval.push_primary(def);
        }
    }

    /// Rights whose description mentions any of the given topics, up to the
    /// scenario limit.
    fn push_relevant_rights(&self, retrieval: &mut Retrieval, topics: &[&str]) {
        let mut added = 0;
        for right_id in self.rights_of_type(RightType::ConsumerRight) {
            if added >= SCENARIO_RIGHTS_LIMIT {
                break;
            }
            let Some(right) = self.node(right_id) else {
                continue;
            };
            let description = right.text().to_lowercase();
            if topics.is_empty() || topics.iter().any(|t| description.contains(t)) {
                retrieval.push_primary(right);
                added += 1;
            }
        }
    }

    fn defective_goods_scenario(&self) -> Retrieval {
        let mut retrieval = Retrieval::default();
        self.push_definition(&mut retrieval, "defect");
        let sections = self.scenarios.clone();
        self.push_section_by_number(&mut retrieval, &sections.complaint_filing);
        self.push_section_by_number(&mut retrieval, &sections.remedies);
        self.push_relevant_rights(&mut retrieval, &["quality", "defect", "redressal"]);
        retrieval
    }

    fn misleading_ad_scenario(&self) -> Retrieval {
        let mut retrieval = Retrieval::default();
        self.push_definition(&mut retrieval, "misleading advertisement");
        self.push_definition(&mut retrieval, "advertisement");
        let sections = self.scenarios.clone();
        self.push_section_by_number(&mut retrieval, &sections.authority_powers);
        self.push_section_by_number(&mut retrieval, &sections.advertising_penalties);
        self.push_section_by_number(&mut retrieval, &sections.complaint_filing);
        retrieval
    }

    fn overcharging_scenario(&self) -> Retrieval {
        let mut retrieval = Retrieval::default();
        let sections = self.scenarios.clone();
        self.push_section_by_number(&mut retrieval, &sections.complaint_filing);
        self.push_section_by_number(&mut retrieval, &sections.remedies);
        retrieval
    }

    fn service_deficiency_scenario(&self) -> Retrieval {
        let mut retrieval = Retrieval::default();
        self.push_definition(&mut retrieval, "deficiency");
        let sections = self.scenarios.clone();
        self.push_section_by_number(&mut retrieval, &sections.complaint_filing);
        self.push_section_by_number(&mut retrieval, &sections.remedies);
        retrieval
    }

    /// Generic fallback: consumer-actionable sections over institutional
    /// ones, plus the leading rights.
    fn generic_scenario(&self) -> Retrieval {
        let mut retrieval = Retrieval::default();
        let sections = self.scenarios.clone();
        self.push_section_by_number(&mut retrieval, &sections.complaint_filing);
        self.push_section_by_number(&mut retrieval, &sections.remedies);
        self.push_section_by_number(&mut retrieval, &sections.definitions);
        self.push_relevant_rights(&mut retrieval, &[]);
        retrieval
    }
}

/// Context confidence: intent confidence plus capped bonuses from node and
/// edge counts, halved on empty retrieval, clamped to [0, 1].
fn context_confidence(intent_confidence: f32, node_count: usize, edge_count: usize) -> f32 {
    let mut confidence = intent_confidence;
    if node_count > 0 {
        confidence += (node_count as f32 / 5.0).min(0.3);
    } else {
        confidence *= 0.5;
    }
    if edge_count > 0 {
        confidence += (edge_count as f32 / 10.0).min(0.2);
    }
    confidence.clamp(0.0, 1.0)
}
