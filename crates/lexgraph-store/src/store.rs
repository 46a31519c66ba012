//! In-memory knowledge-graph store with read-only indices.
//!
//! Built once at startup, then shared immutably across request workers.
//! Four index families are built in a single pass: by-id, by-number/by-term,
//! parent→children, and edges-from-node. Referential integrity is enforced
//! at construction: any edge endpoint that does not resolve to a loaded
//! node fails the build.

use std::collections::{HashMap, HashSet, VecDeque};

use lexgraph_core::{
    base_number, Clause, Definition, Edge, GraphIndex, Node, NodeKind, Relation, Right, RightType,
    Section,
};
use tracing::info;

use crate::error::StoreError;
use crate::retrieve::ScenarioSections;

/// Collection and edge counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub sections: usize,
    pub clauses: usize,
    pub definitions: usize,
    pub rights: usize,
    pub contains_edges: usize,
    pub reference_edges: usize,
    pub defines_edges: usize,
    pub grants_edges: usize,
}

impl GraphStats {
    pub fn total_nodes(&self) -> usize {
        self.sections + self.clauses + self.definitions + self.rights
    }

    pub fn total_edges(&self) -> usize {
        self.contains_edges + self.reference_edges + self.defines_edges + self.grants_edges
    }
}

/// The loaded knowledge graph. Strictly read-only after construction.
#[derive(Debug)]
pub struct GraphStore {
    nodes: HashMap<String, Node>,
    /// Insertion order per kind, for deterministic scans.
    section_ids: Vec<String>,
    definition_ids: Vec<String>,
    right_ids: Vec<String>,
    /// Bare section number → node id.
    section_by_number: HashMap<String, String>,
    /// Lowercased term → node id.
    definition_by_term: HashMap<String, String>,
    rights_by_type: HashMap<RightType, Vec<String>>,
    /// Section id → child clause ids (via Contains edges), in edge order.
    children: HashMap<String, Vec<String>>,
    /// Source node id → (target id, relation), in edge order.
    edges_from: HashMap<String, Vec<(String, Relation)>>,
    edges: Vec<Edge>,
    pub(crate) scenarios: ScenarioSections,
}

impl GraphStore {
    /// Build a store from already-deserialised collections, indexing in one
    /// pass and validating referential integrity.
    pub fn from_parts(
        sections: Vec<Section>,
        clauses: Vec<Clause>,
        definitions: Vec<Definition>,
        rights: Vec<Right>,
        edges: Vec<Edge>,
        scenarios: ScenarioSections,
    ) -> Result<Self, StoreError> {
        let mut store = Self {
            nodes: HashMap::new(),
            section_ids: Vec::new(),
            definition_ids: Vec::new(),
            right_ids: Vec::new(),
            section_by_number: HashMap::new(),
            definition_by_term: HashMap::new(),
            rights_by_type: HashMap::new(),
            children: HashMap::new(),
            edges_from: HashMap::new(),
            edges: Vec::new(),
            scenarios,
        };

        for section in sections {
            store.section_ids.push(section.id.clone());
            store
                .section_by_number
                .insert(section.number.clone(), section.id.clone());
            store.insert_node(Node::Section(section))?;
        }
        for clause in clauses {
            store.insert_node(Node::Clause(clause))?;
        }
        for mut definition in definitions {
            if definition.id.is_empty() {
                // Ingest output carries no definition ids; synthesise them.
                definition.id = format!("DEF_{}", definition.term.to_lowercase());
            }
            store.definition_ids.push(definition.id.clone());
            store
                .definition_by_term
                .insert(definition.term.to_lowercase(), definition.id.clone());
            store.insert_node(Node::Definition(definition))?;
        }
        for right in rights {
            store.right_ids.push(right.id.clone());
            store
                .rights_by_type
                .entry(right.right_type)
                .or_default()
                .push(right.id.clone());
            store.insert_node(Node::Right(right))?;
        }

        // Index edges, failing loudly on any dangling endpoint. A graph
        // with a dangling edge must not serve requests.
        for edge in edges {
            for endpoint in [&edge.from, &edge.to] {
                if !store.nodes.contains_key(endpoint) {
                    return Err(StoreError::DanglingEdge {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        relation: edge.relation,
                        missing: endpoint.clone(),
                    });
                }
            }
            if edge.relation == Relation::Contains {
                store
                    .children
                    .entry(edge.from.clone())
                    .or_default()
                    .push(edge.to.clone());
            }
            store
                .edges_from
                .entry(edge.from.clone())
                .or_default()
                .push((edge.to.clone(), edge.relation));
            store.edges.push(edge);
        }

        let stats = store.stats();
        info!(
            sections = stats.sections,
            clauses = stats.clauses,
            definitions = stats.definitions,
            rights = stats.rights,
            edges = stats.total_edges(),
            "knowledge graph indexed"
        );
        Ok(store)
    }

    fn insert_node(&mut self, node: Node) -> Result<(), StoreError> {
        let id = node.id().to_string();
        if self.nodes.insert(id.clone(), node).is_some() {
            return Err(StoreError::DuplicateNode(id));
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn section_by_number(&self, number: &str) -> Option<&Node> {
        self.section_by_number
            .get(base_number(number))
            .and_then(|id| self.nodes.get(id))
    }

    pub fn definition_by_term(&self, term: &str) -> Option<&Node> {
        self.definition_by_term
            .get(&term.to_lowercase())
            .and_then(|id| self.nodes.get(id))
    }

    /// Right ids of the given type, in load order.
    pub fn rights_of_type(&self, right_type: RightType) -> &[String] {
        self.rights_by_type
            .get(&right_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Child clause ids of a section, in edge order.
    pub fn children_of(&self, section_id: &str) -> &[String] {
        self.children
            .get(section_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Outgoing edges of a node, in edge order.
    pub fn edges_from(&self, id: &str) -> &[(String, Relation)] {
        self.edges_from.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn section_ids(&self) -> &[String] {
        &self.section_ids
    }

    pub(crate) fn definition_ids(&self) -> &[String] {
        &self.definition_ids
    }

    pub(crate) fn right_ids(&self) -> &[String] {
        &self.right_ids
    }

    /// Sections sharing a chapter with the given section, excluding it.
    pub fn chapter_siblings(&self, section_id: &str, limit: usize) -> Vec<&Node> {
        let Some(chapter) = self
            .node(section_id)
            .and_then(Node::as_section)
            .and_then(|s| s.chapter.as_deref())
        else {
            return Vec::new();
        };
        self.section_ids
            .iter()
            .filter(|id| id.as_str() != section_id)
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| {
                n.as_section()
                    .and_then(|s| s.chapter.as_deref())
                    .is_some_and(|c| c == chapter)
            })
            .take(limit)
            .collect()
    }

    /// Breadth-first traversal from `start`, following only the allow-listed
    /// relation types, bounded by `max_depth`. The visited set guarantees
    /// termination on cyclic edges.
    pub fn traverse(&self, start: &str, relations: &[Relation], max_depth: usize) -> Vec<&Node> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((start, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth || !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                result.push(node);
            }
            for (target, relation) in self.edges_from(current) {
                if relations.contains(relation) && !visited.contains(target.as_str()) {
                    queue.push_back((target, depth + 1));
                }
            }
        }
        result
    }

    /// Relevance score of a text against search terms: exact phrase match
    /// scores 2.0, otherwise fractional credit per matching sub-word,
    /// averaged over terms.
    pub(crate) fn text_match_score(text: &str, terms: &[String]) -> f32 {
        if text.is_empty() || terms.is_empty() {
            return 0.0;
        }
        let text_lower = text.to_lowercase();
        let mut score = 0.0f32;
        for term in terms {
            let term_lower = term.to_lowercase();
            if text_lower.contains(&term_lower) {
                score += 2.0;
            } else {
                let words: Vec<&str> = term_lower.split_whitespace().collect();
                if !words.is_empty() {
                    let matched = words.iter().filter(|w| text_lower.contains(*w)).count();
                    score += matched as f32 / words.len() as f32;
                }
            }
        }
        score / terms.len() as f32
    }

    /// Ranked keyword search over section, definition, and right text
    /// fields. Returns the top `limit` scoring nodes; ties keep load order.
    pub fn keyword_search(&self, terms: &[String], limit: usize) -> Vec<(f32, &Node)> {
        let mut scored: Vec<(f32, usize, &Node)> = Vec::new();
        let candidates = self
            .section_ids
            .iter()
            .chain(self.definition_ids.iter())
            .chain(self.right_ids.iter());
        for (order, id) in candidates.enumerate() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let score = Self::text_match_score(node.text(), terms);
            if score > 0.0 {
                scored.push((score, order, node));
            }
        }
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(score, _, node)| (score, node))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            sections: self.section_ids.len(),
            definitions: self.definition_ids.len(),
            rights: self.right_ids.len(),
            clauses: self
                .nodes
                .values()
                .filter(|n| n.kind() == NodeKind::Clause)
                .count(),
            ..GraphStats::default()
        };
        for edge in &self.edges {
            match edge.relation {
                Relation::Contains => stats.contains_edges += 1,
                Relation::References => stats.reference_edges += 1,
                Relation::Defines => stats.defines_edges += 1,
                Relation::GrantsRight => stats.grants_edges += 1,
            }
        }
        stats
    }
}

impl GraphIndex for GraphStore {
    fn has_section(&self, number: &str) -> bool {
        self.section_by_number.contains_key(base_number(number))
    }

    fn has_term(&self, term: &str) -> bool {
        self.definition_by_term.contains_key(&term.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_store;

    #[test]
    fn lookups_resolve() {
        let store = sample_store();
        assert!(store.node("CPA2019_2").is_some());
        assert!(store.section_by_number("2").is_some());
        assert!(store.section_by_number("2(9)").is_some(), "base number lookup");
        assert!(store.definition_by_term("Consumer").is_some(), "case-insensitive");
        assert!(store.section_by_number("9999").is_none());
    }

    #[test]
    fn graph_index_seam() {
        let store = sample_store();
        assert!(store.has_section("35"));
        assert!(store.has_section("2(9)(a)"));
        assert!(!store.has_section("9999"));
        assert!(store.has_term("defect"));
        assert!(!store.has_term("quantum entanglement"));
    }

    #[test]
    fn dangling_edge_fails_load() {
        let err = GraphStore::from_parts(
            vec![],
            vec![],
            vec![],
            vec![],
            vec![Edge::new("A", "B", Relation::Contains)],
            ScenarioSections::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::DanglingEdge { .. }));
        assert!(err.to_string().contains("unknown node 'A'"));
    }

    #[test]
    fn duplicate_node_fails_load() {
        let section = |id: &str| Section {
            id: id.into(),
            number: "1".into(),
            title: "t".into(),
            text: "x".into(),
            chapter: None,
            chapter_title: None,
            act: "Act".into(),
        };
        let err = GraphStore::from_parts(
            vec![section("S1"), section("S1")],
            vec![],
            vec![],
            vec![],
            vec![],
            ScenarioSections::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateNode(_)));
    }

    #[test]
    fn children_follow_contains_edges() {
        let store = sample_store();
        let children = store.children_of("CPA2019_2");
        assert!(!children.is_empty());
        assert!(children.iter().all(|id| store.node(id).is_some()));
    }

    #[test]
    fn traverse_respects_relation_allowlist() {
        let store = sample_store();
        // Contains-only traversal from section 2 must not cross Defines edges.
        let nodes = store.traverse("CPA2019_2", &[Relation::Contains], 3);
        assert!(nodes.iter().all(|n| n.kind() != NodeKind::Definition));
    }

    #[test]
    fn traverse_terminates_on_cycles() {
        let section = |id: &str, number: &str| Section {
            id: id.into(),
            number: number.into(),
            title: "t".into(),
            text: "x".into(),
            chapter: None,
            chapter_title: None,
            act: "Act".into(),
        };
        let store = GraphStore::from_parts(
            vec![section("A", "1"), section("B", "2")],
            vec![],
            vec![],
            vec![],
            vec![
                Edge::new("A", "B", Relation::References),
                Edge::new("B", "A", Relation::References),
            ],
            ScenarioSections::default(),
        )
        .unwrap();
        let nodes = store.traverse("A", &[Relation::References], 10);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn traverse_bounded_by_depth() {
        let section = |id: &str, number: &str| Section {
            id: id.into(),
            number: number.into(),
            title: "t".into(),
            text: "x".into(),
            chapter: None,
            chapter_title: None,
            act: "Act".into(),
        };
        let store = GraphStore::from_parts(
            vec![section("A", "1"), section("B", "2"), section("C", "3")],
            vec![],
            vec![],
            vec![],
            vec![
                Edge::new("A", "B", Relation::References),
                Edge::new("B", "C", Relation::References),
            ],
            ScenarioSections::default(),
        )
        .unwrap();
        let nodes = store.traverse("A", &[Relation::References], 1);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn chapter_siblings_share_a_chapter() {
        let store = sample_store();
        let siblings = store.chapter_siblings("CPA2019_35", 3);
        let ids: Vec<&str> = siblings.iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["CPA2019_39"]);
        // A node without a chapter has no siblings.
        assert!(store.chapter_siblings("DEF_consumer", 3).is_empty());
    }

    #[test]
    fn text_match_scoring() {
        let terms = vec!["unfair trade practice".to_string()];
        // Exact phrase.
        assert_eq!(
            GraphStore::text_match_score("an unfair trade practice means", &terms),
            2.0
        );
        // Partial word credit: 2 of 3 words present.
        let partial = GraphStore::text_match_score("trade practice rules", &terms);
        assert!((partial - 2.0 / 3.0).abs() < 1e-6);
        // No match.
        assert_eq!(GraphStore::text_match_score("nothing relevant", &terms), 0.0);
        // Empty inputs.
        assert_eq!(GraphStore::text_match_score("", &terms), 0.0);
        assert_eq!(GraphStore::text_match_score("text", &[]), 0.0);
    }

    #[test]
    fn keyword_search_ranks_and_limits() {
        let store = sample_store();
        let hits = store.keyword_search(&["defect".to_string()], 5);
        assert!(!hits.is_empty());
        assert!(hits.len() <= 5);
        // Scores are in descending order.
        for pair in hits.windows(2) {
            assert!(pair[0].0 >= pair[1].0);
        }
    }

    #[test]
    fn keyword_search_is_deterministic() {
        let store = sample_store();
        let terms = vec!["consumer".to_string()];
        let a: Vec<&str> = store.keyword_search(&terms, 5).iter().map(|(_, n)| n.id()).collect();
        let b: Vec<&str> = store.keyword_search(&terms, 5).iter().map(|(_, n)| n.id()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn stats_count_collections_and_edges() {
        let store = sample_store();
        let stats = store.stats();
        assert!(stats.sections >= 5);
        assert!(stats.definitions >= 3);
        assert!(stats.rights >= 2);
        assert!(stats.contains_edges > 0);
        assert_eq!(
            stats.total_edges(),
            store.edges().len()
        );
    }
}
