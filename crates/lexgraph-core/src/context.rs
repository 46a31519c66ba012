//! Retrieval and assembly context passed between pipeline stages.

use serde::{Deserialize, Serialize};

use crate::intent::Audience;
use crate::model::{Edge, Node, NodeKind};

/// How many leading traversal-path entries count as primary matches.
const PRIMARY_PATH_LEN: usize = 3;

/// Context retrieved from the knowledge graph for one query.
///
/// `traversal_path` records retrieval provenance: the ordered node ids the
/// strategy visited. Nodes whose ids appear in the first three path entries
/// are the primary matches; everything else was reached through edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphContext {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub citations: Vec<String>,
    pub confidence: f32,
    pub traversal_path: Vec<String>,
}

impl GraphContext {
    /// Empty context at zero confidence. Absence of results is a valid
    /// state, not an error.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that directly matched the query.
    pub fn primary_nodes(&self) -> Vec<&Node> {
        let primary: &[String] =
            &self.traversal_path[..self.traversal_path.len().min(PRIMARY_PATH_LEN)];
        self.nodes
            .iter()
            .filter(|n| primary.iter().any(|id| id == n.id()))
            .collect()
    }

    /// Nodes reached through edges rather than direct match.
    pub fn related_nodes(&self) -> Vec<&Node> {
        let primary: Vec<&str> = self.primary_nodes().iter().map(|n| n.id()).collect();
        self.nodes
            .iter()
            .filter(|n| !primary.contains(&n.id()))
            .collect()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.kind() == kind).collect()
    }
}

/// Per-kind counts of nodes emitted into assembled context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCounts {
    pub sections: usize,
    pub clauses: usize,
    pub definitions: usize,
    pub rights: usize,
}

/// Citation-tagged context ready for the generation provider.
///
/// Invariant: every `[Citation-k]` token in `formatted_text` has a matching
/// key in `citations`. Keys are sequential per assembly call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    pub formatted_text: String,
    /// Ordered (key, citation) pairs, e.g. ("Citation-1", "Section 2, ...").
    pub citations: Vec<(String, String)>,
    pub counts: BlockCounts,
    pub audience: Audience,
    /// Provision labels for the primary block, e.g. "Section 35".
    pub primary_provisions: Vec<String>,
    pub related_provisions: Vec<String>,
    /// Terms covered by the definitions block.
    pub definitions: Vec<String>,
    pub truncated: bool,
}

impl AssembledContext {
    pub fn total_length(&self) -> usize {
        self.formatted_text.len()
    }

    pub fn citation_count(&self) -> usize {
        self.citations.len()
    }

    /// Resolve a citation key to its citation string.
    pub fn citation(&self, key: &str) -> Option<&str> {
        self.citations
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Definition, Section};

    fn section(id: &str, number: &str) -> Node {
        Node::Section(Section {
            id: id.into(),
            number: number.into(),
            title: format!("Title {number}"),
            text: "text".into(),
            chapter: None,
            chapter_title: None,
            act: "Consumer Protection Act, 2019".into(),
        })
    }

    fn definition(term: &str) -> Node {
        Node::Definition(Definition {
            id: format!("DEF_{term}"),
            term: term.into(),
            definition: "some meaning".into(),
            defined_in: None,
        })
    }

    #[test]
    fn primary_nodes_follow_traversal_path_head() {
        let ctx = GraphContext {
            nodes: vec![section("S1", "1"), section("S2", "2"), definition("consumer")],
            edges: vec![],
            citations: vec![],
            confidence: 0.8,
            traversal_path: vec!["S1".into(), "DEF_consumer".into()],
        };
        let primary: Vec<&str> = ctx.primary_nodes().iter().map(|n| n.id()).collect();
        assert_eq!(primary, vec!["S1", "DEF_consumer"]);
        let related: Vec<&str> = ctx.related_nodes().iter().map(|n| n.id()).collect();
        assert_eq!(related, vec!["S2"]);
    }

    #[test]
    fn path_entries_past_three_are_related() {
        let ctx = GraphContext {
            nodes: (1..=5).map(|i| section(&format!("S{i}"), &i.to_string())).collect(),
            edges: vec![],
            citations: vec![],
            confidence: 0.8,
            traversal_path: (1..=5).map(|i| format!("S{i}")).collect(),
        };
        assert_eq!(ctx.primary_nodes().len(), 3);
        assert_eq!(ctx.related_nodes().len(), 2);
    }

    #[test]
    fn empty_context_has_no_primaries() {
        let ctx = GraphContext::empty();
        assert!(ctx.is_empty());
        assert!(ctx.primary_nodes().is_empty());
    }

    #[test]
    fn citation_lookup_by_key() {
        let assembled = AssembledContext {
            formatted_text: "**X** [Citation-1]".into(),
            citations: vec![("Citation-1".into(), "Section 2, CPA 2019".into())],
            counts: BlockCounts::default(),
            audience: Audience::Citizen,
            primary_provisions: vec![],
            related_provisions: vec![],
            definitions: vec![],
            truncated: false,
        };
        assert_eq!(assembled.citation("Citation-1"), Some("Section 2, CPA 2019"));
        assert_eq!(assembled.citation("Citation-2"), None);
        assert_eq!(assembled.citation_count(), 1);
    }
}
