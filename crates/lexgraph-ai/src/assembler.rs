//! Assembles retrieved graph context into ordered, citation-tagged text
//! blocks for the generation provider.
//!
//! Block order: Primary Provisions → Legal Definitions → Rights (rights
//! queries only) → Related Provisions → Hierarchical Context. Every emitted
//! node receives exactly one fresh sequential citation key; the counter
//! resets at the start of each assembly call. Truncation drops trailing
//! blocks first and never touches the first two structural blocks.

use lexgraph_core::{
    AssembledContext, Audience, BlockCounts, GraphContext, Instrument, IntentCategory, Node,
    NodeKind, QueryIntent, RightType,
};
use std::collections::HashSet;
use tracing::debug;

/// Default ceiling on assembled context length, in characters.
pub const DEFAULT_MAX_CONTEXT_LENGTH: usize = 8000;

/// Related-provision text previews are clipped to this many characters.
const BRIEF_TEXT_LIMIT: usize = 200;
/// Hierarchical context lists at most this many sections per chapter.
const CHAPTER_SECTION_LIMIT: usize = 3;
/// Space reserved for the truncation marker when clipping a block.
const TRUNCATION_RESERVE: usize = 100;
/// Leading blocks never dropped by truncation.
const PROTECTED_BLOCKS: usize = 2;

const TRUNCATION_MARKER: &str = "\n\n[Context truncated due to length limits]";

/// Sequential citation key allocator, fresh per assembly call.
#[derive(Default)]
struct Citations {
    entries: Vec<(String, String)>,
}

impl Citations {
    /// Allocate the next key for a citation string.
    fn push(&mut self, citation: String) -> String {
        let key = format!("Citation-{}", self.entries.len() + 1);
        self.entries.push((key.clone(), citation));
        key
    }
}

/// One labelled text block of assembled context.
struct Block {
    header: &'static str,
    body: String,
}

/// Builds LLM-ready context from graph retrieval results.
pub struct ContextAssembler {
    max_context_length: usize,
    instrument: Instrument,
}

impl ContextAssembler {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            max_context_length: DEFAULT_MAX_CONTEXT_LENGTH,
            instrument,
        }
    }

    pub fn with_max_length(mut self, max_context_length: usize) -> Self {
        self.max_context_length = max_context_length;
        self
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Assemble context blocks for one retrieval.
    pub fn assemble(
        &self,
        graph: &GraphContext,
        intent: &QueryIntent,
        audience: Audience,
    ) -> AssembledContext {
        let mut citations = Citations::default();
        let mut blocks: Vec<Block> = Vec::new();
        let mut counts = BlockCounts::default();

        let definitions = graph.nodes_of_kind(NodeKind::Definition);
        let rights_to_block = intent.category == IntentCategory::RightsQuery;

        // All direct matches count as primary provisions, whichever block
        // renders them.
        let primary_provisions: Vec<String> = graph
            .primary_nodes()
            .iter()
            .map(|n| provision_label(n))
            .collect();

        // Primary block: direct matches, excluding definitions (which get
        // their own block) and rights when a dedicated rights block is
        // being emitted.
        let primary: Vec<&Node> = graph
            .primary_nodes()
            .into_iter()
            .filter(|n| n.kind() != NodeKind::Definition)
            .filter(|n| !(rights_to_block && n.kind() == NodeKind::Right))
            .collect();
        if !primary.is_empty() {
            let body = primary
                .iter()
                .map(|node| {
                    count_node(&mut counts, node);
                    let key = citations.push(node.citation());
                    format_node_full(node, &key)
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            blocks.push(Block {
                header: "=== PRIMARY LEGAL PROVISIONS ===",
                body,
            });
        }

        // Legal definitions.
        let definition_terms: Vec<String> = definitions
            .iter()
            .filter_map(|n| n.as_definition())
            .map(|d| d.term.clone())
            .collect();
        if !definitions.is_empty() {
            let body = definitions
                .iter()
                .map(|node| {
                    counts.definitions += 1;
                    let key = citations.push(node.citation());
                    let def = node.as_definition().expect("definition node");
                    format!(
                        "**{}**: {} [{}]",
                        def.term.to_uppercase(),
                        def.definition,
                        key
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            blocks.push(Block {
                header: "=== LEGAL DEFINITIONS ===",
                body,
            });
        }

        // Rights: only for rights queries. The fixed fundamental-right
        // enumeration always comes first, each right with its own citation,
        // regardless of what retrieval found.
        if rights_to_block {
            blocks.push(Block {
                header: "=== CONSUMER RIGHTS ===",
                body: self.rights_body(graph, &mut citations, &mut counts),
            });
        }

        // Related provisions: nodes reached through edges, brief format.
        let edge_targets: HashSet<&str> = graph.edges.iter().map(|e| e.to.as_str()).collect();
        let related: Vec<&Node> = graph
            .related_nodes()
            .into_iter()
            .filter(|n| edge_targets.contains(n.id()))
            .filter(|n| matches!(n.kind(), NodeKind::Section | NodeKind::Clause))
            .collect();
        let related_provisions: Vec<String> = related.iter().map(|n| provision_label(n)).collect();
        if !related.is_empty() {
            let body = related
                .iter()
                .map(|node| {
                    count_node(&mut counts, node);
                    let key = citations.push(node.citation());
                    format_node_brief(node, &key)
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            blocks.push(Block {
                header: "=== RELATED PROVISIONS ===",
                body,
            });
        }

        // Hierarchical context: chapter groupings, no citations.
        if let Some(body) = hierarchical_body(graph) {
            blocks.push(Block {
                header: "=== CONTEXTUAL INFORMATION ===",
                body,
            });
        }

        let (mut formatted_text, truncated) = self.join_blocks(blocks);
        self.apply_audience(&mut formatted_text, audience, &citations);

        debug!(
            blocks = counts.sections + counts.clauses + counts.definitions + counts.rights,
            citations = citations.entries.len(),
            length = formatted_text.len(),
            truncated,
            "context assembled"
        );

        AssembledContext {
            formatted_text,
            citations: citations.entries,
            counts,
            audience,
            primary_provisions,
            related_provisions,
            definitions: definition_terms,
            truncated,
        }
    }

    /// The six fundamental rights, then additional graph rights grouped by
    /// type (the consumer-right group is covered by the enumeration).
    fn rights_body(
        &self,
        graph: &GraphContext,
        citations: &mut Citations,
        counts: &mut BlockCounts,
    ) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(format!(
            "**Fundamental Consumer Rights (Section {} of {}):**",
            self.instrument.rights_section, self.instrument.name
        ));
        lines.push(String::new());

        for (index, right) in self.instrument.fundamental_rights.iter().enumerate() {
            let key = citations.push(self.instrument.rights_citation());
            counts.rights += 1;
            lines.push(format!(
                "{}. **{}**: {} [{}]",
                index + 1,
                right.title,
                right.description,
                key
            ));
        }
        lines.push(String::new());

        for group in [
            RightType::ProceduralRight,
            RightType::RemedyRight,
            RightType::Unknown,
        ] {
            let group_rights: Vec<&Node> = graph
                .nodes_of_kind(NodeKind::Right)
                .into_iter()
                .filter(|n| n.as_right().is_some_and(|r| r.right_type == group))
                .collect();
            if group_rights.is_empty() {
                continue;
            }
            lines.push(format!("**{}:**", group.heading()));
            for node in group_rights {
                let key = citations.push(node.citation());
                counts.rights += 1;
                let right = node.as_right().expect("right node");
                let mut line = format!("• {}", right.description);
                if let Some(scope) = &right.scope {
                    line.push_str(&format!(" (Scope: {scope})"));
                }
                line.push_str(&format!(" [{key}]"));
                lines.push(line);
            }
            lines.push(String::new());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }

    /// Join blocks under the length ceiling. The first two structural
    /// blocks are always preserved; trailing blocks are dropped or clipped
    /// with a truncation marker.
    fn join_blocks(&self, blocks: Vec<Block>) -> (String, bool) {
        let rendered: Vec<String> = blocks
            .into_iter()
            .map(|b| format!("{}\n{}", b.header, b.body))
            .collect();
        let full = rendered.join("\n\n");
        if full.len() <= self.max_context_length {
            return (full, false);
        }

        let mut kept: Vec<String> = Vec::new();
        let mut length = 0usize;
        let mut clipped_marker = false;
        for (index, block) in rendered.into_iter().enumerate() {
            if index < PROTECTED_BLOCKS {
                length += block.len();
                kept.push(block);
                continue;
            }
            if length + block.len() < self.max_context_length {
                length += block.len();
                kept.push(block);
            } else {
                let remaining = self
                    .max_context_length
                    .saturating_sub(length + TRUNCATION_RESERVE);
                if remaining > 0 {
                    let partial: String = block.chars().take(remaining).collect();
                    kept.push(format!("{partial}{TRUNCATION_MARKER}"));
                    clipped_marker = true;
                }
                break;
            }
        }
        let mut text = kept.join("\n\n");
        if !clipped_marker {
            text.push_str(TRUNCATION_MARKER);
        }
        (text, true)
    }

    /// Audience post-processing rewrites headers or appends summaries
    /// without altering the citation map.
    fn apply_audience(&self, text: &mut String, audience: Audience, citations: &Citations) {
        match audience {
            Audience::Citizen => {
                *text = text
                    .replace(
                        "=== PRIMARY LEGAL PROVISIONS ===",
                        "=== RELEVANT LAWS THAT APPLY TO YOUR SITUATION ===",
                    )
                    .replace(
                        "=== LEGAL DEFINITIONS ===",
                        "=== WHAT THESE LEGAL TERMS MEAN ===",
                    )
                    .replace("=== CONSUMER RIGHTS ===", "=== YOUR RIGHTS AS A CONSUMER ===");
            }
            Audience::Lawyer => {
                if !citations.entries.is_empty() {
                    text.push_str("\n\n=== CITATION SUMMARY ===\n");
                    for (key, citation) in &citations.entries {
                        text.push_str(&format!("{key}: {citation}\n"));
                    }
                }
            }
            Audience::Judge => {
                *text = format!(
                    "=== JUDICIAL CONTEXT ===\nThe following provisions are relevant for judicial consideration:\n\n{text}"
                );
            }
        }
    }
}

fn count_node(counts: &mut BlockCounts, node: &Node) {
    match node.kind() {
        NodeKind::Section => counts.sections += 1,
        NodeKind::Clause => counts.clauses += 1,
        NodeKind::Definition => counts.definitions += 1,
        NodeKind::Right => counts.rights += 1,
    }
}

fn provision_label(node: &Node) -> String {
    match node {
        Node::Section(s) => format!("Section {}", s.number),
        Node::Clause(c) => format!("{}, Clause {}", c.parent_section, c.label),
        Node::Definition(d) => format!("Definition of '{}'", d.term),
        Node::Right(r) => r.id.clone(),
    }
}

/// Full format for the primary block.
fn format_node_full(node: &Node, key: &str) -> String {
    match node {
        Node::Section(s) => format!("**Section {}: {}** [{}]\n\n{}", s.number, s.title, key, s.text),
        Node::Clause(c) => format!(
            "**{}, Clause {}** [{}]\n\n{}",
            c.parent_section, c.label, key, c.text
        ),
        Node::Definition(d) => format!("**Definition of '{}'** [{}]\n\n{}", d.term, key, d.definition),
        Node::Right(r) => {
            let mut out = format!("**Consumer Right** [{}]\n\n{}", key, r.description);
            if let Some(scope) = &r.scope {
                out.push_str(&format!("\n\n**Scope**: {scope}"));
            }
            if let Some(enforcement) = &r.enforcement {
                out.push_str(&format!("\n\n**Enforcement**: {enforcement}"));
            }
            out
        }
    }
}

/// Brief format for related provisions: title line plus a clipped preview.
fn format_node_brief(node: &Node, key: &str) -> String {
    let title = match node {
        Node::Section(s) => format!("**Section {}**: {} [{}]", s.number, s.title, key),
        Node::Clause(c) => format!("**{}, Clause {}** [{}]", c.parent_section, c.label, key),
        _ => format!("**{}** [{}]", provision_label(node), key),
    };
    let text = node.text();
    if text.len() > BRIEF_TEXT_LIMIT {
        let preview: String = text.chars().take(BRIEF_TEXT_LIMIT).collect();
        format!("{title}\n{preview}...")
    } else {
        format!("{title}\n{text}")
    }
}

/// Chapter groupings over the section nodes; only chapters holding more
/// than one retrieved section are shown.
fn hierarchical_body(graph: &GraphContext) -> Option<String> {
    let sections = graph.nodes_of_kind(NodeKind::Section);
    let mut chapters: Vec<(String, Vec<&Node>)> = Vec::new();
    for node in sections {
        let Some(title) = node
            .as_section()
            .and_then(|s| s.chapter_title.clone())
        else {
            continue;
        };
        match chapters.iter_mut().find(|(t, _)| *t == title) {
            Some((_, nodes)) => nodes.push(node),
            None => chapters.push((title, vec![node])),
        }
    }
    chapters.retain(|(_, nodes)| nodes.len() > 1);
    if chapters.is_empty() {
        return None;
    }

    let mut lines = Vec::new();
    for (title, nodes) in chapters {
        lines.push(format!("**{title}:**"));
        for node in nodes.iter().take(CHAPTER_SECTION_LIMIT) {
            let section = node.as_section().expect("section node");
            lines.push(format!("• Section {}: {}", section.number, section.title));
        }
        lines.push(String::new());
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    Some(lines.join("\n"))
}
