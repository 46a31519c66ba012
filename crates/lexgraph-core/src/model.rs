//! Knowledge-graph data model: typed nodes and directed, typed edges.
//!
//! The graph is built once by an offline ingestion pipeline and loaded
//! read-only at startup. Four node variants cover the structure of a single
//! legal instrument: sections, their clauses, defined terms, and granted
//! rights. The variant set is closed; every consumer matches exhaustively.

use serde::{Deserialize, Serialize};

/// A section of the act.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "section_id")]
    pub id: String,
    #[serde(rename = "section_number")]
    pub number: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub chapter_title: Option<String>,
    pub act: String,
}

/// A clause nested inside a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    #[serde(rename = "clause_id")]
    pub id: String,
    pub parent_section: String,
    pub label: String,
    pub text: String,
}

/// A term defined by the act.
///
/// The ingestion pipeline does not assign definition ids; the store
/// synthesises `DEF_<term>` ids at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub id: String,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub defined_in: Option<String>,
}

/// Category of a right extracted from the act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightType {
    ConsumerRight,
    ProceduralRight,
    RemedyRight,
    #[serde(other)]
    Unknown,
}

impl RightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsumerRight => "consumer_right",
            Self::ProceduralRight => "procedural_right",
            Self::RemedyRight => "remedy_right",
            Self::Unknown => "unknown",
        }
    }

    /// Display heading used when grouping rights in assembled context.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::ConsumerRight => "Consumer Rights",
            Self::ProceduralRight => "Procedural Rights",
            Self::RemedyRight => "Remedy Rights",
            Self::Unknown => "Other Rights",
        }
    }
}

/// A right granted by a provision of the act.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Right {
    #[serde(rename = "right_id")]
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub granted_by: Option<String>,
    pub right_type: RightType,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, rename = "enforcement_mechanism")]
    pub enforcement: Option<String>,
}

/// Discriminant for the four node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Section,
    Clause,
    Definition,
    Right,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Clause => "clause",
            Self::Definition => "definition",
            Self::Right => "right",
        }
    }
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Section(Section),
    Clause(Clause),
    Definition(Definition),
    Right(Right),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Self::Section(s) => &s.id,
            Self::Clause(c) => &c.id,
            Self::Definition(d) => &d.id,
            Self::Right(r) => &r.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Section(_) => NodeKind::Section,
            Self::Clause(_) => NodeKind::Clause,
            Self::Definition(_) => NodeKind::Definition,
            Self::Right(_) => NodeKind::Right,
        }
    }

    /// Main text content of the node.
    pub fn text(&self) -> &str {
        match self {
            Self::Section(s) => &s.text,
            Self::Clause(c) => &c.text,
            Self::Definition(d) => &d.definition,
            Self::Right(r) => &r.description,
        }
    }

    /// Formatted citation string for the node.
    pub fn citation(&self) -> String {
        match self {
            Self::Section(s) => format!("Section {}, {}", s.number, s.act),
            Self::Clause(c) => format!("{}, Clause {}", c.parent_section, c.label),
            Self::Definition(d) => match &d.defined_in {
                Some(section) => format!("Definition of '{}' in {}", d.term, section),
                None => format!("Definition of '{}'", d.term),
            },
            Self::Right(r) => match &r.granted_by {
                Some(section) => format!("Right granted by {}", section),
                None => r.id.clone(),
            },
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Self::Section(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_definition(&self) -> Option<&Definition> {
        match self {
            Self::Definition(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_right(&self) -> Option<&Right> {
        match self {
            Self::Right(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_clause(&self) -> Option<&Clause> {
        match self {
            Self::Clause(c) => Some(c),
            _ => None,
        }
    }
}

/// Relation type carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Contains,
    References,
    Defines,
    GrantsRight,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::References => "references",
            Self::Defines => "defines",
            Self::GrantsRight => "grants_right",
        }
    }
}

/// A directed, typed edge between two nodes.
///
/// Both endpoints must resolve to loaded nodes; the store enforces this at
/// load time and fails on any dangling endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relation: Relation,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, relation: Relation) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation,
        }
    }
}
