pub mod confidence;
pub mod context;
pub mod instrument;
pub mod intent;
pub mod issue;
pub mod model;
pub mod section_ref;

pub use confidence::{
    ComponentScores, ComponentWeights, ConfidenceLevel, ConfidenceReport, ScoreMetadata,
};
pub use context::{AssembledContext, BlockCounts, GraphContext};
pub use instrument::{FundamentalRight, GraphIndex, Instrument};
pub use intent::{
    Audience, Complexity, IntentCategory, QueryIntent, TemporalQualifier, UnknownAudience,
};
pub use issue::{IssueKind, Severity, ValidationIssue, ValidationReport};
pub use model::{
    Clause, Definition, Edge, Node, NodeKind, Relation, Right, RightType, Section,
};
pub use section_ref::{base_number, normalize_section_ref};
