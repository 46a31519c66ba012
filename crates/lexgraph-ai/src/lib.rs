pub mod assembler;
pub mod parser;
pub mod scorer;
pub mod validator;

pub use assembler::{ContextAssembler, DEFAULT_MAX_CONTEXT_LENGTH};
pub use parser::{IntentParser, IntentRule, LEGAL_VOCABULARY};
pub use scorer::{
    CitationTargets, ConfidenceScorer, InvalidThreshold, ScorerConfig, Thresholds,
};
pub use validator::{CitationConstraints, ResponseValidator};
