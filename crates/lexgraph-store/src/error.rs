use std::path::PathBuf;

use lexgraph_core::Relation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("knowledge graph directory not found: {0}")]
    GraphDirNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("dangling {relation} edge {from} -> {to}: unknown node '{missing}'", relation = relation.as_str())]
    DanglingEdge {
        from: String,
        to: String,
        relation: Relation,
        missing: String,
    },
}
