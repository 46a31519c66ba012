//! Loading the knowledge graph from its on-disk JSON layout.
//!
//! The ingestion pipeline writes one JSON array per collection:
//!
//! ```text
//! <graph>/nodes/sections.json      edges/contains.json   {parent, child}
//! <graph>/nodes/clauses.json       edges/references.json {from, to}
//! <graph>/nodes/definitions.json   edges/defines.json    {source, target}
//! <graph>/nodes/rights.json        edges/grants.json     {source, target}
//! ```
//!
//! A missing file is an empty collection; a missing graph directory is a
//! load error. Integrity failures (dangling edges, duplicate ids) are fatal.

use std::path::Path;

use lexgraph_core::{Clause, Definition, Edge, Relation, Right, Section};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::error::StoreError;
use crate::retrieve::ScenarioSections;
use crate::store::GraphStore;

#[derive(Deserialize)]
struct ContainsRecord {
    parent: String,
    child: String,
}

#[derive(Deserialize)]
struct ReferenceRecord {
    from: String,
    to: String,
}

#[derive(Deserialize)]
struct SourceTargetRecord {
    source: String,
    target: String,
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl GraphStore {
    /// Load and index the knowledge graph from `dir`, using the default
    /// scenario-section configuration.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::load_with(dir, ScenarioSections::default())
    }

    /// Load and index the knowledge graph from `dir` with explicit
    /// scenario-section configuration.
    pub fn load_with(
        dir: impl AsRef<Path>,
        scenarios: ScenarioSections,
    ) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(StoreError::GraphDirNotFound(dir.to_path_buf()));
        }
        let nodes = dir.join("nodes");
        let edges_dir = dir.join("edges");

        let sections: Vec<Section> = load_collection(&nodes.join("sections.json"))?;
        let clauses: Vec<Clause> = load_collection(&nodes.join("clauses.json"))?;
        let definitions: Vec<Definition> = load_collection(&nodes.join("definitions.json"))?;
        let rights: Vec<Right> = load_collection(&nodes.join("rights.json"))?;

        let mut edges: Vec<Edge> = Vec::new();
        let contains: Vec<ContainsRecord> = load_collection(&edges_dir.join("contains.json"))?;
        edges.extend(
            contains
                .into_iter()
                .map(|r| Edge::new(r.parent, r.child, Relation::Contains)),
        );
        let references: Vec<ReferenceRecord> =
            load_collection(&edges_dir.join("references.json"))?;
        edges.extend(
            references
                .into_iter()
                .map(|r| Edge::new(r.from, r.to, Relation::References)),
        );
        let defines: Vec<SourceTargetRecord> = load_collection(&edges_dir.join("defines.json"))?;
        edges.extend(
            defines
                .into_iter()
                .map(|r| Edge::new(r.source, r.target, Relation::Defines)),
        );
        let grants: Vec<SourceTargetRecord> = load_collection(&edges_dir.join("grants.json"))?;
        edges.extend(
            grants
                .into_iter()
                .map(|r| Edge::new(r.source, r.target, Relation::GrantsRight)),
        );

        info!(path = %dir.display(), "loading knowledge graph");
        Self::from_parts(sections, clauses, definitions, rights, edges, scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_graph(dir: &Path, sections: &str, defines: &str) {
        fs::create_dir_all(dir.join("nodes")).unwrap();
        fs::create_dir_all(dir.join("edges")).unwrap();
        fs::write(dir.join("nodes/sections.json"), sections).unwrap();
        fs::write(
            dir.join("nodes/definitions.json"),
            r#"[{"term": "consumer", "definition": "a buyer of goods", "defined_in": "S2"}]"#,
        )
        .unwrap();
        fs::write(dir.join("edges/defines.json"), defines).unwrap();
    }

    const SECTIONS: &str = r#"[{
        "section_id": "S2",
        "section_number": "2",
        "title": "Definitions",
        "text": "In this Act...",
        "act": "Consumer Protection Act, 2019"
    }]"#;

    #[test]
    fn loads_from_directory_and_synthesises_definition_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_graph(
            dir.path(),
            SECTIONS,
            r#"[{"source": "S2", "target": "DEF_consumer"}]"#,
        );

        let store = GraphStore::load(dir.path()).unwrap();
        assert!(store.section_by_number("2").is_some());
        assert!(store.definition_by_term("consumer").is_some());
        assert_eq!(store.stats().defines_edges, 1);
    }

    #[test]
    fn missing_files_are_empty_collections() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nodes")).unwrap();
        let store = GraphStore::load(dir.path()).unwrap();
        assert_eq!(store.stats().total_nodes(), 0);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = GraphStore::load("/nonexistent/graph/dir").unwrap_err();
        assert!(matches!(err, StoreError::GraphDirNotFound(_)));
    }

    #[test]
    fn dangling_edge_in_files_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_graph(
            dir.path(),
            SECTIONS,
            r#"[{"source": "S2", "target": "DEF_nonexistent"}]"#,
        );
        let err = GraphStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::DanglingEdge { .. }));
    }

    #[test]
    fn malformed_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nodes")).unwrap();
        fs::write(dir.path().join("nodes/sections.json"), "not json").unwrap();
        let err = GraphStore::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("sections.json"));
    }
}
