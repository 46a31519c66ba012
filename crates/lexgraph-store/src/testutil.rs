//! Shared in-memory graph fixture for store tests.

use lexgraph_core::{
    Clause, Definition, Edge, IntentCategory, QueryIntent, Relation, Right, RightType, Section,
};

use crate::retrieve::ScenarioSections;
use crate::store::GraphStore;

const ACT: &str = "Consumer Protection Act, 2019";

fn section(id: &str, number: &str, title: &str, text: &str, chapter: &str) -> Section {
    Section {
        id: id.into(),
        number: number.into(),
        title: title.into(),
        text: text.into(),
        chapter: Some(chapter.into()),
        chapter_title: Some(format!("Chapter {chapter}")),
        act: ACT.into(),
    }
}

fn definition(term: &str, text: &str) -> Definition {
    Definition {
        id: format!("DEF_{}", term.to_lowercase()),
        term: term.into(),
        definition: text.into(),
        defined_in: Some("CPA2019_2".into()),
    }
}

/// A small but structurally complete graph: five sections, two clauses,
/// five definitions, three rights, and all four edge relations.
pub(crate) fn sample_store() -> GraphStore {
    let sections = vec![
        section(
            "CPA2019_2",
            "2",
            "Definitions",
            "In this Act, unless the context otherwise requires, consumer means any person who buys goods or hires services for consideration.",
            "1",
        ),
        section(
            "CPA2019_18",
            "18",
            "Powers and functions of Central Authority",
            "The Central Authority may inquire into violations of consumer rights and misleading advertisements.",
            "3",
        ),
        section(
            "CPA2019_21",
            "21",
            "Penalties for misleading advertisement",
            "The Central Authority may impose a penalty on a manufacturer or endorser for a false or misleading advertisement.",
            "3",
        ),
        section(
            "CPA2019_35",
            "35",
            "Manner in which complaint shall be made",
            "A complaint in relation to any goods sold or any service provided may be filed with a District Commission.",
            "4",
        ),
        section(
            "CPA2019_39",
            "39",
            "Findings of District Commission",
            "The District Commission may order removal of defects, replacement of defective goods, refund of price, and redressal for deficiency in services.",
            "4",
        ),
    ];

    let clauses = vec![
        Clause {
            id: "CPA2019_2_cl_7".into(),
            parent_section: "Section 2".into(),
            label: "(7)".into(),
            text: "\"consumer\" means any person who buys any goods for a consideration.".into(),
        },
        Clause {
            id: "CPA2019_2_cl_9".into(),
            parent_section: "Section 2".into(),
            label: "(9)".into(),
            text: "\"consumer rights\" includes the rights enumerated in this clause.".into(),
        },
    ];

    let definitions = vec![
        definition(
            "consumer",
            "any person who buys any goods or hires or avails of any service for a consideration",
        ),
        definition(
            "defect",
            "any fault, imperfection or shortcoming in the quality, quantity, potency, purity or standard of goods",
        ),
        definition(
            "deficiency",
            "any fault, imperfection, shortcoming or inadequacy in the quality, nature and manner of performance of a service",
        ),
        definition(
            "misleading advertisement",
            "an advertisement which falsely describes a product or service or gives a false guarantee",
        ),
        definition(
            "advertisement",
            "any audio or visual publicity, representation, endorsement or pronouncement",
        ),
    ];

    let rights = vec![
        Right {
            id: "RIGHT_quality".into(),
            description: "the right to be assured of the quality of goods and services and to seek redressal against unfair trade practices".into(),
            granted_by: Some("CPA2019_2".into()),
            right_type: RightType::ConsumerRight,
            scope: Some("all goods and services".into()),
            enforcement: Some("District Commission".into()),
        },
        Right {
            id: "RIGHT_informed".into(),
            description: "the right to be informed about the quality, quantity, potency, purity and price of goods".into(),
            granted_by: Some("CPA2019_2".into()),
            right_type: RightType::ConsumerRight,
            scope: None,
            enforcement: None,
        },
        Right {
            id: "RIGHT_procedural".into(),
            description: "the right to file a complaint before the District Commission".into(),
            granted_by: Some("CPA2019_2".into()),
            right_type: RightType::ProceduralRight,
            scope: Some("complaint procedure".into()),
            enforcement: None,
        },
    ];

    let edges = vec![
        Edge::new("CPA2019_2", "CPA2019_2_cl_7", Relation::Contains),
        Edge::new("CPA2019_2", "CPA2019_2_cl_9", Relation::Contains),
        Edge::new("CPA2019_2", "DEF_consumer", Relation::Defines),
        Edge::new("CPA2019_2", "DEF_defect", Relation::Defines),
        Edge::new("CPA2019_2", "DEF_deficiency", Relation::Defines),
        Edge::new("CPA2019_2", "DEF_misleading advertisement", Relation::Defines),
        Edge::new("CPA2019_2", "DEF_advertisement", Relation::Defines),
        Edge::new("CPA2019_2", "RIGHT_quality", Relation::GrantsRight),
        Edge::new("CPA2019_2", "RIGHT_informed", Relation::GrantsRight),
        Edge::new("CPA2019_2", "RIGHT_procedural", Relation::GrantsRight),
        Edge::new("CPA2019_35", "CPA2019_39", Relation::References),
    ];

    GraphStore::from_parts(
        sections,
        clauses,
        definitions,
        rights,
        edges,
        ScenarioSections::default(),
    )
    .expect("fixture graph is well-formed")
}

pub(crate) fn intent_with(
    category: IntentCategory,
    legal_terms: &[&str],
    section_numbers: &[&str],
    query: &str,
) -> QueryIntent {
    QueryIntent {
        category,
        entities: Vec::new(),
        section_numbers: section_numbers.iter().map(|s| s.to_string()).collect(),
        legal_terms: legal_terms.iter().map(|s| s.to_string()).collect(),
        confidence: 0.6,
        original_query: query.into(),
        temporal: None,
    }
}
