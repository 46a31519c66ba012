//! Instrument configuration: the supported act and its closed catalog of
//! fundamental rights.
//!
//! The six-right enumeration is tied to one specific provision of one
//! instrument. Keeping it as a configuration table (rather than literals in
//! the assembler) makes a second instrument a data change, not a code
//! change. The core currently supports one instrument at a time.

use serde::{Deserialize, Serialize};

/// One fundamental right from the instrument's closed catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalRight {
    pub title: String,
    pub description: String,
    /// Sub-provision reference, e.g. "Section 2(9)(a)".
    pub section_ref: String,
}

/// The legal instrument the graph was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Full act name as it appears on section nodes, used for temporal
    /// validity checks and citation strings.
    pub name: String,
    /// Bare number of the section granting the fundamental rights.
    pub rights_section: String,
    pub fundamental_rights: Vec<FundamentalRight>,
}

impl Instrument {
    /// Consumer Protection Act, 2019 — the instrument shipped with the
    /// reference knowledge graph.
    pub fn cpa_2019() -> Self {
        let right = |title: &str, description: &str, section_ref: &str| FundamentalRight {
            title: title.to_string(),
            description: description.to_string(),
            section_ref: section_ref.to_string(),
        };
        Self {
            name: "Consumer Protection Act, 2019".to_string(),
            rights_section: "2".to_string(),
            fundamental_rights: vec![
                right(
                    "Right to Safety",
                    "Protection against goods and services which are hazardous to life and property",
                    "Section 2(9)(a)",
                ),
                right(
                    "Right to be Informed",
                    "Right to be informed about the quality, quantity, potency, purity, standard and price of goods or services",
                    "Section 2(9)(b)",
                ),
                right(
                    "Right to Choose",
                    "Right to be assured of access to a variety of goods and services at competitive prices",
                    "Section 2(9)(c)",
                ),
                right(
                    "Right to be Heard",
                    "Right to be heard and to be assured that consumer interests will receive due consideration",
                    "Section 2(9)(d)",
                ),
                right(
                    "Right to Seek Redressal",
                    "Right to seek redressal against unfair trade practices or restrictive trade practices or unscrupulous exploitation of consumers",
                    "Section 2(9)(e)",
                ),
                right(
                    "Right to Consumer Education",
                    "Right to consumer education and to be informed about consumer rights and remedies",
                    "Section 2(9)(f)",
                ),
            ],
        }
    }

    /// Citation string used for each fundamental right.
    pub fn rights_citation(&self) -> String {
        format!("Section {}, {}", self.rights_section, self.name)
    }
}

/// Read-only lookups into the loaded graph, implemented by the store.
///
/// The validator and parser consume this seam instead of the store type so
/// the heuristic layer stays independent of storage.
pub trait GraphIndex {
    /// Whether a bare section number exists in the section index.
    fn has_section(&self, number: &str) -> bool;

    /// Whether a term (case-insensitive) exists in the definition index.
    fn has_term(&self, term: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpa_2019_has_six_rights() {
        let instrument = Instrument::cpa_2019();
        assert_eq!(instrument.fundamental_rights.len(), 6);
        assert_eq!(
            instrument.rights_citation(),
            "Section 2, Consumer Protection Act, 2019"
        );
    }

    #[test]
    fn rights_cover_distinct_subprovisions() {
        let instrument = Instrument::cpa_2019();
        let refs: std::collections::HashSet<&str> = instrument
            .fundamental_rights
            .iter()
            .map(|r| r.section_ref.as_str())
            .collect();
        assert_eq!(refs.len(), 6);
    }
}
