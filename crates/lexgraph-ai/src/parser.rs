//! Intent classification and entity extraction for natural-language legal
//! queries.
//!
//! Classification is a data-driven table of (category, trigger patterns)
//! rows with a pure match-ratio scoring function: the category matching the
//! largest fraction of its own patterns wins. Unmatched input falls back to
//! scenario analysis at low confidence — parsing never fails.

use lexgraph_core::{
    normalize_section_ref, IntentCategory, QueryIntent, TemporalQualifier,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Confidence assigned to the catch-all classification.
const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Fixed legal vocabulary for term extraction. Matching also covers
/// underscore and concatenated variants of multi-word terms.
pub const LEGAL_VOCABULARY: &[&str] = &[
    "consumer",
    "trader",
    "manufacturer",
    "service provider",
    "complainant",
    "defect",
    "deficiency",
    "unfair trade practice",
    "restrictive trade practice",
    "misleading advertisement",
    "false advertisement",
    "consumer rights",
    "product liability",
    "compensation",
    "redressal",
    "complaint",
    "district commission",
    "state commission",
    "national commission",
    "central authority",
    "consumer protection",
    "goods",
    "services",
    "warranty",
    "guarantee",
    "endorsement",
    "e-commerce",
    "direct selling",
];

/// Reference keywords never reported as generic entities.
const ENTITY_STOPWORDS: &[&str] = &["section", "sec", "s", "act", "chapter", "clause", "part"];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static intent pattern"))
        .collect()
}

static DEFINITION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:what\s+is|what\s+does|define|definition\s+of|meaning\s+of|explain)\b.*\b(?:consumer|trader|defect|deficiency|unfair\s+trade|advertisement)\b",
        r"(?i)\b(?:consumer|trader|defect|deficiency|unfair\s+trade|advertisement)\b.*\b(?:means?|definition|defined\s+as)\b",
        r"(?i)\b(?:term|word)\b.*\b(?:consumer|trader|defect|deficiency|unfair\s+trade|advertisement)\b",
    ])
});

static SECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bsection\s+\d+\b",
        r"(?i)\bs\.\s*\d+\b",
        r"(?i)\bsec\.\s*\d+\b",
        r"(?i)\b(?:show|tell|find|get)\b.*\bsection\b",
        r"(?i)\b(?:chapter|part)\s+\d+\b",
    ])
});

static RIGHTS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:rights?|entitled?|entitlements?|protection)\b.*\b(?:consumer|buyer|customer)\b",
        r"(?i)\b(?:consumer|buyer|customer)\b.*\b(?:rights?|entitled?|entitlements?|protection)\b",
        r"(?i)\b(?:what\s+can|how\s+can)\b.*\b(?:consumer|buyer|customer)\b.*\b(?:do|claim|get)\b",
        r"(?i)\b(?:remedies|redressal|compensation)\b",
    ])
});

static SCENARIO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\b(?:if|suppose|what\s+happens|scenario|case|situation)\b",
        r"(?i)\b(?:can\s+i|should\s+i|may\s+i)\b.*\b(?:file|complain|sue|claim)\b",
        r"(?i)\b(?:defective|faulty|damaged)\b.*\b(?:product|goods|service)\b",
        r"(?i)\b(?:unfair|misleading|false)\b.*\b(?:advertisement|practice|contract)\b",
    ])
});

static SECTION_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)\bsection\s+(\d+(?:\.\d+)*)\b",
        r"(?i)\bs\.\s*(\d+(?:\.\d+)*)\b",
        r"(?i)\bsec\.\s*(\d+(?:\.\d+)*)\b",
        r"(?i)\b(\d+)\s*(?:of|under)\s+(?:the\s+act|cpa|consumer\s+protection\s+act)\b",
    ])
});

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("static pattern"));
static CAPITALIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("static pattern"));
static TEMPORAL_PREPOSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|during|as\s+of|before|after)\s+(\d{4})\b").expect("static pattern")
});
static TEMPORAL_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{4})\s+(?:version|amendment|act)\b").expect("static pattern")
});
static TEMPORAL_CURRENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:current|latest|present|now)\b").expect("static pattern"));

/// One row of the classification table.
pub struct IntentRule {
    pub category: IntentCategory,
    pub patterns: Vec<Regex>,
}

/// Heuristic intent parser. Independent of the graph.
pub struct IntentParser {
    rules: Vec<IntentRule>,
    /// (canonical term, matcher over the term's surface variants)
    term_matchers: Vec<(String, Regex)>,
}

impl Default for IntentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentParser {
    pub fn new() -> Self {
        Self::with_vocabulary(LEGAL_VOCABULARY)
    }

    /// Build a parser over a custom term vocabulary; the classification
    /// table stays fixed.
    pub fn with_vocabulary(vocabulary: &[&str]) -> Self {
        let rules = vec![
            IntentRule {
                category: IntentCategory::DefinitionLookup,
                patterns: DEFINITION_PATTERNS.clone(),
            },
            IntentRule {
                category: IntentCategory::SectionRetrieval,
                patterns: SECTION_PATTERNS.clone(),
            },
            IntentRule {
                category: IntentCategory::RightsQuery,
                patterns: RIGHTS_PATTERNS.clone(),
            },
            IntentRule {
                category: IntentCategory::ScenarioAnalysis,
                patterns: SCENARIO_PATTERNS.clone(),
            },
        ];

        let term_matchers = vocabulary
            .iter()
            .map(|term| {
                // Exact, underscore, and concatenated variants.
                let variants = [
                    term.to_string(),
                    term.replace(' ', "_"),
                    term.replace(' ', ""),
                ];
                let alternation = variants
                    .iter()
                    .map(|v| regex::escape(v))
                    .collect::<Vec<_>>()
                    .join("|");
                let matcher = Regex::new(&format!(r"(?i)\b(?:{alternation})s?\b"))
                    .expect("escaped vocabulary pattern");
                (term.to_string(), matcher)
            })
            .collect();

        Self {
            rules,
            term_matchers,
        }
    }

    /// Parse a query into an intent. Never fails; empty or nonsense input
    /// resolves to a low-confidence scenario-analysis intent.
    pub fn parse(&self, query: &str) -> QueryIntent {
        let query_lower = query.to_lowercase();

        let (category, confidence) = self.classify(&query_lower);
        let intent = QueryIntent {
            category,
            entities: self.extract_entities(query),
            section_numbers: self.extract_section_numbers(&query_lower),
            legal_terms: self.extract_legal_terms(&query_lower),
            confidence,
            original_query: query.to_string(),
            temporal: extract_temporal(&query_lower),
        };
        debug!(
            category = intent.category.as_str(),
            confidence = intent.confidence,
            terms = intent.legal_terms.len(),
            sections = intent.section_numbers.len(),
            "query parsed"
        );
        intent
    }

    /// Match-ratio classification: (patterns matched) / (patterns defined)
    /// per category, maximum wins, ties resolved by table order.
    fn classify(&self, query_lower: &str) -> (IntentCategory, f32) {
        let mut best: Option<(IntentCategory, f32)> = None;
        for rule in &self.rules {
            let matched = rule
                .patterns
                .iter()
                .filter(|p| p.is_match(query_lower))
                .count();
            if matched == 0 {
                continue;
            }
            let ratio = matched as f32 / rule.patterns.len() as f32;
            if best.is_none_or(|(_, score)| ratio > score) {
                best = Some((rule.category, ratio));
            }
        }
        match best {
            Some((category, score)) => (category, score.min(1.0)),
            None => (IntentCategory::ScenarioAnalysis, FALLBACK_CONFIDENCE),
        }
    }

    /// Quoted substrings plus capitalised phrases past the first word.
    fn extract_entities(&self, query: &str) -> Vec<String> {
        let mut entities: Vec<String> = Vec::new();
        let mut push = |candidate: &str| {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                return;
            }
            if ENTITY_STOPWORDS.contains(&candidate.to_lowercase().as_str()) {
                return;
            }
            if !entities.iter().any(|e| e == candidate) {
                entities.push(candidate.to_string());
            }
        };

        for capture in QUOTED.captures_iter(query) {
            push(&capture[1]);
        }
        for m in CAPITALIZED.find_iter(query) {
            // A capitalised first word is sentence case, not a proper noun.
            if m.start() > 0 {
                push(m.as_str());
            }
        }
        entities
    }

    /// Section numbers from numeric-reference surface forms, first
    /// occurrence order, deduplicated.
    fn extract_section_numbers(&self, query_lower: &str) -> Vec<String> {
        let mut numbers: Vec<String> = Vec::new();
        for pattern in SECTION_NUMBER_PATTERNS.iter() {
            for capture in pattern.captures_iter(query_lower) {
                if let Some(normalized) = normalize_section_ref(&capture[1])
                    && !numbers.contains(&normalized)
                {
                    numbers.push(normalized);
                }
            }
        }
        numbers
    }

    /// Vocabulary membership, canonical terms in vocabulary order.
    fn extract_legal_terms(&self, query_lower: &str) -> Vec<String> {
        self.term_matchers
            .iter()
            .filter(|(_, matcher)| matcher.is_match(query_lower))
            .map(|(term, _)| term.clone())
            .collect()
    }
}

fn extract_temporal(query_lower: &str) -> Option<TemporalQualifier> {
    if TEMPORAL_CURRENT.is_match(query_lower) {
        return Some(TemporalQualifier::Current);
    }
    for pattern in [&*TEMPORAL_PREPOSITION, &*TEMPORAL_VERSION] {
        if let Some(capture) = pattern.captures(query_lower)
            && let Ok(year) = capture[1].parse::<u16>()
        {
            return Some(TemporalQualifier::Year { year });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexgraph_core::Complexity;

    #[test]
    fn definition_query_classified() {
        let parser = IntentParser::new();
        let intent = parser.parse("What does consumer mean?");
        assert_eq!(intent.category, IntentCategory::DefinitionLookup);
        assert!(intent.confidence > 0.0);
        assert_eq!(intent.legal_terms, vec!["consumer"]);
    }

    #[test]
    fn section_query_extracts_number() {
        let parser = IntentParser::new();
        let intent = parser.parse("Show me Section 2");
        assert_eq!(intent.category, IntentCategory::SectionRetrieval);
        assert_eq!(intent.section_numbers, vec!["2"]);
    }

    #[test]
    fn abbreviated_section_forms() {
        let parser = IntentParser::new();
        assert_eq!(parser.parse("what is in s. 35?").section_numbers, vec!["35"]);
        assert_eq!(parser.parse("sec. 21 please").section_numbers, vec!["21"]);
        assert_eq!(
            parser.parse("tell me about 39 of the act").section_numbers,
            vec!["39"]
        );
    }

    #[test]
    fn duplicate_section_references_deduplicated() {
        let parser = IntentParser::new();
        let intent = parser.parse("compare section 2 with s. 2 and section 35");
        assert_eq!(intent.section_numbers, vec!["2", "35"]);
    }

    #[test]
    fn rights_query_classified() {
        let parser = IntentParser::new();
        let intent = parser.parse("What rights do I have as a consumer?");
        assert_eq!(intent.category, IntentCategory::RightsQuery);
    }

    #[test]
    fn scenario_query_classified() {
        let parser = IntentParser::new();
        let intent = parser.parse("What happens if I bought a defective product?");
        assert_eq!(intent.category, IntentCategory::ScenarioAnalysis);
    }

    #[test]
    fn nonsense_falls_back_to_scenario_analysis() {
        let parser = IntentParser::new();
        let intent = parser.parse("xylophone quantum breakfast");
        assert_eq!(intent.category, IntentCategory::ScenarioAnalysis);
        assert!((intent.confidence - FALLBACK_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_input_never_errors() {
        let parser = IntentParser::new();
        let intent = parser.parse("");
        assert_eq!(intent.category, IntentCategory::ScenarioAnalysis);
        assert!(intent.legal_terms.is_empty());
        assert!(intent.section_numbers.is_empty());
    }

    #[test]
    fn multi_word_terms_and_variants() {
        let parser = IntentParser::new();
        let intent = parser.parse("is this an unfair trade practice?");
        assert!(intent.legal_terms.contains(&"unfair trade practice".to_string()));
        let intent = parser.parse("report an unfair_trade_practice now");
        assert!(intent.legal_terms.contains(&"unfair trade practice".to_string()));
    }

    #[test]
    fn plural_terms_match() {
        let parser = IntentParser::new();
        let intent = parser.parse("are consumers protected from defects?");
        assert!(intent.legal_terms.contains(&"consumer".to_string()));
        assert!(intent.legal_terms.contains(&"defect".to_string()));
    }

    #[test]
    fn quoted_and_capitalised_entities() {
        let parser = IntentParser::new();
        let intent = parser.parse(r#"Does the "cooling off period" apply to Flipkart orders?"#);
        assert!(intent.entities.iter().any(|e| e == "cooling off period"));
        assert!(intent.entities.iter().any(|e| e == "Flipkart"));
    }

    #[test]
    fn leading_capital_not_an_entity() {
        let parser = IntentParser::new();
        let intent = parser.parse("Suppose my order never arrives");
        assert!(!intent.entities.iter().any(|e| e == "Suppose"));
    }

    #[test]
    fn temporal_year_detected() {
        let parser = IntentParser::new();
        let intent = parser.parse("what did the law say in 2019 about refunds");
        assert_eq!(intent.temporal, Some(TemporalQualifier::Year { year: 2019 }));
    }

    #[test]
    fn temporal_current_detected() {
        let parser = IntentParser::new();
        let intent = parser.parse("what is the latest rule on advertisements");
        assert_eq!(intent.temporal, Some(TemporalQualifier::Current));
    }

    #[test]
    fn confidence_is_match_ratio() {
        let parser = IntentParser::new();
        // "Show me Section 2": matches "section N" and "show ... section",
        // 2 of 5 section patterns.
        let intent = parser.parse("Show me Section 2");
        assert!((intent.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn parsing_is_deterministic() {
        let parser = IntentParser::new();
        let a = parser.parse("can I claim compensation for a defective product?");
        let b = parser.parse("can I claim compensation for a defective product?");
        assert_eq!(a.category, b.category);
        assert_eq!(a.legal_terms, b.legal_terms);
        assert_eq!(a.section_numbers, b.section_numbers);
        assert_eq!(a.entities, b.entities);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn custom_vocabulary() {
        let parser = IntentParser::with_vocabulary(&["data fiduciary"]);
        let intent = parser.parse("obligations of a data fiduciary");
        assert_eq!(intent.legal_terms, vec!["data fiduciary"]);
    }

    #[test]
    fn complexity_exposed_for_routing() {
        let parser = IntentParser::new();
        let intent = parser.parse("Show me Section 2");
        assert_eq!(intent.complexity(), Complexity::Simple);
        let intent = parser.parse("suppose I was overcharged, can I file a complaint?");
        assert!(intent.complexity() >= Complexity::Moderate);
    }
}
