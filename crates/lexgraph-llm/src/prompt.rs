//! Prompt construction: base rules, audience and intent modifiers, and the
//! citation-tagged context.

use lexgraph_core::{AssembledContext, Audience, IntentCategory};

const BASE_RULES: &str = "You are a legal information assistant. Provide accurate legal \
information grounded in authoritative sources.

CRITICAL RULES:
1. ONLY use information from the provided legal context
2. CITE every legal claim using the format [Citation: Citation-N]
3. If information is not in context, respond: \"Information not available in current knowledge base\"
4. Distinguish between legal text (in quotes) and your explanation
5. Include a disclaimer that this is information, not legal advice
6. Never make predictions about case outcomes or judicial decisions

RESPONSE STRUCTURE:
1. Direct answer to the question
2. Relevant legal provisions (quoted with citations)
3. Clear explanation in appropriate language
4. Disclaimer about non-binding nature";

fn audience_instructions(audience: Audience) -> (&'static str, &'static str) {
    match audience {
        Audience::Citizen => (
            "Use simple, accessible language that non-lawyers can understand. Avoid legal \
             jargon and explain technical terms.",
            "This information is for educational purposes only. For legal advice specific to \
             your situation, consult a qualified lawyer.",
        ),
        Audience::Lawyer => (
            "Use precise legal terminology and include technical details. Include \
             cross-references and related provisions for legal research.",
            "This information is for research purposes. Verify all citations and consult \
             primary sources for legal practice.",
        ),
        Audience::Judge => (
            "Use formal legal language appropriate for judicial consideration. Provide a \
             comprehensive analytical framework.",
            "This analysis is assistive only. Judicial discretion and independent legal \
             analysis remain paramount.",
        ),
    }
}

fn intent_focus(category: IntentCategory) -> &'static str {
    match category {
        IntentCategory::DefinitionLookup => {
            "Focus: provide the authoritative definition with legal context. Structure: \
             1. Definition (quoted from law), 2. Explanation in plain terms, 3. Examples if helpful."
        }
        IntentCategory::SectionRetrieval => {
            "Focus: present the section text with proper context. Structure: 1. Section text \
             (quoted), 2. Context within the Act, 3. Related provisions."
        }
        IntentCategory::RightsQuery => {
            "Focus: explain the applicable rights with enforcement mechanisms. Structure: \
             1. Specific rights, 2. How to exercise them, 3. Remedies available."
        }
        IntentCategory::ScenarioAnalysis => {
            "Focus: analyse the scenario step by step against the applicable provisions. \
             Structure: 1. Legal analysis, 2. Applicable laws and rights, 3. Recommended actions."
        }
    }
}

/// Build the system prompt for one request.
pub fn build_system_prompt(audience: Audience, category: IntentCategory) -> String {
    let (language, disclaimer) = audience_instructions(audience);
    format!(
        "{BASE_RULES}\n\nAUDIENCE: {}\n{language}\n\n{}\n\nDISCLAIMER TO INCLUDE: {disclaimer}",
        audience.as_str(),
        intent_focus(category)
    )
}

/// Build the user prompt: context, deduplicated citation list, question.
pub fn build_user_prompt(query: &str, context: &AssembledContext) -> String {
    let mut prompt = String::new();
    if !context.formatted_text.is_empty() {
        prompt.push_str("LEGAL CONTEXT:\n");
        prompt.push_str(&context.formatted_text);
        prompt.push_str("\n\n");
    }
    if !context.citations.is_empty() {
        prompt.push_str("AVAILABLE CITATIONS:\n");
        let mut seen: Vec<&str> = Vec::new();
        for (key, citation) in &context.citations {
            if seen.contains(&citation.as_str()) {
                continue;
            }
            seen.push(citation);
            prompt.push_str(&format!("{key}: {citation}\n"));
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!("QUESTION: {query}"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexgraph_core::BlockCounts;

    fn context(citations: &[(&str, &str)]) -> AssembledContext {
        AssembledContext {
            formatted_text: "=== PRIMARY LEGAL PROVISIONS ===\ntext".into(),
            citations: citations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            counts: BlockCounts::default(),
            audience: Audience::Citizen,
            primary_provisions: vec![],
            related_provisions: vec![],
            definitions: vec![],
            truncated: false,
        }
    }

    #[test]
    fn system_prompt_carries_rules_audience_and_intent() {
        let prompt = build_system_prompt(Audience::Citizen, IntentCategory::DefinitionLookup);
        assert!(prompt.contains("CITE every legal claim"));
        assert!(prompt.contains("AUDIENCE: citizen"));
        assert!(prompt.contains("authoritative definition"));
        assert!(prompt.contains("educational purposes only"));
    }

    #[test]
    fn judge_prompt_differs_from_citizen() {
        let citizen = build_system_prompt(Audience::Citizen, IntentCategory::RightsQuery);
        let judge = build_system_prompt(Audience::Judge, IntentCategory::RightsQuery);
        assert_ne!(citizen, judge);
        assert!(judge.contains("judicial consideration"));
    }

    #[test]
    fn user_prompt_lists_citations_once() {
        let ctx = context(&[
            ("Citation-1", "Section 2, Consumer Protection Act, 2019"),
            ("Citation-2", "Section 2, Consumer Protection Act, 2019"),
            ("Citation-3", "Section 35, Consumer Protection Act, 2019"),
        ]);
        let prompt = build_user_prompt("what are my rights?", &ctx);
        assert_eq!(
            prompt.matches("Section 2, Consumer Protection Act, 2019").count(),
            1,
            "duplicate citations are deduplicated"
        );
        assert!(prompt.contains("Citation-3: Section 35"));
        assert!(prompt.ends_with("QUESTION: what are my rights?"));
    }

    #[test]
    fn empty_context_is_question_only() {
        let ctx = AssembledContext {
            formatted_text: String::new(),
            citations: vec![],
            counts: BlockCounts::default(),
            audience: Audience::Citizen,
            primary_provisions: vec![],
            related_provisions: vec![],
            definitions: vec![],
            truncated: false,
        };
        let prompt = build_user_prompt("hello", &ctx);
        assert_eq!(prompt, "QUESTION: hello");
    }
}
