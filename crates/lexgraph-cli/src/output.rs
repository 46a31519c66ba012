//! Terminal rendering for answers, graph reports, and collection stats.

use lexgraph_engine::{Answer, GraphReport};
use lexgraph_store::GraphStats;

const RULE: &str = "────────────────────────────────────────";

pub fn print_answer(answer: &Answer) {
    println!("{RULE}");
    println!("{}", answer.text);
    println!("{RULE}");

    if !answer.citations.is_empty() {
        println!("Citations:");
        for citation in &answer.citations {
            println!("  {}: {}", citation.key, citation.reference);
        }
    }

    println!(
        "Confidence: {:.2} ({})",
        answer.confidence.overall,
        answer.confidence.level.as_str()
    );
    println!("  {}", answer.confidence.display_message());
    if answer.requires_review() {
        println!("  ⚠ flagged for expert review");
        for reason in &answer.confidence.review_reasons {
            println!("    - {reason}");
        }
    }
    if answer.degraded {
        println!("  (degraded: generation unavailable or blocked, graph-only answer shown)");
    }

    if let Some(validation) = &answer.validation {
        if !validation.issues.is_empty() {
            println!("Validation issues:");
            for issue in &validation.issues {
                println!(
                    "  [{}] {}: {}",
                    severity_label(issue.severity),
                    issue.kind.as_str(),
                    issue.message
                );
            }
        }
    }

    if let Some(explanation) = &answer.explanation {
        println!();
        println!("{explanation}");
    }

    println!(
        "({} nodes, {} citations, {} ms)",
        answer.metadata.nodes_retrieved, answer.metadata.citation_count, answer.metadata.elapsed_ms
    );
}

fn severity_label(severity: lexgraph_core::Severity) -> &'static str {
    match severity {
        lexgraph_core::Severity::Error => "error",
        lexgraph_core::Severity::Warning => "warn",
        lexgraph_core::Severity::Info => "info",
    }
}

pub fn print_report(report: &GraphReport) {
    println!(
        "Graph: {} sections, {} clauses, {} definitions, {} rights, {} edges",
        report.sections, report.clauses, report.definitions, report.rights, report.edges
    );
    for error in &report.errors {
        println!("  error: {error}");
    }
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
    println!("Result: {}", if report.is_valid { "OK" } else { "INVALID" });
}

pub fn print_stats(stats: &GraphStats) {
    println!("sections:    {}", stats.sections);
    println!("clauses:     {}", stats.clauses);
    println!("definitions: {}", stats.definitions);
    println!("rights:      {}", stats.rights);
    println!("edges:       {}", stats.total_edges());
    println!("  contains:     {}", stats.contains_edges);
    println!("  references:   {}", stats.reference_edges);
    println!("  defines:      {}", stats.defines_edges);
    println!("  grants_right: {}", stats.grants_edges);
}
