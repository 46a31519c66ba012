use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexgraph_core::{Audience, Instrument};
use lexgraph_engine::{GraphReport, Pipeline, PipelineConfig};
use lexgraph_llm::{HttpProvider, HttpProviderConfig};
use lexgraph_store::GraphStore;

mod output;

#[derive(Parser)]
#[command(name = "lexgraph", version, about = "Graph-grounded legal question answering")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a natural-language legal question.
    Ask {
        /// The question to answer.
        query: String,

        /// Target audience: citizen, lawyer, or judge.
        #[arg(long, default_value = "citizen")]
        audience: String,

        /// Language tag recorded on the answer.
        #[arg(long, default_value = "en")]
        language: String,

        /// Knowledge graph directory.
        #[arg(long, env = "LEXGRAPH_GRAPH", default_value = "knowledge_graph")]
        graph: PathBuf,

        /// Generation endpoint base URL; omit for graph-only mode.
        #[arg(long, env = "LEXGRAPH_PROVIDER_URL")]
        provider_url: Option<String>,

        /// Model name for the generation endpoint.
        #[arg(long, env = "LEXGRAPH_MODEL", default_value = "gpt-4o-mini")]
        model: String,

        /// API key for the generation endpoint.
        #[arg(long, env = "LEXGRAPH_API_KEY")]
        api_key: Option<String>,

        /// Generation timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Skip generation even when a provider URL is configured.
        #[arg(long)]
        offline: bool,

        /// Emit the full answer as JSON instead of the card view.
        #[arg(long)]
        json: bool,
    },

    /// Load the graph and report integrity and completeness.
    Validate {
        #[arg(long, env = "LEXGRAPH_GRAPH", default_value = "knowledge_graph")]
        graph: PathBuf,
    },

    /// Print collection counts for a loaded graph.
    Stats {
        #[arg(long, env = "LEXGRAPH_GRAPH", default_value = "knowledge_graph")]
        graph: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Ask {
            query,
            audience,
            language,
            graph,
            provider_url,
            model,
            api_key,
            timeout,
            offline,
            json,
        } => {
            let audience = Audience::from_str(&audience)?;
            let store = Arc::new(
                GraphStore::load(&graph)
                    .with_context(|| format!("loading knowledge graph from {}", graph.display()))?,
            );

            let config = PipelineConfig {
                generation_timeout: Duration::from_secs(timeout),
                ..PipelineConfig::default()
            };
            let mut pipeline = Pipeline::new(store, Instrument::cpa_2019(), config);
            if let Some(base_url) = provider_url.filter(|_| !offline) {
                pipeline = pipeline.with_provider(Arc::new(HttpProvider::new(HttpProviderConfig {
                    base_url,
                    api_key,
                    model,
                })));
            }

            let answer = pipeline.answer(&query, &language, audience).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                output::print_answer(&answer);
            }
        }

        Command::Validate { graph } => {
            let store = GraphStore::load(&graph)
                .with_context(|| format!("loading knowledge graph from {}", graph.display()))?;
            let report = GraphReport::for_store(&store);
            output::print_report(&report);
            if !report.is_valid {
                std::process::exit(1);
            }
        }

        Command::Stats { graph } => {
            let store = GraphStore::load(&graph)
                .with_context(|| format!("loading knowledge graph from {}", graph.display()))?;
            output::print_stats(&store.stats());
        }
    }

    Ok(())
}
