//! Claim query CLI
//!
//! Thin wiring surface over the pipeline: an Ollama generative client, the
//! in-memory keyword retriever over the parsed clause list, one query per
//! invocation.
//!
//! ```bash
//! CLAUSES_PATH=data/parsed_output.json \
//!   cargo run --bin claim_cli -- "46-year-old male, knee surgery in Pune, 3-month policy"
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use claimlens::{ClaimPipeline, KeywordRetriever, OllamaClient, RetrievalError};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let query: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        bail!("usage: claim_cli <claim query>");
    }

    let clauses_path =
        std::env::var("CLAUSES_PATH").unwrap_or_else(|_| "data/parsed_output.json".to_string());

    let llm = Arc::new(OllamaClient::from_env().context("failed to build Ollama client")?);

    // A missing clause file is the not-ready condition: let the pipeline
    // surface it as an error-shaped result instead of crashing here.
    let retriever = match KeywordRetriever::from_json_file(&clauses_path) {
        Ok(retriever) => Arc::new(retriever),
        Err(RetrievalError::IndexNotReady) => {
            warn!("clause list {} not found, index not ready", clauses_path);
            Arc::new(KeywordRetriever::new(Vec::new()))
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load clause list from {}", clauses_path))
        }
    };

    let pipeline = ClaimPipeline::new(llm, retriever);
    let result = pipeline.run(&query).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
