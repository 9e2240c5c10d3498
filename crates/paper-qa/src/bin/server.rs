//! Paper QA server binary
//!
//! Run with: cargo run -p paper-qa --bin paper-qa-server -- --config paper-qa.toml

use clap::Parser;
use paper_qa::{config::AppConfig, server::PaperQaServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "paper-qa-server", version, about = "Research papers QA API")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides config and PAPER_QA_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config and PAPER_QA_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_qa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                      Paper QA System                      ║
║         Research Paper Q&A over arXiv and Uploads         ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Initial papers: {}", config.papers.initial_ids.join(", "));

    // Check Ollama, load the initial corpus and start the server
    let server = PaperQaServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  GET  /papers          - List loaded papers");
    println!("  POST /papers/add      - Add an arXiv paper");
    println!("  POST /papers/upload   - Upload a PDF");
    println!("  POST /chat            - Ask a question");
    println!("  POST /feedback        - Rate an answer");
    println!("  GET  /feedback/stats  - Feedback counts");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
