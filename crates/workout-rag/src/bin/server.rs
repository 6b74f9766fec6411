//! Workout RAG server binary
//!
//! Run with: cargo run -p workout-rag --bin workout-rag-server [config.toml]

use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_rag::{config::RagConfig, server::RagServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workout_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                    Workout RAG Service                    ║
║        Workout Plans and Document Q&A from your PDFs      ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // First argument, then WORKOUT_RAG_CONFIG, then defaults
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WORKOUT_RAG_CONFIG").ok())
        .map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/documents      - Upload a PDF");
    println!("  GET    /ws/chat            - Chat over your documents");
    println!("  POST   /api/workout/plan   - Generate a weekly plan");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
