mod cache;
mod chunker;
mod config;
mod error;
mod generator;
mod http;
mod ingest;
mod mcp;
mod prompt;
mod retrieval;
mod service;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::RetrievalCache;
use chunker::Chunker;
use config::{Config, Transport};
use generator::Generator;
use ingest::Ingestor;
use mcp::RagMcpServer;
use rag_common::chat::{ChatClient, ChatClientConfig};
use retrieval::Retriever;
use service::RagService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; in stdio mode stdout carries MCP JSON-RPC.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting rag-server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    let chat_config = ChatClientConfig::from_env();
    info!(
        lancedb_path = %config.lancedb_path,
        transport = ?config.transport,
        chat_base_url = %chat_config.base_url,
        chat_model = %config.chat_model,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    // 2. Connect to Redis (optional, degrades to no cache)
    let redis_cache = rag_common::redis::RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }
    let cache = Arc::new(RetrievalCache::new(redis_cache));

    // 3. Initialize embedding model
    info!("initializing embedding model (may download on first run)");
    let embedder = Arc::new(rag_common::embedding::Embedder::new().await?);
    info!(dimensions = embedder.dimensions(), "embedding model ready");

    // 4. Connect to LanceDB
    let vectordb = Arc::new(rag_common::vectordb::VectorDb::connect(&config.lancedb_path).await?);
    info!("lancedb connected");

    // 5. Assemble the service
    let retriever = Retriever::new(
        Arc::clone(&embedder),
        Arc::clone(&vectordb),
        Arc::clone(&cache),
        config.retrieval_top_k,
    );
    let ingestor = Ingestor::new(
        embedder,
        vectordb,
        cache,
        Chunker::new(config.chunk_size, config.chunk_overlap),
    );
    let generator = Generator::new(
        ChatClient::new(chat_config)?,
        question_parser::default_parser(),
        config.chat_model.clone(),
    );
    let service = Arc::new(RagService::new(
        retriever,
        ingestor,
        generator,
        config.default_collection.clone(),
    ));

    // 6. Serve
    match config.transport {
        Transport::Http => {
            let app = http::router(service, config.max_upload_bytes);
            http::serve(app, config.bind_addr).await?;
        }
        Transport::Stdio => {
            info!("MCP server ready, serving on stdio");
            let server = RagMcpServer::new(service).serve(stdio()).await.inspect_err(|e| {
                tracing::error!(error = %e, "MCP server error");
            })?;
            server.waiting().await?;
            info!("MCP server shut down");
        }
    }
    Ok(())
}
