mod error;
mod integration;
mod routes;
mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use clap::{Parser, ValueEnum};
use classdocs_core::{
    Answerer, ChunkingOptions, Corpus, Embedder, GeminiClient, GenerativeModel, HashEmbedder,
    LopdfExtractor, RemoteEmbedder, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_GEMINI_MODEL,
    DEFAULT_TOP_K,
};
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmbeddingBackend {
    /// OpenAI-compatible embedding service
    Remote,
    /// Local character-trigram hashing, no external service
    Hashed,
}

#[derive(Parser)]
#[command(name = "classdocs-server", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen: String,

    /// Folder where uploaded PDFs are stored
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Embedding backend
    #[arg(long, value_enum, default_value = "remote")]
    embedding_backend: EmbeddingBackend,

    /// Base URL of the OpenAI-compatible embedding service
    #[arg(long, default_value = "http://localhost:8080", env = "EMBEDDING_URL")]
    embedding_url: String,

    /// Sentence-embedding model to request
    #[arg(long, default_value = "all-MiniLM-L6-v2")]
    embedding_model: String,

    /// Vector size the embedding model produces
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Bearer key for the embedding service
    #[arg(long, env = "EMBEDDING_API_KEY")]
    embedding_api_key: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY")]
    gemini_api_key: String,

    /// Generative model name
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// Target chunk size in characters
    #[arg(long, default_value = "500")]
    chunk_size: usize,

    /// Characters carried over between consecutive chunks
    #[arg(long, default_value = "50")]
    overlap: usize,

    /// Number of chunks fed to the model per question
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
}

fn build_embedder(cli: &Cli) -> Arc<dyn Embedder> {
    match cli.embedding_backend {
        EmbeddingBackend::Remote => {
            let mut remote = RemoteEmbedder::new(
                &cli.embedding_url,
                &cli.embedding_model,
                cli.embedding_dimensions,
            );
            if let Some(api_key) = &cli.embedding_api_key {
                remote = remote.with_api_key(api_key);
            }
            Arc::new(remote)
        }
        EmbeddingBackend::Hashed => Arc::new(HashEmbedder {
            dimensions: cli.embedding_dimensions,
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let options = ChunkingOptions {
        chunk_size: cli.chunk_size,
        overlap: cli.overlap,
    };
    options.validate()?;

    tokio::fs::create_dir_all(&cli.upload_dir).await?;

    let embedder = build_embedder(&cli);

    let model: Arc<dyn GenerativeModel> = Arc::new(
        GeminiClient::new(&cli.gemini_api_key).with_model(&cli.gemini_model),
    );

    let answerer = Arc::new(Answerer::new(embedder.clone(), model).with_top_k(cli.top_k));

    let state = AppState {
        upload_dir: cli.upload_dir.clone(),
        corpus: Arc::new(RwLock::new(Corpus::default())),
        extractor: Arc::new(LopdfExtractor),
        embedder,
        answerer,
        options,
    };

    // Pick up whatever PDFs survived the last run.
    let chunk_count = state.rebuild_corpus().await?;
    info!(
        upload_dir = %cli.upload_dir.display(),
        chunk_count,
        "corpus loaded"
    );

    let app = Router::new()
        .route("/", get(routes::root))
        .route(
            "/upload",
            post(routes::documents::upload_document)
                .layer(DefaultBodyLimit::max(routes::documents::MAX_UPLOAD_BYTES)),
        )
        .route("/documents", get(routes::documents::list_documents))
        .route(
            "/documents/{filename}",
            delete(routes::documents::delete_document),
        )
        .route("/ws", get(routes::chat::ws_handler))
        .with_state(state)
        .nest("/v1", integration::integration_routes());

    info!(listen = %cli.listen, "classdocs-server boot");
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
