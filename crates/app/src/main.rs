use clap::{Parser, ValueEnum};
use classdocs_core::{
    load_folder, Answerer, ChunkingOptions, Embedder, GeminiClient, GenerativeModel,
    HashEmbedder, LopdfExtractor, RemoteEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_GEMINI_MODEL, DEFAULT_TOP_K,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
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
#[command(name = "classdocs", version)]
struct Cli {
    /// Folder that contains the PDF documents
    #[arg(long, default_value = "documents")]
    folder: PathBuf,

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

    let embedder: Arc<dyn Embedder> = match cli.embedding_backend {
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
    };

    let model: Arc<dyn GenerativeModel> = Arc::new(
        GeminiClient::new(&cli.gemini_api_key).with_model(&cli.gemini_model),
    );
    let answerer = Answerer::new(embedder.clone(), model).with_top_k(cli.top_k);

    info!(folder = %cli.folder.display(), "loading documents");
    let corpus = load_folder(&cli.folder, &LopdfExtractor, embedder.as_ref(), options).await?;
    println!("Loaded {} chunks from {}", corpus.len(), cli.folder.display());

    println!("\n=== PDF Chat ===");
    println!("Type 'quit' to exit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Ask a question about the documents: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        if question.eq_ignore_ascii_case("quit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        println!("\nAnswer:");
        match answerer.answer(question, &corpus).await {
            Ok(answer) => {
                println!("{}", answer.text);
                if !answer.sources.is_empty() {
                    println!("(sources: {})", answer.sources.join(", "));
                }
            }
            Err(error) => println!("Error generating response: {error}"),
        }
        println!("{}", "-".repeat(50));
    }

    Ok(())
}
