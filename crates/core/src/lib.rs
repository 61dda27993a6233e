pub mod answer;
pub mod chunking;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod models;
pub mod retrieval;

pub use answer::{
    build_prompt, refusal_message, Answerer, GeminiClient, GenerativeModel,
    DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, NO_DOCUMENTS_MESSAGE,
};
pub use chunking::{chunk_text, normalize_whitespace};
pub use corpus::{discover_pdf_files, load_folder, Corpus};
pub use embeddings::{Embedder, HashEmbedder, RemoteEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ChatError, EmbedError, IngestError};
pub use extractor::{LopdfExtractor, PdfExtractor};
pub use models::{Answer, ChunkingOptions, CorpusEntry, RetrievedChunk};
pub use retrieval::{cosine_similarity, retrieve_relevant_chunks, DEFAULT_TOP_K};
