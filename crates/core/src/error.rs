use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from embedding backend: {details}")]
    BackendResponse { details: String },

    #[error("embedding dimension {got} does not match configured {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedding count {got} does not match requested {expected}")]
    CountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("generative backend returned {status}: {details}")]
    BackendResponse { status: String, details: String },

    #[error("generative backend returned no answer text")]
    EmptyResponse,
}
