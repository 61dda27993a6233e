use crate::error::IngestError;
use serde::{Deserialize, Serialize};

/// Window parameters for splitting normalized document text.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingOptions {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

impl ChunkingOptions {
    /// The overlap must be strictly smaller than the chunk size or the
    /// window start would never advance.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk_size {}",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// One retrieval unit: a chunk of document text, the file it came from,
/// and its embedding. The corpus keeps these aligned by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub text: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}
