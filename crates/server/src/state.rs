use classdocs_core::{
    load_folder, Answerer, ChunkingOptions, Corpus, Embedder, IngestError, PdfExtractor,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub upload_dir: PathBuf,
    pub corpus: Arc<RwLock<Corpus>>,
    pub extractor: Arc<dyn PdfExtractor>,
    pub embedder: Arc<dyn Embedder>,
    pub answerer: Arc<Answerer>,
    pub options: ChunkingOptions,
}

impl AppState {
    /// Full rebuild from the upload folder. The write lock is held
    /// across the rebuild so folder mutations serialize and readers
    /// never observe a partially built corpus.
    pub async fn rebuild_corpus(&self) -> Result<usize, IngestError> {
        let mut corpus = self.corpus.write().await;
        let rebuilt = load_folder(
            &self.upload_dir,
            self.extractor.as_ref(),
            self.embedder.as_ref(),
            self.options,
        )
        .await?;
        let count = rebuilt.len();
        *corpus = rebuilt;
        Ok(count)
    }

    /// Cheap point-in-time copy so chat does not hold the corpus lock
    /// across a model call.
    pub async fn corpus_snapshot(&self) -> Corpus {
        self.corpus.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classdocs_core::{GenerativeModel, HashEmbedder};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct PlainTextExtractor;

    impl PdfExtractor for PlainTextExtractor {
        fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
            fs::read_to_string(path).map_err(IngestError::Io)
        }
    }

    struct NoopModel;

    #[async_trait::async_trait]
    impl GenerativeModel for NoopModel {
        async fn generate(&self, _prompt: &str) -> Result<String, classdocs_core::ChatError> {
            Ok("ok".to_string())
        }
    }

    fn state_for(dir: &Path) -> AppState {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        AppState {
            upload_dir: dir.to_path_buf(),
            corpus: Arc::new(RwLock::new(Corpus::default())),
            extractor: Arc::new(PlainTextExtractor),
            embedder: embedder.clone(),
            answerer: Arc::new(Answerer::new(embedder, Arc::new(NoopModel))),
            options: ChunkingOptions::default(),
        }
    }

    #[tokio::test]
    async fn rebuild_swaps_in_the_new_corpus() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let state = state_for(dir.path());

        fs::write(dir.path().join("a.pdf"), "Some course text about cells.")?;
        let count = state.rebuild_corpus().await?;
        assert_eq!(count, 1);
        assert_eq!(state.corpus_snapshot().await.len(), 1);

        fs::remove_file(dir.path().join("a.pdf"))?;
        let count = state.rebuild_corpus().await?;
        assert_eq!(count, 0);
        assert!(state.corpus_snapshot().await.is_empty());
        Ok(())
    }
}
