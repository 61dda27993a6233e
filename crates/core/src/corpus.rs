use crate::chunking::chunk_text;
use crate::embeddings::Embedder;
use crate::error::{EmbedError, IngestError};
use crate::extractor::PdfExtractor;
use crate::models::{ChunkingOptions, CorpusEntry};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The full in-memory collection of chunks derived from the currently
/// loaded documents. Disposable: rebuilt wholesale from the PDF folder
/// whenever its contents change.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source filenames in first-seen order, deduplicated.
    pub fn sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        for entry in &self.entries {
            if !sources.contains(&entry.source) {
                sources.push(entry.source.clone());
            }
        }
        sources
    }
}

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Rebuild the corpus from every PDF in the folder: extract and chunk
/// each file, then embed the accumulated chunk list in one batch call.
/// Produces a fresh value; callers swap it in rather than mutating the
/// corpus in place. An empty folder yields an empty corpus.
pub async fn load_folder(
    folder: &Path,
    extractor: &dyn PdfExtractor,
    embedder: &dyn Embedder,
    options: ChunkingOptions,
) -> Result<Corpus, IngestError> {
    options.validate()?;

    let mut texts = Vec::new();
    let mut sources = Vec::new();

    for path in discover_pdf_files(folder) {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
            .to_string();

        let text = extractor.extract_text(&path)?;
        for chunk in chunk_text(&text, options)? {
            texts.push(chunk);
            sources.push(name.clone());
        }
    }

    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != texts.len() {
        return Err(EmbedError::CountMismatch {
            expected: texts.len(),
            got: embeddings.len(),
        }
        .into());
    }

    let entries = texts
        .into_iter()
        .zip(sources)
        .zip(embeddings)
        .map(|((text, source), embedding)| CorpusEntry {
            text,
            source,
            embedding,
        })
        .collect();

    Ok(Corpus::new(entries))
}


#[cfg(test)]
mod tests {
    use super::test_support::PlainTextExtractor;
    use super::*;
    use crate::embeddings::HashEmbedder;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn discover_pdf_files_is_recursive_and_sorted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("nested");
        fs::create_dir(&nested)?;

        File::create(dir.path().join("b.pdf")).and_then(|mut f| f.write_all(b"two"))?;
        File::create(nested.join("a.pdf")).and_then(|mut f| f.write_all(b"one"))?;
        File::create(dir.path().join("notes.txt")).and_then(|mut f| f.write_all(b"skip"))?;

        let files = discover_pdf_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.pdf") || files[1].ends_with("b.pdf"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_folder_yields_empty_corpus() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let corpus = load_folder(
            dir.path(),
            &PlainTextExtractor,
            &HashEmbedder::default(),
            ChunkingOptions::default(),
        )
        .await?;

        assert!(corpus.is_empty());
        assert!(corpus.sources().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn corpus_entries_stay_aligned_with_their_sources(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("cells.pdf"), "Cells divide by mitosis.")?;
        fs::write(dir.path().join("plants.pdf"), "Plants use photosynthesis.")?;

        let embedder = HashEmbedder::default();
        let corpus = load_folder(
            dir.path(),
            &PlainTextExtractor,
            &embedder,
            ChunkingOptions::default(),
        )
        .await?;

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.sources(), vec!["cells.pdf", "plants.pdf"]);
        for entry in corpus.entries() {
            assert_eq!(entry.embedding.len(), embedder.dimensions());
        }
        Ok(())
    }

    #[tokio::test]
    async fn deleting_a_file_and_reloading_shrinks_the_corpus(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("one.pdf"), "First document text.")?;
        fs::write(dir.path().join("two.pdf"), "Second document text.")?;
        fs::write(dir.path().join("three.pdf"), "Third document text.")?;

        let embedder = HashEmbedder::default();
        let options = ChunkingOptions::default();
        let full = load_folder(dir.path(), &PlainTextExtractor, &embedder, options).await?;
        assert_eq!(full.len(), 3);

        fs::remove_file(dir.path().join("two.pdf"))?;
        let rebuilt = load_folder(dir.path(), &PlainTextExtractor, &embedder, options).await?;

        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.sources(), vec!["one.pdf", "three.pdf"]);
        Ok(())
    }

    #[tokio::test]
    async fn extraction_failure_aborts_the_rebuild() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.pdf"), b"%PDF-1.4\n%broken").unwrap();

        let result = load_folder(
            dir.path(),
            &crate::extractor::LopdfExtractor,
            &HashEmbedder::default(),
            ChunkingOptions::default(),
        )
        .await;

        assert!(matches!(result, Err(IngestError::PdfParse(_))));
    }
}
