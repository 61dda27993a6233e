use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;

/// Seam for reading a document's full text. Production code uses lopdf;
/// tests substitute plain-text fakes.
pub trait PdfExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut text = String::new();
        for (page_no, _page_id) in document.get_pages() {
            let page_text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            if !page_text.trim().is_empty() {
                text.push_str(&page_text);
                text.push('\n');
            }
        }

        // A well-formed PDF with no extractable text yields an empty
        // string; only unreadable files are errors.
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::{LopdfExtractor, PdfExtractor};
    use crate::error::IngestError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn corrupt_pdf_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = LopdfExtractor.extract_text(&path);
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        Ok(())
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let result = LopdfExtractor.extract_text(std::path::Path::new("/nonexistent/x.pdf"));
        assert!(result.is_err());
    }
}
