use crate::error::IngestError;
use crate::models::ChunkingOptions;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into overlapping windows of `chunk_size` characters,
/// preferring to end a window just after the last period when that
/// period lies past the window's midpoint.
pub fn chunk_text(text: &str, options: ChunkingOptions) -> Result<Vec<String>, IngestError> {
    options.validate()?;

    let normalized = normalize_whitespace(text);
    let chars: Vec<char> = normalized.chars().collect();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + options.chunk_size).min(chars.len());

        if end < chars.len() {
            if let Some(relative) = chars[start..end].iter().rposition(|&c| c == '.') {
                // The shrunk window must still out-run the overlap or the
                // next start offset would not advance.
                if relative > options.chunk_size / 2 && relative + 1 > options.overlap {
                    end = start + relative + 1;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        chunks.push(chunk.trim().to_string());

        if end >= chars.len() {
            break;
        }
        start = end - options.overlap;
    }

    Ok(chunks)
}
