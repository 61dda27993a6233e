use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::info;

pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    #[form_data(limit = "26214400")]
    pub file: FieldData<NamedTempFile>,
}

/// Accepts bare `.pdf` filenames only; anything that could escape the
/// upload directory is rejected.
fn is_valid_pdf_name(name: &str) -> bool {
    name.len() > ".pdf".len()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name.to_ascii_lowercase().ends_with(".pdf")
}

pub async fn upload_document(
    State(state): State<AppState>,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let file_name = input
        .file
        .metadata
        .file_name
        .clone()
        .ok_or_else(|| ApiError::Validation("upload is missing a file name".to_string()))?;

    if !is_valid_pdf_name(&file_name) {
        return Err(ApiError::Validation(
            "only .pdf files are accepted".to_string(),
        ));
    }

    let target = state.upload_dir.join(&file_name);
    tokio::fs::copy(input.file.contents.path(), &target).await?;

    let chunk_count = state.rebuild_corpus().await?;
    info!(filename = %file_name, chunk_count, "document uploaded, corpus rebuilt");

    Ok(Json(json!({
        "message": format!("File {file_name} uploaded successfully"),
        "filename": file_name,
    })))
}

pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let mut documents = Vec::new();
    let mut entries = tokio::fs::read_dir(&state.upload_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.to_ascii_lowercase().ends_with(".pdf") {
            documents.push(name);
        }
    }
    documents.sort();

    Ok(Json(json!({ "documents": documents })))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_valid_pdf_name(&filename) {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    let target = state.upload_dir.join(&filename);
    if tokio::fs::metadata(&target).await.is_err() {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    tokio::fs::remove_file(&target).await?;
    let chunk_count = state.rebuild_corpus().await?;
    info!(filename = %filename, chunk_count, "document deleted, corpus rebuilt");

    Ok(Json(json!({
        "message": format!("Document {filename} deleted successfully"),
    })))
}

#[cfg(test)]
mod tests {
    use super::is_valid_pdf_name;

    #[test]
    fn plain_pdf_names_are_accepted() {
        assert!(is_valid_pdf_name("lecture-notes.pdf"));
        assert!(is_valid_pdf_name("Week 3 Slides.PDF"));
    }

    #[test]
    fn non_pdf_and_traversal_names_are_rejected() {
        assert!(!is_valid_pdf_name("notes.txt"));
        assert!(!is_valid_pdf_name(".pdf"));
        assert!(!is_valid_pdf_name("../escape.pdf"));
        assert!(!is_valid_pdf_name("dir/notes.pdf"));
        assert!(!is_valid_pdf_name("dir\\notes.pdf"));
        assert!(!is_valid_pdf_name(""));
    }
}
