use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Json,
    Extension,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{AnalysisResponse, RequestContext, UploadedDocument};
use crate::services::{PdfProcessor, PromptPayload};

pub async fn analyze_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<AnalysisResponse>> {
    let start = Instant::now();
    let request_id = context.request_id.as_str();

    info!(request_id = %request_id, "Starting lab report analysis request");

    let mut multipart = multipart.map_err(|e| {
        warn!(request_id = %request_id, error = %e, "Request is not a multipart upload");
        AppError::invalid_input(format!("Expected a multipart/form-data upload: {}", e))
    })?;

    let document = match extract_file_from_multipart(&mut multipart).await {
        Ok(document) => {
            info!(
                request_id = %request_id,
                file_name = %document.file_name,
                file_size = document.size(),
                "File extracted from multipart form"
            );
            document
        }
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Rejected upload");
            return Err(e);
        }
    };

    let extraction = match PdfProcessor::new().extract_text(&document).await {
        Ok(result) => {
            info!(
                request_id = %request_id,
                text_length = result.text.chars().count(),
                pages = result.pages,
                pages_with_text = result.pages_with_text,
                processing_time_ms = result.processing_time_ms,
                "PDF text extracted"
            );
            result
        }
        Err(e) => {
            warn!(
                request_id = %request_id,
                error_code = e.error_code(),
                error = %e,
                "PDF text extraction failed"
            );
            return Err(e);
        }
    };

    let prompt = PromptPayload::assemble(&extraction.text, state.config.max_prompt_chars);
    debug!(
        request_id = %request_id,
        prompt_chars = prompt.char_count(),
        truncated = prompt.truncated,
        "Prompt assembled"
    );

    let analysis = match state.model.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            error!(
                request_id = %request_id,
                provider = state.model.name(),
                error = %e,
                "LLM invocation failed"
            );
            return Err(e);
        }
    };

    info!(
        request_id = %request_id,
        analysis_length = analysis.chars().count(),
        total_time_ms = start.elapsed().as_millis() as u64,
        "Request completed successfully"
    );

    Ok(Json(AnalysisResponse { analysis }))
}

/// Finds the `file` field. The filename is checked before the field body is read.
async fn extract_file_from_multipart(multipart: &mut Multipart) -> AppResult<UploadedDocument> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::invalid_input("Uploaded file has no filename"))?;

        if !UploadedDocument::has_pdf_name(&file_name) {
            return Err(AppError::invalid_input(format!(
                "Only PDF files are accepted; '{}' does not end with .pdf",
                file_name
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid_input(format!("Failed to read file data: {}", e)))?;

        if data.is_empty() {
            return Err(AppError::invalid_input("Uploaded file is empty"));
        }

        return Ok(UploadedDocument::new(file_name, data));
    }

    Err(AppError::invalid_input(
        "No file uploaded; expected multipart field 'file'",
    ))
}
