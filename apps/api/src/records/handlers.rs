use axum::{
    extract::{Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::records::{load_record, load_records};
use crate::state::AppState;

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeRecord>>, AppError> {
    let records = load_records(state.deps.records.as_ref()).await?;
    Ok(Json(records))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    Ok(Json(find_record(&state, id).await?))
}

/// GET /api/v1/resumes/:id/document
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_record(&state, id).await?;
    download(&state, &record.resume_path, "application/pdf", "resume.pdf").await
}

/// GET /api/v1/resumes/:id/preview
pub async fn handle_download_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = find_record(&state, id).await?;
    download(&state, &record.image_path, "image/png", "resume.png").await
}

async fn find_record(state: &AppState, id: Uuid) -> Result<ResumeRecord, AppError> {
    load_record(state.deps.records.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

async fn download(
    state: &AppState,
    path: &str,
    content_type: &'static str,
    file_name: &str,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state
        .deps
        .blobs
        .read(path)
        .await
        .map_err(|e| AppError::Storage(format!("{e:#}")))?
        .ok_or_else(|| AppError::NotFound(format!("No file stored at {path}")))?;

    debug!("Serving {path} ({content_type}, {} bytes)", bytes.len());
    Ok((
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    ))
}
