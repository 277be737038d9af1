use std::path::Path as FsPath;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::coordinator::SubmissionRequest;
use crate::pipeline::registry::SubmissionView;
use crate::pipeline::spawn_submission;
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Serialize)]
pub struct SubmissionAccepted {
    pub id: Uuid,
}

/// POST /api/v1/resumes
/// Multipart fields: `file`, `company-name`, `job-title`, `job-description`.
pub async fn handle_submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionAccepted>), AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut company_name = String::new();
    let mut job_title = String::new();
    let mut job_description = String::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = read_limited(field).await?;
                validate_pdf(&file_name, content_type.as_deref(), &data)?;
                file = Some((file_name, data));
            }
            "company-name" => company_name = field.text().await?.trim().to_string(),
            "job-title" => job_title = field.text().await?.trim().to_string(),
            "job-description" => job_description = field.text().await?.trim().to_string(),
            _ => {
                let _ = field.bytes().await?;
            }
        }
    }

    let (file_name, document) =
        file.ok_or_else(|| AppError::Validation("A PDF file is required".to_string()))?;

    info!(
        "Accepted {file_name} ({} bytes) for {job_title:?} at {company_name:?}",
        document.len()
    );

    let request = SubmissionRequest {
        file_name,
        document,
        company_name,
        job_title,
        job_description,
    };
    let id = spawn_submission(
        request,
        state.deps.clone(),
        &state.submissions,
        state.config.progress_tick,
    );

    Ok((StatusCode::ACCEPTED, Json(SubmissionAccepted { id })))
}

/// GET /api/v1/submissions/:id
pub async fn handle_submission_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionView>, AppError> {
    state
        .submissions
        .get(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Submission {id} not found")))
}

/// Reads a file field, failing as soon as it grows past `MAX_UPLOAD_BYTES`.
async fn read_limited(mut field: Field<'_>) -> Result<Bytes, AppError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::Validation(format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn validate_pdf(file_name: &str, content_type: Option<&str>, data: &[u8]) -> Result<(), AppError> {
    let has_pdf_extension = FsPath::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let declared_pdf = content_type == Some("application/pdf");

    if !(has_pdf_extension || declared_pdf) || !data.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation(
            "Invalid file type. Only PDF files are allowed".to_string(),
        ));
    }
    Ok(())
}
