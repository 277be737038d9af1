use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::insights::suggestions::{
    recommend_jobs, suggest_skills, JobRecommendation, SkillSuggestions, SuggestionError,
};
use crate::records::load_record;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

impl From<SuggestionError> for AppError {
    fn from(e: SuggestionError) -> Self {
        match e {
            SuggestionError::NotScored => AppError::UnprocessableEntity(e.to_string()),
            SuggestionError::UnknownCategory(_) => AppError::Validation(e.to_string()),
        }
    }
}

/// GET /api/v1/resumes/:id/skill-suggestions?category=
pub async fn handle_skill_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<CategoryQuery>,
) -> Result<Json<SkillSuggestions>, AppError> {
    let record = load_record(state.deps.records.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let suggestions = suggest_skills(
        state.skill_catalog.as_ref(),
        &record,
        params.category.as_deref(),
    )?;
    Ok(Json(suggestions))
}

/// GET /api/v1/resumes/:id/job-recommendations
pub async fn handle_job_recommendations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<JobRecommendation>>, AppError> {
    let record = load_record(state.deps.records.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(recommend_jobs(state.job_catalog.as_ref(), &record)))
}
