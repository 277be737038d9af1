use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::analytics::aggregator::{summarize, AnalyticsSummary};
use crate::analytics::comparison::{compare, scored_records, ComparisonReport, ComparisonSelection};
use crate::errors::AppError;
use crate::records::load_records;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CompareQuery {
    pub a: Uuid,
    pub b: Uuid,
}

/// GET /api/v1/analytics
/// `null` when nothing has been submitted yet.
pub async fn handle_analytics(
    State(state): State<AppState>,
) -> Result<Json<Option<AnalyticsSummary>>, AppError> {
    let records = load_records(state.deps.records.as_ref()).await?;
    Ok(Json(summarize(&records)))
}

/// GET /api/v1/compare?a=&b=
pub async fn handle_compare(
    State(state): State<AppState>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<ComparisonReport>, AppError> {
    if params.a == params.b {
        return Err(AppError::Validation(
            "Pick two different resumes to compare".to_string(),
        ));
    }

    let records = load_records(state.deps.records.as_ref()).await?;
    for id in [params.a, params.b] {
        if !records.iter().any(|r| r.id == id) {
            return Err(AppError::NotFound(format!("Resume {id} not found")));
        }
    }

    let scored = scored_records(&records);
    let mut selection = ComparisonSelection::new();
    selection.toggle(params.a);
    selection.toggle(params.b);
    let (a, b) = selection.pair(&scored).ok_or_else(|| {
        AppError::UnprocessableEntity("Both resumes must have an ATS score to compare".to_string())
    })?;

    Ok(Json(compare(a, b)))
}
