pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::analytics::handlers as analytics;
use crate::insights::handlers as insights;
use crate::pipeline::handlers as pipeline;
use crate::records::handlers as records;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Submissions
        .route(
            "/api/v1/resumes",
            get(records::handle_list_resumes)
                // the handler enforces its own upload limit while streaming
                .post(pipeline::handle_submit)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/api/v1/submissions/:id",
            get(pipeline::handle_submission_status),
        )
        // Records and exports
        .route("/api/v1/resumes/:id", get(records::handle_get_resume))
        .route(
            "/api/v1/resumes/:id/document",
            get(records::handle_download_document),
        )
        .route(
            "/api/v1/resumes/:id/preview",
            get(records::handle_download_preview),
        )
        // Insights
        .route(
            "/api/v1/resumes/:id/skill-suggestions",
            get(insights::handle_skill_suggestions),
        )
        .route(
            "/api/v1/resumes/:id/job-recommendations",
            get(insights::handle_job_recommendations),
        )
        // Dashboard
        .route("/api/v1/analytics", get(analytics::handle_analytics))
        .route("/api/v1/compare", get(analytics::handle_compare))
        .with_state(state)
}
