use std::sync::Arc;

use crate::config::Config;
use crate::insights::catalog::{JobCatalog, SkillCatalog};
use crate::pipeline::coordinator::Collaborators;
use crate::pipeline::registry::SubmissionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stores, renderer and scoring engine shared by every submission.
    pub deps: Collaborators,
    pub submissions: SubmissionRegistry,
    pub skill_catalog: Arc<dyn SkillCatalog>,
    pub job_catalog: Arc<dyn JobCatalog>,
}
