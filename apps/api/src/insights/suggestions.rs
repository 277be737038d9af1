use serde::Serialize;
use thiserror::Error;

use crate::insights::catalog::{JobCatalog, JobOpening, SkillCatalog};
use crate::models::resume::ResumeRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("Resume has not been scored yet")]
    NotScored,

    #[error("Category '{0}' is not relevant to this job title")]
    UnknownCategory(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSuggestions {
    pub job_title: String,
    pub categories: Vec<CategoryRef>,
    pub selected_category: Option<String>,
    /// Skills of the selected category the resume does not already match.
    pub suggested_skills: Vec<String>,
}

/// Suggests skills for a scored resume. `category` picks one of the
/// relevant categories; without it the first relevant one is used.
pub fn suggest_skills(
    catalog: &dyn SkillCatalog,
    record: &ResumeRecord,
    category: Option<&str>,
) -> Result<SkillSuggestions, SuggestionError> {
    if record.is_pending() {
        return Err(SuggestionError::NotScored);
    }

    let relevant = catalog.relevant_categories(&record.job_title);
    let selected = match category {
        Some(id) => Some(
            relevant
                .iter()
                .copied()
                .find(|c| c.id == id)
                .ok_or_else(|| SuggestionError::UnknownCategory(id.to_string()))?,
        ),
        None => relevant.first().copied(),
    };

    let matched = record.matched_keywords();
    let suggested_skills = selected
        .map(|c| {
            c.skills
                .iter()
                .filter(|skill| !matched.contains(skill))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    Ok(SkillSuggestions {
        job_title: record.job_title.clone(),
        categories: relevant
            .iter()
            .map(|c| CategoryRef {
                id: c.id.clone(),
                name: c.name.clone(),
            })
            .collect(),
        selected_category: selected.map(|c| c.id.clone()),
        suggested_skills,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecommendation {
    #[serde(flatten)]
    pub opening: JobOpening,
    /// Required skills the resume already matches.
    pub matched_skills: Vec<String>,
}

/// Openings sorted by match score, best first.
pub fn recommend_jobs(catalog: &dyn JobCatalog, record: &ResumeRecord) -> Vec<JobRecommendation> {
    let matched = record.matched_keywords();
    let mut openings = catalog.openings();
    openings.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    openings
        .into_iter()
        .map(|opening| {
            let matched_skills = opening
                .skills
                .iter()
                .filter(|skill| matched.contains(skill))
                .cloned()
                .collect();
            JobRecommendation {
                opening,
                matched_skills,
            }
        })
        .collect()
}
