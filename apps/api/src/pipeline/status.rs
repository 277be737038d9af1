use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Which of the two uploads failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Resume,
    Image,
}

impl fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadTarget::Resume => write!(f, "file"),
            UploadTarget::Image => write!(f, "image"),
        }
    }
}

/// Terminal failure of a submission. None of these are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Failed to upload {0}")]
    Upload(UploadTarget),

    #[error("Failed to convert PDF to image")]
    Conversion { detail: Option<String> },

    #[error("Failed to save resume record")]
    Persist { detail: String },

    #[error("Failed to analyze resume")]
    Analysis { detail: Option<String> },

    #[error("Failed to parse feedback: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    UploadingResume,
    ConvertingImage,
    UploadingImage,
    PersistingSkeleton,
    Analyzing,
    PersistingFeedback,
    Complete,
    Failed,
}

impl PipelineStage {
    pub fn status_text(self) -> &'static str {
        match self {
            PipelineStage::Idle => "Waiting to start...",
            PipelineStage::UploadingResume => "Uploading the file...",
            PipelineStage::ConvertingImage => "Converting to image...",
            PipelineStage::UploadingImage => "Uploading the image...",
            PipelineStage::PersistingSkeleton => "Preparing data...",
            PipelineStage::Analyzing => "Analyzing...",
            PipelineStage::PersistingFeedback => "Saving feedback...",
            PipelineStage::Complete => "Analysis complete",
            PipelineStage::Failed => "Failed",
        }
    }

    /// Short name of the step that broke, used in `Failed` statuses.
    pub fn failure_reason(self) -> &'static str {
        match self {
            PipelineStage::UploadingResume => "upload resume",
            PipelineStage::ConvertingImage => "convert",
            PipelineStage::UploadingImage => "upload image",
            PipelineStage::PersistingSkeleton => "persist record",
            PipelineStage::Analyzing => "analyze",
            PipelineStage::PersistingFeedback => "parse/persist feedback",
            PipelineStage::Idle | PipelineStage::Complete | PipelineStage::Failed => "unknown",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Complete | PipelineStage::Failed)
    }
}

/// What an observer of a submission sees after each transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStatus {
    pub id: Uuid,
    pub stage: PipelineStage,
    pub status_text: String,
    /// Step that failed, set only when `stage` is `Failed`.
    pub failed_step: Option<&'static str>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionStatus {
    pub fn idle(id: Uuid) -> Self {
        Self {
            id,
            stage: PipelineStage::Idle,
            status_text: PipelineStage::Idle.status_text().to_string(),
            failed_step: None,
            updated_at: Utc::now(),
        }
    }
}
