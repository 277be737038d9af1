//! Upload coordinator. Drives one submission from a local PDF to a scored,
//! persisted record.
//!
//! Flow: upload original → render preview → upload preview → persist skeleton
//! (sentinel feedback) → score → persist feedback.
//!
//! Each state carries what the previous stages produced and has exactly one
//! transition method. The first failure ends the submission; nothing already
//! written is rolled back, so a skeleton record can stay behind as pending.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::feedback::Feedback;
use crate::models::resume::{FeedbackState, ResumeRecord};
use crate::pipeline::progress::ProgressSimulator;
use crate::pipeline::registry::SubmissionHandle;
use crate::pipeline::status::{
    PipelineError, PipelineStage, SubmissionStatus, UploadTarget,
};
use crate::records::save_record;
use crate::render::DocumentRenderer;
use crate::scoring::prompts::prepare_instructions;
use crate::scoring::{EngineResponse, ScoringEngine};
use crate::stores::{BlobStore, RecordStore, StoredBlob, UploadFile};

/// External systems a submission talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub scoring: Arc<dyn ScoringEngine>,
}

/// A resume plus the job it targets, as submitted by the user.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub file_name: String,
    pub document: Bytes,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

#[derive(Debug)]
enum PipelineState {
    Idle,
    UploadingResume,
    ConvertingImage {
        resume_path: String,
    },
    UploadingImage {
        resume_path: String,
        image: Bytes,
    },
    PersistingSkeleton {
        resume_path: String,
        image_path: String,
    },
    Analyzing {
        record: ResumeRecord,
    },
    PersistingFeedback {
        record: ResumeRecord,
        response: EngineResponse,
    },
    Complete {
        record_id: Uuid,
    },
    Failed {
        stage: PipelineStage,
        error: PipelineError,
    },
}

impl PipelineState {
    fn stage(&self) -> PipelineStage {
        match self {
            PipelineState::Idle => PipelineStage::Idle,
            PipelineState::UploadingResume => PipelineStage::UploadingResume,
            PipelineState::ConvertingImage { .. } => PipelineStage::ConvertingImage,
            PipelineState::UploadingImage { .. } => PipelineStage::UploadingImage,
            PipelineState::PersistingSkeleton { .. } => PipelineStage::PersistingSkeleton,
            PipelineState::Analyzing { .. } => PipelineStage::Analyzing,
            PipelineState::PersistingFeedback { .. } => PipelineStage::PersistingFeedback,
            PipelineState::Complete { .. } => PipelineStage::Complete,
            PipelineState::Failed { .. } => PipelineStage::Failed,
        }
    }
}

pub struct UploadCoordinator {
    id: Uuid,
    request: SubmissionRequest,
    deps: Collaborators,
    progress_tick: Duration,
    status: watch::Sender<SubmissionStatus>,
    progress: Arc<watch::Sender<u8>>,
}

impl UploadCoordinator {
    pub fn new(request: SubmissionRequest, deps: Collaborators, progress_tick: Duration) -> Self {
        let id = Uuid::new_v4();
        let (status, _) = watch::channel(SubmissionStatus::idle(id));
        let (progress, _) = watch::channel(0);
        Self {
            id,
            request,
            deps,
            progress_tick,
            status,
            progress: Arc::new(progress),
        }
    }

    /// Record id this submission will be stored under.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> SubmissionHandle {
        SubmissionHandle::new(self.status.subscribe(), self.progress.subscribe())
    }

    /// Runs every stage in order. Returns the record id on completion or the
    /// error that stopped the submission.
    pub async fn run(self) -> Result<Uuid, PipelineError> {
        info!(
            "Submission {} started for {:?} at {:?}",
            self.id, self.request.job_title, self.request.company_name
        );
        let mut state = PipelineState::Idle;
        loop {
            self.publish(&state);
            state = match state {
                PipelineState::Complete { record_id } => {
                    info!("Submission {} complete", self.id);
                    return Ok(record_id);
                }
                PipelineState::Failed { stage, error } => {
                    error!(
                        "Submission {} failed at {}: {error:?}",
                        self.id,
                        stage.failure_reason()
                    );
                    return Err(error);
                }
                state => {
                    let stage = state.stage();
                    match self.advance(state).await {
                        Ok(next) => {
                            info!("Submission {}: {:?} → {:?}", self.id, stage, next.stage());
                            next
                        }
                        Err(error) => PipelineState::Failed { stage, error },
                    }
                }
            };
        }
    }

    async fn advance(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
        match state {
            PipelineState::Idle => Ok(PipelineState::UploadingResume),
            PipelineState::UploadingResume => self.upload_resume().await,
            PipelineState::ConvertingImage { resume_path } => self.convert_image(resume_path).await,
            PipelineState::UploadingImage { resume_path, image } => {
                self.upload_image(resume_path, image).await
            }
            PipelineState::PersistingSkeleton {
                resume_path,
                image_path,
            } => self.persist_skeleton(resume_path, image_path).await,
            PipelineState::Analyzing { record } => self.analyze(record).await,
            PipelineState::PersistingFeedback { record, response } => {
                self.persist_feedback(record, response).await
            }
            terminal @ (PipelineState::Complete { .. } | PipelineState::Failed { .. }) => {
                Ok(terminal)
            }
        }
    }

    async fn upload_resume(&self) -> Result<PipelineState, PipelineError> {
        let progress = ProgressSimulator::start(self.progress.clone(), self.progress_tick);
        let file = UploadFile {
            name: self.request.file_name.clone(),
            content_type: "application/pdf".to_string(),
            bytes: self.request.document.clone(),
        };
        let stored = self
            .upload(file)
            .await
            .ok_or(PipelineError::Upload(UploadTarget::Resume))?;
        progress.complete();
        Ok(PipelineState::ConvertingImage {
            resume_path: stored.path,
        })
    }

    async fn convert_image(&self, resume_path: String) -> Result<PipelineState, PipelineError> {
        let rendered = self
            .deps
            .renderer
            .render_first_page_as_image(self.request.document.clone())
            .await;
        match rendered.file {
            Some(image) => Ok(PipelineState::UploadingImage { resume_path, image }),
            None => Err(PipelineError::Conversion {
                detail: rendered.error,
            }),
        }
    }

    async fn upload_image(
        &self,
        resume_path: String,
        image: Bytes,
    ) -> Result<PipelineState, PipelineError> {
        let progress = ProgressSimulator::start(self.progress.clone(), self.progress_tick);
        let file = UploadFile {
            name: preview_name(&self.request.file_name),
            content_type: "image/png".to_string(),
            bytes: image,
        };
        let stored = self
            .upload(file)
            .await
            .ok_or(PipelineError::Upload(UploadTarget::Image))?;
        progress.complete();
        Ok(PipelineState::PersistingSkeleton {
            resume_path,
            image_path: stored.path,
        })
    }

    async fn persist_skeleton(
        &self,
        resume_path: String,
        image_path: String,
    ) -> Result<PipelineState, PipelineError> {
        let record = ResumeRecord {
            id: self.id,
            resume_path,
            image_path,
            company_name: self.request.company_name.clone(),
            job_title: self.request.job_title.clone(),
            job_description: self.request.job_description.clone(),
            feedback: FeedbackState::Pending,
        };
        self.save(&record).await?;
        Ok(PipelineState::Analyzing { record })
    }

    async fn analyze(&self, record: ResumeRecord) -> Result<PipelineState, PipelineError> {
        let instructions = prepare_instructions(&record.job_title, &record.job_description);
        match self
            .deps
            .scoring
            .feedback(&record.resume_path, &instructions)
            .await
        {
            Ok(Some(response)) => Ok(PipelineState::PersistingFeedback { record, response }),
            Ok(None) => Err(PipelineError::Analysis { detail: None }),
            Err(e) => Err(PipelineError::Analysis {
                detail: Some(format!("{e:#}")),
            }),
        }
    }

    async fn persist_feedback(
        &self,
        mut record: ResumeRecord,
        response: EngineResponse,
    ) -> Result<PipelineState, PipelineError> {
        let text = response
            .text()
            .ok_or_else(|| PipelineError::Parse("engine response carried no text".to_string()))?;
        let feedback =
            Feedback::from_engine_text(text).map_err(|e| PipelineError::Parse(e.to_string()))?;
        record.feedback = FeedbackState::Scored(Box::new(feedback));
        self.save(&record).await?;
        Ok(PipelineState::Complete {
            record_id: record.id,
        })
    }

    async fn upload(&self, file: UploadFile) -> Option<StoredBlob> {
        let name = file.name.clone();
        match self.deps.blobs.upload(vec![file]).await {
            Ok(Some(stored)) => Some(stored),
            Ok(None) => {
                warn!("Blob store returned nothing for {name}");
                None
            }
            Err(e) => {
                warn!("Blob upload of {name} failed: {e:#}");
                None
            }
        }
    }

    async fn save(&self, record: &ResumeRecord) -> Result<(), PipelineError> {
        save_record(self.deps.records.as_ref(), record)
            .await
            .map_err(|e| PipelineError::Persist {
                detail: format!("{e:#}"),
            })
    }

    fn publish(&self, state: &PipelineState) {
        let stage = state.stage();
        let (status_text, failed_step) = match state {
            PipelineState::Failed { stage, error } => {
                (format!("Error: {error}"), Some(stage.failure_reason()))
            }
            _ => (stage.status_text().to_string(), None),
        };
        self.status.send_replace(SubmissionStatus {
            id: self.id,
            stage,
            status_text,
            failed_step,
            updated_at: Utc::now(),
        });
    }
}

/// `resume.pdf` → `resume.png`.
fn preview_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("resume");
    format!("{stem}.png")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::*;
    use crate::pipeline::progress::PROGRESS_DONE;
    use crate::records::{load_record, load_records};
    use crate::render::RenderedImage;
    use crate::scoring::ContentPart;
    use crate::stores::memory::{MemoryBlobStore, MemoryRecordStore};
    use crate::stores::KvItem;

    const FEEDBACK_JSON: &str = r#"{"overallScore":82,"ATS":{"score":76,"tips":[{"type":"improve","tip":"Add metrics"}],"matchedKeywords":["Rust"]},"toneAndStyle":{"score":80,"tips":[]},"content":{"score":70,"tips":[]},"structure":{"score":85,"tips":[]},"skills":{"score":60,"tips":[]}}"#;

    type Events = Arc<Mutex<Vec<String>>>;

    fn log(events: &Events, event: impl Into<String>) {
        events.lock().unwrap().push(event.into());
    }

    struct LoggingRecords {
        inner: MemoryRecordStore,
        events: Events,
        fail: bool,
    }

    #[async_trait]
    impl RecordStore for LoggingRecords {
        async fn set(&self, key: &str, value: &str) -> Result<()> {
            log(&self.events, "set");
            if self.fail {
                return Err(anyhow!("disk full"));
            }
            self.inner.set(key, value).await
        }

        async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvItem>> {
            self.inner.list(pattern, include_values).await
        }
    }

    struct LoggingBlobs {
        inner: MemoryBlobStore,
        events: Events,
        uploads: AtomicUsize,
        /// 1-based upload number that returns nothing.
        drop_upload: Option<usize>,
    }

    #[async_trait]
    impl BlobStore for LoggingBlobs {
        async fn upload(&self, files: Vec<UploadFile>) -> Result<Option<StoredBlob>> {
            let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
            log(&self.events, format!("upload:{}", files[0].name));
            if self.drop_upload == Some(n) {
                return Ok(None);
            }
            self.inner.upload(files).await
        }

        async fn read(&self, path: &str) -> Result<Option<Bytes>> {
            self.inner.read(path).await
        }
    }

    struct StubRenderer {
        events: Events,
        image: Option<Bytes>,
    }

    #[async_trait]
    impl DocumentRenderer for StubRenderer {
        async fn render_first_page_as_image(&self, _document: Bytes) -> RenderedImage {
            log(&self.events, "render");
            match &self.image {
                Some(png) => RenderedImage::png(png.clone()),
                None => RenderedImage::failed("corrupt PDF"),
            }
        }
    }

    struct StubScoring {
        events: Events,
        response: Option<EngineResponse>,
        last_instructions: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ScoringEngine for StubScoring {
        async fn feedback(
            &self,
            _document_path: &str,
            instructions: &str,
        ) -> Result<Option<EngineResponse>> {
            log(&self.events, "score");
            *self.last_instructions.lock().unwrap() = Some(instructions.to_string());
            Ok(self.response.clone())
        }
    }

    struct Harness {
        events: Events,
        records: Arc<LoggingRecords>,
        scoring: Arc<StubScoring>,
        deps: Collaborators,
    }

    #[derive(Default)]
    struct Setup {
        drop_upload: Option<usize>,
        no_image: bool,
        response: Option<EngineResponse>,
        failing_records: bool,
    }

    fn harness(setup: Setup) -> Harness {
        let events: Events = Arc::default();
        let records = Arc::new(LoggingRecords {
            inner: MemoryRecordStore::new(),
            events: events.clone(),
            fail: setup.failing_records,
        });
        let blobs = Arc::new(LoggingBlobs {
            inner: MemoryBlobStore::new(),
            events: events.clone(),
            uploads: AtomicUsize::new(0),
            drop_upload: setup.drop_upload,
        });
        let renderer = Arc::new(StubRenderer {
            events: events.clone(),
            image: (!setup.no_image).then(|| Bytes::from_static(b"\x89PNG")),
        });
        let scoring = Arc::new(StubScoring {
            events: events.clone(),
            response: setup.response,
            last_instructions: Mutex::new(None),
        });
        let deps = Collaborators {
            records: records.clone(),
            blobs,
            renderer,
            scoring: scoring.clone(),
        };
        Harness {
            events,
            records,
            scoring,
            deps,
        }
    }

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            file_name: "jane-doe.pdf".to_string(),
            document: Bytes::from_static(b"%PDF-1.7"),
            company_name: "Acme".to_string(),
            job_title: "Platform Engineer".to_string(),
            job_description: "Operate Kubernetes clusters".to_string(),
        }
    }

    fn coordinator(h: &Harness) -> UploadCoordinator {
        UploadCoordinator::new(request(), h.deps.clone(), Duration::from_millis(5))
    }

    fn events(h: &Harness) -> Vec<String> {
        h.events.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_happy_path_persists_scored_record() {
        let h = harness(Setup {
            response: Some(EngineResponse::from_text(FEEDBACK_JSON)),
            ..Setup::default()
        });
        let coordinator = coordinator(&h);
        let handle = coordinator.subscribe();

        let id = coordinator.run().await.unwrap();

        assert_eq!(
            events(&h),
            vec!["upload:jane-doe.pdf", "render", "upload:jane-doe.png", "set", "score", "set"]
        );
        let record = load_record(&h.records.inner, id).await.unwrap().unwrap();
        assert_eq!(record.ats_score(), 76);
        assert_eq!(record.company_name, "Acme");

        let view = handle.snapshot();
        assert_eq!(view.status.stage, PipelineStage::Complete);
        assert_eq!(view.status.id, id);
        assert_eq!(view.progress, PROGRESS_DONE);
    }

    #[tokio::test]
    async fn test_instructions_are_built_from_job_metadata() {
        let h = harness(Setup {
            response: Some(EngineResponse::from_text(FEEDBACK_JSON)),
            ..Setup::default()
        });
        coordinator(&h).run().await.unwrap();

        let instructions = h.scoring.last_instructions.lock().unwrap().clone().unwrap();
        assert!(instructions.contains("Platform Engineer"));
        assert!(instructions.contains("Operate Kubernetes clusters"));
    }

    #[tokio::test]
    async fn test_string_and_parts_content_give_identical_feedback() {
        let from_string = harness(Setup {
            response: Some(EngineResponse::from_text(FEEDBACK_JSON)),
            ..Setup::default()
        });
        let from_parts = harness(Setup {
            response: Some(EngineResponse::from_parts(vec![ContentPart {
                kind: Some("text".to_string()),
                text: Some(FEEDBACK_JSON.to_string()),
            }])),
            ..Setup::default()
        });

        let a = coordinator(&from_string).run().await.unwrap();
        let b = coordinator(&from_parts).run().await.unwrap();

        let a = load_record(&from_string.records.inner, a).await.unwrap().unwrap();
        let b = load_record(&from_parts.records.inner, b).await.unwrap().unwrap();
        assert_eq!(a.feedback, b.feedback);
        assert!(!a.is_pending());
    }

    #[tokio::test]
    async fn test_conversion_failure_stops_before_later_stages() {
        let h = harness(Setup {
            no_image: true,
            response: Some(EngineResponse::from_text(FEEDBACK_JSON)),
            ..Setup::default()
        });
        let coordinator = coordinator(&h);
        let handle = coordinator.subscribe();

        let err = coordinator.run().await.unwrap_err();

        assert_eq!(
            err,
            PipelineError::Conversion {
                detail: Some("corrupt PDF".to_string())
            }
        );
        assert_eq!(events(&h), vec!["upload:jane-doe.pdf", "render"]);
        let view = handle.snapshot();
        assert_eq!(view.status.stage, PipelineStage::Failed);
        assert_eq!(view.status.failed_step, Some("convert"));
        assert_eq!(view.status.status_text, "Error: Failed to convert PDF to image");
    }

    #[tokio::test]
    async fn test_resume_upload_failure_is_terminal() {
        let h = harness(Setup {
            drop_upload: Some(1),
            ..Setup::default()
        });
        let coordinator = coordinator(&h);
        let handle = coordinator.subscribe();

        let err = coordinator.run().await.unwrap_err();

        assert_eq!(err, PipelineError::Upload(UploadTarget::Resume));
        assert_eq!(events(&h), vec!["upload:jane-doe.pdf"]);
        assert_eq!(handle.snapshot().status.failed_step, Some("upload resume"));
        assert!(handle.snapshot().progress < PROGRESS_DONE);
    }

    #[tokio::test]
    async fn test_image_upload_failure_writes_no_record() {
        let h = harness(Setup {
            drop_upload: Some(2),
            ..Setup::default()
        });
        let err = coordinator(&h).run().await.unwrap_err();
        assert_eq!(err, PipelineError::Upload(UploadTarget::Image));
        assert!(load_records(&h.records.inner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analysis_failure_leaves_pending_skeleton() {
        let h = harness(Setup::default());
        let coordinator = coordinator(&h);
        let id = coordinator.id();

        let err = coordinator.run().await.unwrap_err();

        assert_eq!(err, PipelineError::Analysis { detail: None });
        let record = load_record(&h.records.inner, id).await.unwrap().unwrap();
        assert!(record.is_pending());
        assert_eq!(events(&h).last().map(String::as_str), Some("score"));
    }

    #[tokio::test]
    async fn test_unparseable_feedback_fails_at_persist_feedback() {
        let h = harness(Setup {
            response: Some(EngineResponse::from_text("I think this resume is great!")),
            ..Setup::default()
        });
        let coordinator = coordinator(&h);
        let handle = coordinator.subscribe();
        let id = coordinator.id();

        let err = coordinator.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Parse(_)));
        assert_eq!(
            handle.snapshot().status.failed_step,
            Some("parse/persist feedback")
        );
        let record = load_record(&h.records.inner, id).await.unwrap().unwrap();
        assert!(record.is_pending());
    }

    #[tokio::test]
    async fn test_empty_parts_response_is_parse_failure() {
        let h = harness(Setup {
            response: Some(EngineResponse::from_parts(vec![])),
            ..Setup::default()
        });
        let err = coordinator(&h).run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn test_record_store_failure_stops_before_scoring() {
        let h = harness(Setup {
            failing_records: true,
            response: Some(EngineResponse::from_text(FEEDBACK_JSON)),
            ..Setup::default()
        });
        let err = coordinator(&h).run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Persist { .. }));
        assert!(!events(&h).contains(&"score".to_string()));
    }

    #[test]
    fn test_preview_name_swaps_extension() {
        assert_eq!(preview_name("cv.pdf"), "cv.png");
        assert_eq!(preview_name("my.resume.pdf"), "my.resume.png");
        assert_eq!(preview_name(""), "resume.png");
    }
}
