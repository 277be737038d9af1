//! In-process index of running and recently finished submissions, so the
//! status endpoint can answer without touching the record store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::pipeline::status::SubmissionStatus;

/// Read side of one submission's status and progress channels.
#[derive(Debug, Clone)]
pub struct SubmissionHandle {
    status: watch::Receiver<SubmissionStatus>,
    progress: watch::Receiver<u8>,
}

/// Status flattened together with the current upload progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    #[serde(flatten)]
    pub status: SubmissionStatus,
    pub progress: u8,
}

impl SubmissionHandle {
    pub fn new(status: watch::Receiver<SubmissionStatus>, progress: watch::Receiver<u8>) -> Self {
        Self { status, progress }
    }

    pub fn snapshot(&self) -> SubmissionView {
        SubmissionView {
            status: self.status.borrow().clone(),
            progress: *self.progress.borrow(),
        }
    }

    /// Waits until the submission reaches `Complete` or `Failed`.
    #[allow(dead_code)]
    pub async fn finished(&mut self) -> SubmissionView {
        // a closed channel means the coordinator is gone; its last status stands
        let _ = self
            .status
            .wait_for(|status| status.stage.is_terminal())
            .await;
        self.snapshot()
    }
}

#[derive(Clone, Default)]
pub struct SubmissionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SubmissionHandle>>>,
}

impl SubmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, handle: SubmissionHandle) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle);
    }

    pub fn get(&self, id: Uuid) -> Option<SubmissionView> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(SubmissionHandle::snapshot)
    }

    #[allow(dead_code)]
    pub fn handle(&self, id: Uuid) -> Option<SubmissionHandle> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Drops finished submissions whose last update is older than `retention`.
    /// Returns how many were removed.
    pub fn prune(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::zero());
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, handle| {
            let status = handle.status.borrow();
            !(status.stage.is_terminal() && status.updated_at < cutoff)
        });
        before - map.len()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
