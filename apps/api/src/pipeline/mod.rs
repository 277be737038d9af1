//! Resume submission pipeline.

pub mod coordinator;
pub mod handlers;
pub mod progress;
pub mod registry;
pub mod status;

use std::time::Duration;

use uuid::Uuid;

use crate::pipeline::coordinator::{Collaborators, SubmissionRequest, UploadCoordinator};
use crate::pipeline::registry::SubmissionRegistry;

/// How long finished submissions stay visible on the status endpoint.
pub const STATUS_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Registers a new submission and runs it in the background.
pub fn spawn_submission(
    request: SubmissionRequest,
    deps: Collaborators,
    registry: &SubmissionRegistry,
    progress_tick: Duration,
) -> Uuid {
    registry.prune(STATUS_RETENTION);

    let coordinator = UploadCoordinator::new(request, deps, progress_tick);
    let id = coordinator.id();
    registry.insert(id, coordinator.subscribe());

    tokio::spawn(async move {
        // outcome is already logged and published on the status channel
        let _ = coordinator.run().await;
    });
    id
}
