//! First-page preview rendering.

pub mod pdftoppm;

use async_trait::async_trait;
use bytes::Bytes;

/// Outcome of rendering. `file` is `None` when nothing was produced, in which
/// case `error` says why.
#[derive(Debug, Clone, Default)]
pub struct RenderedImage {
    pub file: Option<Bytes>,
    pub error: Option<String>,
}

impl RenderedImage {
    pub fn png(bytes: Bytes) -> Self {
        Self {
            file: Some(bytes),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            file: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_first_page_as_image(&self, document: Bytes) -> RenderedImage;
}
