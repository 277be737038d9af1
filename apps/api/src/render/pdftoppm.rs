use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{DocumentRenderer, RenderedImage};

/// Upper bound on one `pdftoppm` run. The child is killed when it is exceeded.
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders page 1 of a PDF to PNG with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    binary: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl PdftoppmRenderer {
    pub fn new(binary: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
            timeout: RENDER_TIMEOUT,
        }
    }

    #[allow(dead_code)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn render(&self, document: &[u8]) -> Result<Bytes> {
        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let input = scratch.path().join("document.pdf");
        let output_base = scratch.path().join("preview");
        tokio::fs::write(&input, document)
            .await
            .context("Failed to write document to scratch directory")?;

        let mut command = Command::new(&self.binary);
        command
            .args(self.args(&input, &output_base))
            .kill_on_drop(true);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "{} timed out after {:?}",
                    self.binary.display(),
                    self.timeout
                )
            })?
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let png = output_base.with_extension("png");
        let bytes = tokio::fs::read(&png)
            .await
            .with_context(|| format!("Renderer produced no image at {}", png.display()))?;
        debug!("Rendered preview ({} bytes)", bytes.len());
        Ok(Bytes::from(bytes))
    }

    fn args(&self, input: &Path, output_base: &Path) -> Vec<String> {
        vec![
            "-png".to_string(),
            "-singlefile".to_string(),
            "-f".to_string(),
            "1".to_string(),
            "-l".to_string(),
            "1".to_string(),
            "-r".to_string(),
            self.dpi.to_string(),
            input.display().to_string(),
            output_base.display().to_string(),
        ]
    }
}

#[async_trait]
impl DocumentRenderer for PdftoppmRenderer {
    async fn render_first_page_as_image(&self, document: Bytes) -> RenderedImage {
        match self.render(&document).await {
            Ok(png) if !png.is_empty() => RenderedImage::png(png),
            Ok(_) => RenderedImage::failed("renderer produced an empty image"),
            Err(e) => {
                warn!("Preview rendering failed: {e:#}");
                RenderedImage::failed(format!("{e:#}"))
            }
        }
    }
}
