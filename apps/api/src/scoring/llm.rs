use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::llm_client::{ContentBlock, LlmClient};
use crate::scoring::prompts::{build_scoring_prompt, SCORING_SYSTEM};
use crate::scoring::{ContentPart, EngineResponse, ScoringEngine};
use crate::stores::BlobStore;

/// Scores a stored PDF with Claude: reads it back from the blob store,
/// extracts its text and sends text plus instructions to the model.
pub struct LlmScoringEngine {
    llm: LlmClient,
    blobs: Arc<dyn BlobStore>,
}

impl LlmScoringEngine {
    pub fn new(llm: LlmClient, blobs: Arc<dyn BlobStore>) -> Self {
        Self { llm, blobs }
    }
}

#[async_trait]
impl ScoringEngine for LlmScoringEngine {
    async fn feedback(
        &self,
        document_path: &str,
        instructions: &str,
    ) -> Result<Option<EngineResponse>> {
        let Some(document) = self.blobs.read(document_path).await? else {
            warn!("Document {document_path} not found in blob store");
            return Ok(None);
        };

        let resume_text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&document)
                .map_err(|e| anyhow!("PDF text extraction failed: {e}"))
        })
        .await
        .context("PDF text extraction task panicked")??;

        if resume_text.trim().is_empty() {
            warn!("Document {document_path} has no extractable text");
            return Ok(None);
        }

        let prompt = build_scoring_prompt(instructions, &resume_text);
        let response = self.llm.call(&prompt, SCORING_SYSTEM).await?;
        info!(
            "Scoring call for {document_path} used {} output tokens",
            response.usage.output_tokens
        );

        let parts = text_parts(response.content);
        if parts.is_empty() {
            return Ok(None);
        }
        Ok(Some(EngineResponse::from_parts(parts)))
    }
}

/// Keeps only text blocks so the first part always carries the answer.
fn text_parts(blocks: Vec<ContentBlock>) -> Vec<ContentPart> {
    blocks
        .into_iter()
        .filter(|b| b.block_type == "text" && b.text.is_some())
        .map(|b| ContentPart {
            kind: Some(b.block_type),
            text: b.text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: &str, text: Option<&str>) -> ContentBlock {
        ContentBlock {
            block_type: kind.to_string(),
            text: text.map(String::from),
        }
    }

    #[test]
    fn test_text_parts_skip_non_text_blocks() {
        let parts = text_parts(vec![
            block("thinking", None),
            block("text", Some("{\"overallScore\":1}")),
        ]);
        assert_eq!(parts.len(), 1);
        let response = EngineResponse::from_parts(parts);
        assert_eq!(response.text(), Some("{\"overallScore\":1}"));
    }

    #[test]
    fn test_text_parts_empty_when_no_text() {
        assert!(text_parts(vec![block("tool_use", None)]).is_empty());
    }
}
