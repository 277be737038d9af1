use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::{upload_key, BlobStore, StoredBlob, UploadFile};

/// Blob store backed by an S3 (or MinIO) bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Option<StoredBlob>> {
        let mut first = None;
        for file in files {
            let key = upload_key(&file.name);
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .body(ByteStream::from(file.bytes))
                .content_type(&file.content_type)
                .send()
                .await
                .map_err(|e| anyhow!("S3 upload failed: {e}"))?;
            info!("Uploaded s3://{}/{}", self.bucket, key);
            first.get_or_insert(StoredBlob { path: key });
        }
        Ok(first)
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => return Err(anyhow!("S3 download failed: {e}")),
        };
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 body read failed: {e}"))?;
        Ok(Some(data.into_bytes()))
    }
}
