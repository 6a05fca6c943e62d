//! Storage for the original résumé PDFs.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Archive key of a candidate's original PDF.
pub fn pdf_key(search_id: Uuid, candidate_id: Uuid) -> String {
    format!("cvs/{search_id}/{candidate_id}.pdf")
}

#[async_trait]
pub trait DocumentArchive: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), AppError>;

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// S3 / MinIO backed archive.
pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Archive {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl DocumentArchive for S3Archive {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| AppError::Archive(format!("S3 upload failed: {e}")))?;

        info!("Uploaded CV to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => return Err(AppError::Archive(format!("S3 download failed: {e}"))),
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::Archive(format!("S3 body read failed: {e}")))?;
        Ok(Some(data.into_bytes()))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Archive(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}

/// Process-local archive for tests and `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryArchive {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl DocumentArchive for MemoryArchive {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), AppError> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, AppError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
