//! Blob storage for uploaded documents. Objects live under
//! `{user_id}/{item_id}/{filename}` and are addressed by their public URL.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the bytes and returns the object's URL.
    async fn put(
        &self,
        user_id: &str,
        item_id: Uuid,
        filename: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, AppError>;

    /// Deletes the object behind `url`. `NotFound` when it does not exist.
    async fn delete(&self, url: &str) -> Result<(), AppError>;
}

pub fn object_key(user_id: &str, item_id: Uuid, filename: &str) -> String {
    let filename = filename.replace(['/', '\\'], "_");
    format!("{user_id}/{item_id}/{filename}")
}

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, endpoint: &str) -> Self {
        Self {
            client,
            bucket,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url_prefix(&self) -> String {
        format!("{}/{}/", self.endpoint, self.bucket)
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}{key}", self.url_prefix())
    }

    /// Recovers the object key from a URL produced by [`S3BlobStore::url_for`].
    pub fn key_from_url<'u>(&self, url: &'u str) -> Option<&'u str> {
        url.strip_prefix(&self.url_prefix()).filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        user_id: &str,
        item_id: Uuid,
        filename: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = object_key(user_id, item_id, filename);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload of {key} failed: {e}")))?;

        info!("Stored {key} ({size} bytes)");
        Ok(self.url_for(&key))
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        let key = self
            .key_from_url(url)
            .ok_or_else(|| AppError::NotFound(format!("No stored object for {url}")))?;

        // DeleteObject succeeds for missing keys, so check existence first.
        if let Err(e) = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            let service_error = e.into_service_error();
            if service_error.is_not_found() {
                return Err(AppError::NotFound(format!("Object {key} not found")));
            }
            warn!("HEAD {key} failed: {service_error}");
            return Err(AppError::Storage(format!("Lookup of {key} failed: {service_error}")));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Delete of {key} failed: {e}")))?;

        info!("Deleted {key}");
        Ok(())
    }
}
