//! Blob store boundary.
//!
//! The upload transport is a collaborator behind a narrow trait: hand it a
//! finished archive and a key, get back success or an opaque failure.
//! Exactly one attempt is made per plan run; retries are out of scope.

use std::path::Path;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use log::info;
use thiserror::Error;
use tokio::runtime::Handle;

use crate::config::AwsSettings;

#[derive(Debug, Error)]
#[error("failed to upload `{key}` to bucket `{bucket}`: {message}")]
pub struct UploadError {
    bucket: String,
    key: String,
    message: String,
}

impl UploadError {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Stores a finished archive remotely.
pub trait BlobStore {
    /// Transfers `file` to the store under `key`.
    fn put(&self, file: &Path, key: &str) -> Result<(), UploadError>;
}

/// S3-backed blob store.
///
/// Built from explicit configuration values; nothing is read from the
/// process environment. SDK calls are driven to completion on the runtime
/// handle the store was constructed with.
pub struct S3Store {
    client: Client,
    bucket: String,
    handle: Handle,
}

impl S3Store {
    pub fn new(handle: Handle, aws: &AwsSettings) -> Self {
        let credentials = Credentials::new(
            aws.access_key.clone(),
            aws.secret_key.clone(),
            None,
            None,
            "s3backup-config",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(aws.region.clone()))
            .credentials_provider(credentials)
            .build();
        Self {
            client: Client::from_conf(config),
            bucket: aws.bucket.clone(),
            handle,
        }
    }
}

impl BlobStore for S3Store {
    fn put(&self, file: &Path, key: &str) -> Result<(), UploadError> {
        info!("uploading {} to s3://{}/{}", file.display(), self.bucket, key);
        self.handle.block_on(async {
            let body = ByteStream::from_path(file)
                .await
                .map_err(|e| UploadError::new(self.bucket.clone(), key, e.to_string()))?;
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(|e| {
                    UploadError::new(self.bucket.clone(), key, DisplayErrorContext(e).to_string())
                })?;
            Ok(())
        })
    }
}
