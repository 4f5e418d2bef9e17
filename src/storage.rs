// src/storage.rs
//
// Object storage for menu and branding images. Uploads fail the request;
// deletes are best-effort cleanup and only ever log.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Clone)]
pub struct Storage {
    client: S3Client,
    bucket: String,
    public_base_url: String,
    /// MOCK_S3=true skips the actual calls; URLs are still produced.
    mock: bool,
}

impl Storage {
    pub fn new(client: S3Client, bucket: String, public_base_url: String, mock: bool) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
            mock,
        }
    }

    pub async fn upload_image(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let key = format!("{prefix}/{}-{}", Uuid::new_v4(), sanitize(filename));

        if !self.mock {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .content_type(content_type)
                .body(ByteStream::from(bytes))
                .send()
                .await
                .map_err(|e| ApiError::Internal(format!("s3 upload failed: {e}").into()))?;
        }

        Ok(build_public_url(&self.public_base_url, &self.bucket, &key))
    }

    /// One delete call per stored URL. Never fails the caller.
    pub async fn delete_image(&self, url: &str) {
        let Some(key) = object_key_from_url(&self.public_base_url, &self.bucket, url) else {
            log::warn!("cannot derive object key from {url}, skipping delete");
            return;
        };

        if self.mock {
            return;
        }

        if let Err(e) = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            log::error!("s3 delete failed for {key}: {e}");
        }
    }
}

/// Allow simple templating: https://host/{bucket}/{key} or https://bucket.host/{key}.
pub fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');

    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }

    if trimmed.contains(bucket) {
        format!("{trimmed}/{key}")
    } else {
        format!("{trimmed}/{bucket}/{key}")
    }
}

/// Inverse of `build_public_url` for cleanup of previously stored URLs.
pub fn object_key_from_url(base: &str, bucket: &str, url: &str) -> Option<String> {
    let trimmed = base.trim_end_matches('/');
    let rest = url.strip_prefix(trimmed)?.trim_start_matches('/');

    let key = match rest.strip_prefix(&format!("{bucket}/")) {
        Some(key) => key,
        None => rest,
    };

    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

fn sanitize(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect()
}
