use crate::config::Config;
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Duration;
use uuid::Uuid;

/// S3-compatible object store holding image bytes. Records in the database
/// reference objects by the opaque key this service hands back.
pub struct ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    presign_ttl: Duration,
}

impl ObjectStore {
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            config.s3_access_key.clone(),
            config.s3_secret_key.clone(),
            None,
            None,
            "facet-config",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        ObjectStore {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.s3_bucket.clone(),
            presign_ttl: Duration::from_secs(config.presign_ttl_secs),
        }
    }

    /// Stores image bytes under a fresh project-scoped key and returns it.
    pub async fn put(
        &self,
        bytes: Vec<u8>,
        image_id: Uuid,
        project_id: Uuid,
        mime_type: &str,
    ) -> Result<String> {
        let key = format!(
            "projects/{}/{}.{}",
            project_id,
            image_id,
            extension_for_mime(mime_type)
        );
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(mime_type)
            .send()
            .await
            .with_context(|| format!("failed to store object {}", key))?;

        tracing::info!("Stored object {} ({}KB)", key, size / 1024);
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to fetch object {}", key))?;

        let data = output
            .body
            .collect()
            .await
            .with_context(|| format!("failed to read object body {}", key))?;
        Ok(data.into_bytes().to_vec())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to delete object {}", key))?;
        Ok(())
    }

    /// Time-bounded retrieval link for an otherwise-private object.
    pub async fn presigned_url(&self, key: &str) -> Result<String> {
        let presigning = PresigningConfig::expires_in(self.presign_ttl)
            .context("invalid presign TTL")?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .with_context(|| format!("failed to presign {}", key))?;

        Ok(request.uri().to_string())
    }
}

fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// MIME type inferred back from a stored key's extension.
pub fn mime_for_key(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_extension_follows_mime_type() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("application/octet-stream"), "png");
    }

    #[test]
    fn mime_round_trips_through_key() {
        for mime in ["image/png", "image/jpeg", "image/webp"] {
            let key = format!("projects/p/i.{}", extension_for_mime(mime));
            assert_eq!(mime_for_key(&key), mime);
        }
    }
}
