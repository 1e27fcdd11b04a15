//! S3 object storage implementation

use crate::blobs::{join_url, BlobStore, StoredObject};
use crate::config::BlobConfig;
use crate::error::{RecordError, Result};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Builder as S3ConfigBuilder, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use log::{debug, info};

/// Object store backed by an S3 bucket
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Create an S3 store from static credentials in the configuration
    pub fn new(config: &BlobConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "patient-records-config",
        );

        let mut builder = S3ConfigBuilder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let public_base_url = public_base_url(config);
        info!(
            "Using S3 bucket {} in region {}, files served from {}",
            config.bucket, config.region, public_base_url
        );

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base_url,
        }
    }
}

/// Base URL objects are reachable at, in order of preference: the configured
/// public URL, the custom endpoint (path style), the AWS virtual-host URL.
fn public_base_url(config: &BlobConfig) -> String {
    if let Some(base) = &config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    match &config.endpoint {
        Some(endpoint) => join_url(endpoint, &config.bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn name(&self) -> &str {
        "s3"
    }

    async fn put_object(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<StoredObject> {
        let size = data.len() as u64;
        debug!("S3 PUT bucket={}, key={}, size={}", self.bucket, key, size);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(size as i64)
            .body(ByteStream::from(data));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        let output = request
            .send()
            .await
            .map_err(|e| RecordError::Upload(format!("S3 put of {} failed: {}", key, DisplayErrorContext(&e))))?;

        Ok(StoredObject {
            key: key.to_string(),
            url: self.object_url(key),
            etag: output.e_tag().map(|tag| tag.trim_matches('"').to_string()),
            size,
        })
    }

    fn object_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
