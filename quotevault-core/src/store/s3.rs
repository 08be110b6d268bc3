//! AWS S3 backend.
//!
//! The SDK is async; each call is driven to completion on a private
//! current-thread runtime so the job stays strictly sequential. Credentials
//! come from the default AWS provider chain.

use super::{ObjectStore, StoreError};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::path::Path;
use tokio::runtime::Runtime;

/// Region in which S3 rejects an explicit location constraint.
const DEFAULT_S3_REGION: &str = "us-east-1";

pub struct S3Store {
    client: aws_sdk_s3::Client,
    runtime: Runtime,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, runtime: Runtime) -> Self {
        Self { client, runtime }
    }

    /// Build a client for `region` from the default credential chain.
    pub fn connect(region: &str) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Request(format!("failed to start runtime: {e}")))?;

        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load(),
        );
        tracing::debug!(region, "S3 client configured");

        Ok(Self::new(aws_sdk_s3::Client::new(&sdk_config), runtime))
    }
}

/// Location constraint for bucket creation; none in us-east-1.
fn bucket_configuration(region: &str) -> Option<CreateBucketConfiguration> {
    if region == DEFAULT_S3_REGION {
        return None;
    }
    Some(
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build(),
    )
}

/// Map an SDK failure onto StoreError using the HTTP status, as HeadBucket
/// responses carry no error body.
fn classify<E>(bucket: &str, err: SdkError<E>) -> StoreError
where
    E: std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = DisplayErrorContext(&err).to_string();
    match status {
        Some(404) => StoreError::NotFound {
            bucket: bucket.to_string(),
        },
        Some(403) => StoreError::AccessDenied {
            bucket: bucket.to_string(),
            message,
        },
        _ => StoreError::Request(message),
    }
}

impl ObjectStore for S3Store {
    fn head_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        self.runtime
            .block_on(self.client.head_bucket().bucket(bucket).send())
            .map(|_| ())
            .map_err(|e| classify(bucket, e))
    }

    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(bucket_configuration(region));
        self.runtime
            .block_on(request.send())
            .map(|_| ())
            .map_err(|e| classify(bucket, e))
    }

    fn put_object(&self, bucket: &str, key: &str, body: &Path) -> Result<(), StoreError> {
        self.runtime.block_on(async {
            let stream = ByteStream::from_path(body)
                .await
                .map_err(|e| StoreError::LocalFile {
                    path: body.to_path_buf(),
                    source: std::io::Error::other(e),
                })?;
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(stream)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| classify(bucket, e))
        })
    }
}
