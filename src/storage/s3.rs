//! Amazon S3 backend.
//!
//! Credentials and the default region come from the standard AWS provider
//! chain.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;

use super::{Listing, ObjectEntry, ObjectStore};
use crate::error::{RedactorError, RedactorResult};

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Connects to `bucket`, overriding the region when given.
    pub async fn new(bucket: &str, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::with_client(Client::new(&config), bucket)
    }

    pub fn with_client(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Pages through `list_objects_v2`, optionally grouping by `/`.
    async fn list_pages(&self, prefix: &str, delimited: bool) -> RedactorResult<Listing> {
        let mut listing = Listing::default();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.take());
            if delimited {
                request = request.delimiter("/");
            }
            let page = request
                .send()
                .await
                .map_err(|e| storage_error(prefix, e))?;

            listing.folders.extend(
                page.common_prefixes()
                    .iter()
                    .filter_map(|cp| cp.prefix().map(str::to_string)),
            );
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                if key == prefix {
                    continue;
                }
                let size = object.size().unwrap_or(0).max(0) as u64;
                listing.files.push(ObjectEntry::new(key, size));
            }

            match (page.is_truncated(), page.next_continuation_token()) {
                (Some(true), Some(next)) => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(listing)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> RedactorResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(bytes.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| storage_error(key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> RedactorResult<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error(key, e))?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error(key, e))?;
        Ok(bytes.to_vec())
    }

    async fn list(&self, prefix: &str) -> RedactorResult<Listing> {
        self.list_pages(prefix, true).await
    }

    async fn list_recursive(&self, prefix: &str) -> RedactorResult<Vec<ObjectEntry>> {
        Ok(self.list_pages(prefix, false).await?.files)
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

fn storage_error<E>(key: &str, err: E) -> RedactorError
where
    E: std::error::Error,
{
    RedactorError::Storage {
        key: key.to_string(),
        message: DisplayErrorContext(err).to_string(),
    }
}
