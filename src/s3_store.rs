use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use futures::stream::TryChunksError;
use futures::{pin_mut, Stream, TryStreamExt};
use aws_config::SdkConfig;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{BucketVersioningStatus, Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use tracing::{debug, warn};

use crate::client::{self, FALLBACK_REGION};
use crate::error::StoreError;
use crate::store::{BucketStore, KeyStream, ObjectVersion, Page, PageToken, VersioningStatus};


/// maximum number of keys S3 accepts in a single DeleteObjects request
pub const MAX_DELETE_BATCH: usize = 1000;

/// service error codes that mean the credentials are not good enough
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

/// version id S3 reports for objects stored before versioning was enabled
const NULL_VERSION: &str = "null";


/// `BucketStore` backed by Amazon S3.
///
/// Buckets are listed with the client of the configured region. All other calls
/// go to the region the bucket lives in, which is looked up on first use.
#[derive(Debug)]
pub struct S3Store {
    config: SdkConfig,
    client: Client,
    // region name -> client
    regional_clients: Mutex<HashMap<String, Client>>,
    // bucket name -> region name
    bucket_regions: Mutex<HashMap<String, String>>,
}

impl S3Store {
    pub fn new(config: SdkConfig) -> Self {
        let client = Client::new(&config);
        Self {
            config,
            client,
            regional_clients: Mutex::new(HashMap::new()),
            bucket_regions: Mutex::new(HashMap::new()),
        }
    }

    /// get a client for the region of the bucket
    async fn client_for(&self, bucket_name: &str) -> Result<Client, StoreError> {
        let cached = self.bucket_regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket_name)
            .cloned();
        let region = match cached {
            Some(region) => region,
            None => {
                let location = self.client
                    .get_bucket_location()
                    .bucket(bucket_name)
                    .send()
                    .await
                    .map_err(store_error)?;
                let region = region_for_location(location.location_constraint().map(|c| c.as_str()));
                debug!("Bucket {bucket_name} lives in {region}");
                self.bucket_regions
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(bucket_name.to_owned(), region.clone());
                region
            }
        };

        let mut clients = self.regional_clients.lock().unwrap_or_else(PoisonError::into_inner);
        let client = clients
            .entry(region)
            .or_insert_with_key(|region| client::regional_client(&self.config, region));
        Ok(client.clone())
    }
}

#[async_trait]
impl BucketStore for S3Store {
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let output = self.client.list_buckets().send().await.map_err(store_error)?;
        Ok(output.buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_owned))
            .collect())
    }

    async fn versioning_status(&self, bucket_name: &str) -> Result<VersioningStatus, StoreError> {
        let client = self.client_for(bucket_name).await?;
        let output = client
            .get_bucket_versioning()
            .bucket(bucket_name)
            .send()
            .await
            .map_err(store_error)?;
        Ok(versioning_status(output.status()))
    }

    async fn list_object_versions_page(
        &self,
        bucket_name: &str,
        token: Option<PageToken>,
    ) -> Result<Page<ObjectVersion>, StoreError> {
        let client = self.client_for(bucket_name).await?;
        let (key_marker, version_id_marker) = match token {
            Some(token) => (Some(token.marker), token.version_marker),
            None => (None, None),
        };
        let output = client
            .list_object_versions()
            .bucket(bucket_name)
            .set_key_marker(key_marker)
            .set_version_id_marker(version_id_marker)
            .send()
            .await
            .map_err(store_error)?;

        let versions = output.versions().iter().filter_map(|v| {
            v.key().map(|key| ObjectVersion::new(key, v.version_id().unwrap_or(NULL_VERSION)))
        });
        let markers = output.delete_markers().iter().filter_map(|m| {
            m.key().map(|key| ObjectVersion::delete_marker(key, m.version_id().unwrap_or(NULL_VERSION)))
        });
        let items = versions.chain(markers).collect();

        let next = next_versions_token(
            output.is_truncated().unwrap_or_default(),
            output.next_key_marker(),
            output.next_version_id_marker(),
        );
        Ok(Page { items, next })
    }

    async fn delete_object_version(&self, bucket_name: &str, version: &ObjectVersion) -> Result<(), StoreError> {
        let client = self.client_for(bucket_name).await?;
        client
            .delete_object()
            .bucket(bucket_name)
            .key(&version.key)
            .version_id(&version.version_id)
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn list_objects_page(&self, bucket_name: &str, token: Option<PageToken>) -> Result<Page<String>, StoreError> {
        let client = self.client_for(bucket_name).await?;
        let output = client
            .list_objects_v2()
            .bucket(bucket_name)
            .set_continuation_token(token.map(|token| token.marker))
            .send()
            .await
            .map_err(store_error)?;

        let items = output.contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_owned))
            .collect();
        let next = next_objects_token(output.is_truncated().unwrap_or_default(), output.next_continuation_token());
        Ok(Page { items, next })
    }

    async fn delete_objects(&self, bucket_name: &str, keys: KeyStream<'_>) -> Result<usize, StoreError> {
        let client = self.client_for(bucket_name).await?;
        let batches = delete_batches(keys);
        pin_mut!(batches);

        let mut deleted = 0;
        while let Some(batch) = batches.try_next().await? {
            let output = client
                .delete_objects()
                .bucket(bucket_name)
                .delete(delete_request(&batch)?)
                .send()
                .await
                .map_err(store_error)?;
            deleted += batch.len();
            debug!("Sent delete for {} objects of {bucket_name}", batch.len());

            // per-key failures come back in a successful response
            for err in output.errors() {
                warn!(
                    "  Could not delete {}/{}: {} {}",
                    bucket_name,
                    err.key().unwrap_or_default(),
                    err.code().unwrap_or_default(),
                    err.message().unwrap_or_default()
                );
            }
        }
        Ok(deleted)
    }

    async fn delete_bucket(&self, bucket_name: &str) -> Result<(), StoreError> {
        let client = self.client_for(bucket_name).await?;
        client.delete_bucket().bucket(bucket_name).send().await.map_err(store_error)?;
        Ok(())
    }
}


/// group keys into DeleteObjects-sized batches as the listing produces them
fn delete_batches<S>(keys: S) -> impl Stream<Item = Result<Vec<String>, StoreError>>
where
    S: Stream<Item = Result<String, StoreError>>,
{
    keys.try_chunks(MAX_DELETE_BATCH).map_err(|TryChunksError(_, err)| err)
}

/// quiet-mode delete of one batch; quiet responses only list the keys that failed
fn delete_request(batch: &[String]) -> Result<Delete, StoreError> {
    let objects = batch
        .iter()
        .map(|key| ObjectIdentifier::builder().key(key).build())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| StoreError::Request(err.to_string()))?;
    Delete::builder()
        .set_objects(Some(objects))
        .quiet(true)
        .build()
        .map_err(|err| StoreError::Request(err.to_string()))
}

/// a marker on an untruncated listing is ignored; some S3-compatible stores send one anyway
fn next_versions_token(truncated: bool, key_marker: Option<&str>, version_marker: Option<&str>) -> Option<PageToken> {
    if !truncated {
        return None;
    }
    key_marker.map(|marker| PageToken {
        marker: marker.to_owned(),
        version_marker: version_marker.map(str::to_owned),
    })
}

fn next_objects_token(truncated: bool, continuation_token: Option<&str>) -> Option<PageToken> {
    continuation_token.filter(|_| truncated).map(PageToken::new)
}

/// classify an SDK failure
fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service) => service_error(service.err().code(), service.err().message()),
        SdkError::ConstructionFailure(_) => StoreError::Request(DisplayErrorContext(&err).to_string()),
        _ => StoreError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

fn service_error(code: Option<&str>, message: Option<&str>) -> StoreError {
    let code = code.unwrap_or("Unknown");
    let message = message.unwrap_or_default().to_owned();
    match code {
        "NoSuchBucket" => StoreError::NoSuchBucket,
        code if AUTH_ERROR_CODES.contains(&code) => StoreError::Auth { code: code.to_owned(), message },
        code => StoreError::Service { code: code.to_owned(), message },
    }
}

fn versioning_status(status: Option<&BucketVersioningStatus>) -> VersioningStatus {
    match status {
        Some(BucketVersioningStatus::Enabled) => VersioningStatus::Enabled,
        Some(BucketVersioningStatus::Suspended) => VersioningStatus::Suspended,
        _ => VersioningStatus::Unset,
    }
}

/// GetBucketLocation answers with an empty constraint for us-east-1 and `EU` for old eu-west-1 buckets
fn region_for_location(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => FALLBACK_REGION.to_owned(),
        Some("EU") => "eu-west-1".to_owned(),
        Some(region) => region.to_owned(),
    }
}
