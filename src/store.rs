use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::StoreError;

/// Versioning setting of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningStatus {
    Enabled,
    Suspended,
    /// versioning was never configured for the bucket
    Unset,
}

impl VersioningStatus {
    /// Only `Enabled` keeps old versions around; suspended buckets are emptied like unversioned ones.
    pub fn is_enabled(self) -> bool {
        self == VersioningStatus::Enabled
    }
}

/// One revision of an object key in a versioned bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    /// `"null"` for objects written before versioning was enabled
    pub version_id: String,
    pub is_delete_marker: bool,
}

impl ObjectVersion {
    pub fn new(key: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self { key: key.into(), version_id: version_id.into(), is_delete_marker: false }
    }

    pub fn delete_marker(key: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self { key: key.into(), version_id: version_id.into(), is_delete_marker: true }
    }
}

/// Position of the next page of a listing. The store decides what the markers mean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageToken {
    pub marker: String,
    pub version_marker: Option<String>,
}

impl PageToken {
    pub fn new(marker: impl Into<String>) -> Self {
        Self { marker: marker.into(), version_marker: None }
    }
}

/// One page of a listing; `next` is `None` on the last page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageToken>,
}

/// Keys handed to a bulk delete, pulled lazily from a listing.
pub type KeyStream<'a> = BoxStream<'a, Result<String, StoreError>>;

/// The object-store operations the reaper needs.
#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    async fn versioning_status(&self, bucket_name: &str) -> Result<VersioningStatus, StoreError>;

    /// Versions and delete markers, one page at a time. `None` starts at the first page.
    async fn list_object_versions_page(
        &self,
        bucket_name: &str,
        token: Option<PageToken>,
    ) -> Result<Page<ObjectVersion>, StoreError>;

    async fn delete_object_version(&self, bucket_name: &str, version: &ObjectVersion) -> Result<(), StoreError>;

    /// Keys of the current objects, one page at a time.
    async fn list_objects_page(&self, bucket_name: &str, token: Option<PageToken>) -> Result<Page<String>, StoreError>;

    /// Delete every key of the stream as one logical operation and return how many
    /// were deleted. A request goes out each time a provider-sized batch is full, so
    /// only one batch of keys is held at a time. Errors of the stream are returned as is.
    async fn delete_objects(&self, bucket_name: &str, keys: KeyStream<'_>) -> Result<usize, StoreError>;

    async fn delete_bucket(&self, bucket_name: &str) -> Result<(), StoreError>;
}
