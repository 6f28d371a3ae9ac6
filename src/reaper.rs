use futures::{pin_mut, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::error::{ReapError, StoreError};
use crate::keep_list::KeepList;
use crate::pages;
use crate::report::{Outcome, ReapReport};
use crate::store::BucketStore;

/// Deletes every bucket of the account that is not on the keep-list.
///
/// Buckets are handled one after the other, in the order the store lists them.
/// Each one is emptied (all versions when versioning is enabled, the current
/// objects otherwise) and then deleted. A refused bucket delete is recorded in
/// the report and the run continues; any other failure stops the run.
#[derive(Debug)]
pub struct Reaper<S> {
    store: S,
    keep: KeepList,
}

impl<S: BucketStore> Reaper<S> {
    pub fn new(store: S, keep: KeepList) -> Self {
        Self { store, keep }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self) -> Result<ReapReport, ReapError> {
        let bucket_names = self.store.list_buckets().await.map_err(ReapError::ListBuckets)?;
        info!("Found {} buckets, {} names on the keep-list", bucket_names.len(), self.keep.len());
        if self.keep.is_empty() {
            warn!("Keep-list is empty, every bucket will be deleted");
        }

        let mut report = ReapReport::default();
        for bucket_name in bucket_names {
            if self.keep.contains(&bucket_name) {
                info!("Skipping bucket {bucket_name} (keep-list)");
                report.push(bucket_name, Outcome::Kept);
                continue;
            }
            let outcome = self.reap_bucket(&bucket_name).await?;
            report.push(bucket_name, outcome);
        }

        Ok(report)
    }

    async fn reap_bucket(&self, bucket_name: &str) -> Result<Outcome, ReapError> {
        info!("Deleting bucket {bucket_name} ...");

        let mut purged = 0;
        match self.empty_bucket(bucket_name, &mut purged).await {
            Ok(()) => {}
            Err(StoreError::NoSuchBucket) => {
                info!("Bucket {bucket_name} no longer exists");
                return Ok(Outcome::Vanished { purged });
            }
            Err(source) => {
                return Err(ReapError::Purge { bucket: bucket_name.to_owned(), source });
            }
        }

        match self.store.delete_bucket(bucket_name).await {
            Ok(()) => {
                info!("Bucket {bucket_name} deleted");
                Ok(Outcome::Deleted { purged })
            }
            Err(StoreError::NoSuchBucket) => {
                info!("Bucket {bucket_name} no longer exists");
                Ok(Outcome::Vanished { purged })
            }
            Err(error) => {
                warn!("Failed to delete bucket {bucket_name}: {error}");
                Ok(Outcome::DeleteFailed { purged, error })
            }
        }
    }

    /// Remove the contents of the bucket; `purged` counts removed versions or objects as they go.
    async fn empty_bucket(&self, bucket_name: &str, purged: &mut usize) -> Result<(), StoreError> {
        let status = self.store.versioning_status(bucket_name).await?;
        if status.is_enabled() {
            info!("  Deleting object versions from {bucket_name}");
            self.delete_versions(bucket_name, purged).await
        } else {
            info!("  Deleting objects from {bucket_name}");
            let keys = pages::object_keys(&self.store, bucket_name).boxed();
            *purged += self.store.delete_objects(bucket_name, keys).await?;
            Ok(())
        }
    }

    // one delete call per version, strictly sequential
    async fn delete_versions(&self, bucket_name: &str, purged: &mut usize) -> Result<(), StoreError> {
        let versions = pages::object_versions(&self.store, bucket_name);
        pin_mut!(versions);

        while let Some(version) = versions.try_next().await? {
            self.store.delete_object_version(bucket_name, &version).await?;
            *purged += 1;
        }
        Ok(())
    }
}
