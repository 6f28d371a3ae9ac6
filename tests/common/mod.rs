//! In-memory `BucketStore` that records every call it receives.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bucket_reaper::{BucketStore, KeyStream, ObjectVersion, Page, PageToken, StoreError, VersioningStatus};
use futures::TryStreamExt;

/// listings are served in pages of this size to exercise pagination
pub const PAGE_SIZE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListBuckets,
    VersioningStatus(String),
    ListObjectVersions(String),
    DeleteObjectVersion(String, String, String),
    ListObjects(String),
    DeleteObjects(String, Vec<String>),
    DeleteBucket(String),
}

impl Call {
    /// bucket the call refers to, `None` for the account-wide listing
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Call::ListBuckets => None,
            Call::VersioningStatus(b)
            | Call::ListObjectVersions(b)
            | Call::DeleteObjectVersion(b, _, _)
            | Call::ListObjects(b)
            | Call::DeleteObjects(b, _)
            | Call::DeleteBucket(b) => Some(b.as_str()),
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, Call::DeleteObjectVersion(..) | Call::DeleteObjects(..) | Call::DeleteBucket(..))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeBucket {
    pub name: String,
    pub status: VersioningStatus,
    pub objects: Vec<String>,
    pub versions: Vec<ObjectVersion>,
}

impl FakeBucket {
    pub fn plain(name: &str, objects: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            status: VersioningStatus::Unset,
            objects: objects.iter().map(|k| k.to_string()).collect(),
            versions: Vec::new(),
        }
    }

    pub fn versioned(name: &str, versions: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_owned(),
            status: VersioningStatus::Enabled,
            objects: Vec::new(),
            versions: versions.iter().map(|(k, v)| ObjectVersion::new(*k, *v)).collect(),
        }
    }

    pub fn with_status(mut self, status: VersioningStatus) -> Self {
        self.status = status;
        self
    }

    fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.versions.is_empty()
    }
}

#[derive(Debug, Default)]
struct Account {
    buckets: Vec<FakeBucket>,
    calls: Vec<Call>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    account: Mutex<Account>,
    fail_listing: bool,
    refuse_bucket_delete: HashSet<String>,
    fail_object_deletes: HashSet<String>,
    // buckets that disappear right after they have been listed
    vanishing: HashSet<String>,
    // buckets that disappear once this many of their versions have been deleted
    vanishing_after_version_deletes: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new(buckets: Vec<FakeBucket>) -> Self {
        Self { account: Mutex::new(Account { buckets, calls: Vec::new() }), ..Default::default() }
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn refusing_delete_of(mut self, bucket_name: &str) -> Self {
        self.refuse_bucket_delete.insert(bucket_name.to_owned());
        self
    }

    pub fn failing_object_deletes_in(mut self, bucket_name: &str) -> Self {
        self.fail_object_deletes.insert(bucket_name.to_owned());
        self
    }

    pub fn vanishing(mut self, bucket_name: &str) -> Self {
        self.vanishing.insert(bucket_name.to_owned());
        self
    }

    pub fn vanishing_after_version_deletes(mut self, bucket_name: &str, deletes: usize) -> Self {
        self.vanishing_after_version_deletes.insert(bucket_name.to_owned(), deletes);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.account.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.account.lock().unwrap().calls.clear();
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.account.lock().unwrap().buckets.iter().map(|b| b.name.clone()).collect()
    }

    pub fn bucket(&self, name: &str) -> Option<FakeBucket> {
        self.account.lock().unwrap().buckets.iter().find(|b| b.name == name).cloned()
    }

    fn record(&self, call: Call) {
        self.account.lock().unwrap().calls.push(call);
    }

    fn with_bucket<T>(&self, name: &str, f: impl FnOnce(&mut FakeBucket) -> T) -> Result<T, StoreError> {
        let mut account = self.account.lock().unwrap();
        account.buckets.iter_mut().find(|b| b.name == name).map(f).ok_or(StoreError::NoSuchBucket)
    }
}

fn page_of<T: Clone>(items: &[T], token: Option<PageToken>) -> Page<T> {
    let start = token.map(|t| t.marker.parse::<usize>().unwrap()).unwrap_or(0);
    let end = (start + PAGE_SIZE).min(items.len());
    let next = (end < items.len()).then(|| PageToken::new(end.to_string()));
    Page { items: items[start..end].to_vec(), next }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        self.record(Call::ListBuckets);
        if self.fail_listing {
            return Err(StoreError::Auth { code: "InvalidAccessKeyId".to_owned(), message: "unknown key".to_owned() });
        }
        let names = self.bucket_names();
        // simulate a concurrent actor removing buckets after our listing
        self.account.lock().unwrap().buckets.retain(|b| !self.vanishing.contains(&b.name));
        Ok(names)
    }

    async fn versioning_status(&self, bucket_name: &str) -> Result<VersioningStatus, StoreError> {
        self.record(Call::VersioningStatus(bucket_name.to_owned()));
        self.with_bucket(bucket_name, |b| b.status)
    }

    async fn list_object_versions_page(
        &self,
        bucket_name: &str,
        token: Option<PageToken>,
    ) -> Result<Page<ObjectVersion>, StoreError> {
        self.record(Call::ListObjectVersions(bucket_name.to_owned()));
        // like S3, the markers name the last (key, version) served; deleting what was
        // already listed does not shift the next page
        let after = token.map(|t| (t.marker, t.version_marker.unwrap_or_default()));
        self.with_bucket(bucket_name, |b| {
            let mut rest: Vec<ObjectVersion> = b
                .versions
                .iter()
                .filter(|v| match &after {
                    Some((key, id)) => (&v.key, &v.version_id) > (key, id),
                    None => true,
                })
                .cloned()
                .collect();
            rest.sort_by(|x, y| (&x.key, &x.version_id).cmp(&(&y.key, &y.version_id)));

            let more = rest.len() > PAGE_SIZE;
            rest.truncate(PAGE_SIZE);
            let next = match rest.last() {
                Some(last) if more => Some(PageToken {
                    marker: last.key.clone(),
                    version_marker: Some(last.version_id.clone()),
                }),
                _ => None,
            };
            Page { items: rest, next }
        })
    }

    async fn delete_object_version(&self, bucket_name: &str, version: &ObjectVersion) -> Result<(), StoreError> {
        self.record(Call::DeleteObjectVersion(bucket_name.to_owned(), version.key.clone(), version.version_id.clone()));
        if self.fail_object_deletes.contains(bucket_name) {
            return Err(StoreError::Transport("connection reset by peer".to_owned()));
        }
        // deleting a version that is already gone succeeds
        self.with_bucket(bucket_name, |b| b.versions.retain(|v| v != version))?;

        if let Some(&limit) = self.vanishing_after_version_deletes.get(bucket_name) {
            let mut account = self.account.lock().unwrap();
            let deletes = account
                .calls
                .iter()
                .filter(|c| matches!(c, Call::DeleteObjectVersion(b, _, _) if b == bucket_name))
                .count();
            if deletes >= limit {
                account.buckets.retain(|b| b.name != bucket_name);
            }
        }
        Ok(())
    }

    async fn list_objects_page(&self, bucket_name: &str, token: Option<PageToken>) -> Result<Page<String>, StoreError> {
        self.record(Call::ListObjects(bucket_name.to_owned()));
        self.with_bucket(bucket_name, |b| page_of(&b.objects, token))
    }

    async fn delete_objects(&self, bucket_name: &str, keys: KeyStream<'_>) -> Result<usize, StoreError> {
        // one logical call is recorded with the full key set; nothing is sent for an empty listing
        let keys: Vec<String> = keys.try_collect().await?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.record(Call::DeleteObjects(bucket_name.to_owned(), keys.clone()));
        if self.fail_object_deletes.contains(bucket_name) {
            return Err(StoreError::Transport("connection reset by peer".to_owned()));
        }
        self.with_bucket(bucket_name, |b| b.objects.retain(|k| !keys.contains(k)))?;
        Ok(keys.len())
    }

    async fn delete_bucket(&self, bucket_name: &str) -> Result<(), StoreError> {
        self.record(Call::DeleteBucket(bucket_name.to_owned()));
        if self.refuse_bucket_delete.contains(bucket_name) {
            return Err(StoreError::Service {
                code: "AccessDenied".to_owned(),
                message: "bucket is protected by a deny policy".to_owned(),
            });
        }
        let mut account = self.account.lock().unwrap();
        let idx = account.buckets.iter().position(|b| b.name == bucket_name).ok_or(StoreError::NoSuchBucket)?;
        if !account.buckets[idx].is_empty() {
            return Err(StoreError::Service {
                code: "BucketNotEmpty".to_owned(),
                message: "The bucket you tried to delete is not empty".to_owned(),
            });
        }
        account.buckets.remove(idx);
        Ok(())
    }
}
