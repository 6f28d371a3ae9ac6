//! Empty and delete every S3 bucket of an account that is not on a keep-list.

pub mod client;
pub mod error;
pub mod keep_list;
pub mod pages;
pub mod reaper;
pub mod report;
pub mod s3_store;
pub mod store;

pub use error::{ReapError, StoreError};
pub use keep_list::{KeepList, DEFAULT_KEEP_LIST};
pub use reaper::Reaper;
pub use report::{BucketReport, FailedBucket, Outcome, ReapReport, ReapSummary};
pub use s3_store::S3Store;
pub use store::{BucketStore, KeyStream, ObjectVersion, Page, PageToken, VersioningStatus};


/// reap the account the ambient AWS configuration points at, using the compiled-in keep-list
pub async fn reap_account() -> Result<ReapReport, ReapError> {
    let config = client::load_config().await;
    let reaper = Reaper::new(S3Store::new(config), KeepList::default());
    reaper.run().await
}
