use thiserror::Error;

/// Failure of a single call against the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// credentials were rejected or lack the permission for the call
    #[error("authorization failed ({code}): {message}")]
    Auth { code: String, message: String },

    /// the request never got a usable response (timeout, connection, malformed reply)
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("the bucket does not exist")]
    NoSuchBucket,

    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// the request could not be built locally
    #[error("invalid request: {0}")]
    Request(String),
}

/// Errors that abort a reaper run.
#[derive(Debug, Error)]
pub enum ReapError {
    #[error("listing buckets failed: {0}")]
    ListBuckets(#[source] StoreError),

    /// emptying a bucket failed; the remaining buckets are not processed
    #[error("emptying bucket {bucket} failed: {source}")]
    Purge {
        bucket: String,
        #[source]
        source: StoreError,
    },
}
