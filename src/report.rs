use serde::Serialize;

use crate::error::StoreError;

/// What happened to a single bucket during a run.
#[derive(Debug)]
pub enum Outcome {
    /// on the keep-list, not touched
    Kept,
    /// emptied and deleted; `purged` counts removed versions or objects
    Deleted { purged: usize },
    /// the bucket disappeared while it was processed
    Vanished { purged: usize },
    /// emptied, but the final bucket delete was refused
    DeleteFailed { purged: usize, error: StoreError },
}

impl Outcome {
    pub fn purged(&self) -> usize {
        match self {
            Outcome::Kept => 0,
            Outcome::Deleted { purged } | Outcome::Vanished { purged } | Outcome::DeleteFailed { purged, .. } => *purged,
        }
    }
}

#[derive(Debug)]
pub struct BucketReport {
    pub bucket: String,
    pub outcome: Outcome,
}

/// Per-bucket outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct ReapReport {
    pub buckets: Vec<BucketReport>,
}

impl ReapReport {
    pub fn push(&mut self, bucket: impl Into<String>, outcome: Outcome) {
        self.buckets.push(BucketReport { bucket: bucket.into(), outcome });
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &StoreError)> {
        self.buckets.iter().filter_map(|b| match &b.outcome {
            Outcome::DeleteFailed { error, .. } => Some((b.bucket.as_str(), error)),
            _ => None,
        })
    }

    pub fn summary(&self) -> ReapSummary {
        let mut summary = ReapSummary::default();
        for b in &self.buckets {
            summary.purged += b.outcome.purged();
            match &b.outcome {
                Outcome::Kept => summary.kept.push(b.bucket.clone()),
                Outcome::Deleted { .. } => summary.deleted.push(b.bucket.clone()),
                Outcome::Vanished { .. } => summary.vanished.push(b.bucket.clone()),
                Outcome::DeleteFailed { error, .. } => summary.failed.push(FailedBucket {
                    bucket: b.bucket.clone(),
                    error: error.to_string(),
                }),
            }
        }
        summary
    }
}

/// Serializable digest of a [`ReapReport`].
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ReapSummary {
    pub kept: Vec<String>,
    pub deleted: Vec<String>,
    pub vanished: Vec<String>,
    pub failed: Vec<FailedBucket>,
    /// total number of removed object versions and objects
    pub purged: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FailedBucket {
    pub bucket: String,
    pub error: String,
}
