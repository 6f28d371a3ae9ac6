use std::collections::HashSet;

/// Buckets of this account that are never reaped.
pub const DEFAULT_KEEP_LIST: &[&str] = &[
    "cdk-hnb659fds-assets-150192942682-us-east-1",
    "cdk-hnb659fds-assets-150192942682-us-east-2",
    "cf-templates-13b68qyq6c213-us-east-1",
    "cloudtrail-awslogs-150192942682-cixuj50q-isengard-do-not-delete",
    "do-not-delete-gatedgarden-audit-150192942682",
];

/// Immutable set of bucket names to keep. Matching is exact string equality.
#[derive(Debug, Clone)]
pub struct KeepList {
    names: HashSet<String>,
}

impl KeepList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect() }
    }

    pub fn contains(&self, bucket_name: &str) -> bool {
        self.names.contains(bucket_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for KeepList {
    fn default() -> Self {
        Self::new(DEFAULT_KEEP_LIST.iter().copied())
    }
}
