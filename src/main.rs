/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use bucket_reaper::ReapError;
use tracing::{info, warn};


/// Deletes all buckets of the account that are not on the keep-list, together with their contents.
/// There is no dry-run: every bucket that is not kept is gone after this has run.
#[tokio::main]
async fn main() -> Result<(), ReapError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disable printing the name of the module in every log line.
        .with_target(false)
        .init();

    let report = bucket_reaper::reap_account().await?;

    let summary = report.summary();
    info!(
        "Done: {} deleted, {} kept, {} already gone, {} failed, {} objects/versions removed",
        summary.deleted.len(),
        summary.kept.len(),
        summary.vanished.len(),
        summary.failed.len(),
        summary.purged
    );
    for (bucket_name, err) in report.failures() {
        warn!("Bucket {bucket_name} is still there: {err}");
    }

    Ok(())
}
