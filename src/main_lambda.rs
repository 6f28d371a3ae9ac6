/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use bucket_reaper::ReapSummary;
use lambda_runtime::{run, service_fn, Error as LmdError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::info;


/// The payload is ignored; a scheduled EventBridge event or `{}` both start a run.
#[derive(Deserialize)]
struct Request {
}


#[derive(Serialize)]
struct Response {
    req_id: String,
    summary: ReapSummary,
}

/// Reap the account once per invocation and report what happened to each bucket.
/// A fatal error (bucket listing, emptying a bucket) fails the invocation.
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, LmdError> {
    let report = bucket_reaper::reap_account().await?;
    let summary = report.summary();
    info!(
        "Deleted {} buckets, {} failed, {} objects/versions removed",
        summary.deleted.len(),
        summary.failed.len(),
        summary.purged
    );

    Ok(Response {
        req_id: event.context.request_id,
        summary,
    })
}

//Lambda-main
#[tokio::main]
async fn main() -> Result<(), LmdError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    run(service_fn(function_handler)).await
}
