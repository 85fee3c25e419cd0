// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Download an object in chunks, writing each chunk to its own file.

mod args;

use args::Args;
use chunked_download::ChunkedDownload;
use chunked_download::retry_policy::{RetryPolicyExt, RetryableErrors};
use clap::Parser;
use tokio_util::sync::CancellationToken;

const DESCRIPTION: &str = concat!(
    "This program downloads a single object from an S3-compatible store",
    " using sequential range requests.",
    " Each range is written to its own file in the output directory."
);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    enable_tracing()?;
    let request = args.validate()?;
    tracing::info!(
        endpoint = %args.endpoint,
        bucket = args.bucket.as_deref(),
        object = request.object_id(),
        chunk_size = request.chunk_size(),
        output_dir = %args.output_dir.display(),
        "starting download"
    );

    let cancel = CancellationToken::new();
    let _interrupt = tokio::spawn(cancel_on_interrupt(cancel.clone()));

    let mut download =
        ChunkedDownload::new(args.fetcher()?, args.sink()?).with_cancellation(cancel);
    if args.retry_attempts > 1 {
        download =
            download.with_retry_policy(RetryableErrors.with_attempt_limit(args.retry_attempts));
    }
    if let Some(v) = args.fetch_timeout {
        download = download.with_fetch_timeout(v);
    }
    if let Some(v) = args.max_chunks {
        download = download.with_max_chunks(v);
    }

    let summary = download.run(&request).await?;
    tracing::info!(
        chunks = summary.chunks,
        total_length = summary.total_length,
        bytes_written = summary.bytes_written,
        "DONE"
    );
    println!(
        "downloaded {} bytes in {} chunks to {}",
        summary.total_length,
        summary.chunks,
        args.output_dir.display()
    );
    Ok(())
}

async fn cancel_on_interrupt(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("cannot listen for interrupts: {e}");
        return;
    }
    tracing::warn!("interrupted, cancelling the download");
    token.cancel();
}

fn enable_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
