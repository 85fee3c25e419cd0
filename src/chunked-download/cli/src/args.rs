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

use chunked_download::{
    ChunkNaming, Credentials, DEFAULT_CHUNK_SIZE, FileChunkSink, HttpRangeFetcher,
    TransferError, TransferRequest,
};
use clap::Parser;
use humantime::parse_duration;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration options for the download.
///
/// Every option can also be set using an environment variable.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = super::DESCRIPTION)]
pub struct Args {
    /// The object store endpoint.
    ///
    /// Objects are fetched from `{endpoint}/{bucket}/{object}`.
    #[arg(long, env = "STORAGE_ENDPOINT", default_value = "https://s3.amazonaws.com")]
    pub endpoint: String,

    /// The bucket containing the object.
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket: Option<String>,

    /// The key of the object to download.
    #[arg(long, env = "OBJECT_KEY")]
    pub object: Option<String>,

    /// The size of each range request, for example `20MiB` or `512KB`.
    #[arg(long, env = "CHUNK_SIZE", value_parser = parse_chunk_size, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,

    /// The directory for the chunk files.
    #[arg(long, env = "OUTPUT_DIR", default_value = "./tmp")]
    pub output_dir: PathBuf,

    /// The name of each chunk file, `{ordinal}` is replaced by the chunk number.
    #[arg(long, env = "CHUNK_NAME_TEMPLATE", default_value = "chunk_{ordinal}")]
    pub name_template: String,

    /// A bearer token sent with each request.
    #[arg(long, env = "STORAGE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Send requests without credentials, for public objects.
    #[arg(long, default_value_t = false, conflicts_with = "access_token")]
    pub anonymous: bool,

    /// Abort the download if a single range request takes longer than this.
    #[arg(long, env = "FETCH_TIMEOUT", value_parser = parse_duration)]
    pub fetch_timeout: Option<Duration>,

    /// Abort the download after this many chunks.
    #[arg(long, env = "MAX_CHUNKS")]
    pub max_chunks: Option<u64>,

    /// The number of attempts for each range request.
    ///
    /// The default does not retry failed requests.
    #[arg(long, env = "RETRY_ATTEMPTS", default_value_t = 1)]
    pub retry_attempts: u32,
}

impl Args {
    /// Validates the arguments after parsing.
    ///
    /// Returns the transfer request, all the configuration errors are
    /// detected before any range is fetched.
    pub fn validate(&self) -> Result<TransferRequest, TransferError> {
        self.bucket()?;
        self.credentials()?;
        self.naming()?;
        if self.retry_attempts == 0 {
            return Err(TransferError::configuration(
                "the number of retry attempts should be > 0",
            ));
        }
        if self.max_chunks == Some(0) {
            return Err(TransferError::configuration(
                "the maximum number of chunks should be > 0",
            ));
        }
        if self.fetch_timeout.is_some_and(|t| t.is_zero()) {
            return Err(TransferError::configuration(
                "the fetch timeout should be greater than zero",
            ));
        }
        let object = self
            .object
            .as_deref()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| {
                TransferError::configuration("the object key is not set, use --object or OBJECT_KEY")
            })?;
        TransferRequest::new(object, self.chunk_size)
    }

    /// Creates the fetcher for the configured endpoint and bucket.
    pub fn fetcher(&self) -> Result<HttpRangeFetcher, TransferError> {
        Ok(HttpRangeFetcher::new(&self.endpoint, self.bucket()?)
            .with_credentials(self.credentials()?))
    }

    /// Creates the sink for the configured output directory.
    pub fn sink(&self) -> Result<FileChunkSink, TransferError> {
        Ok(FileChunkSink::new(&self.output_dir, self.naming()?))
    }

    pub fn credentials(&self) -> Result<Credentials, TransferError> {
        match (&self.access_token, self.anonymous) {
            (Some(token), false) if !token.is_empty() => {
                Ok(Credentials::BearerToken(token.clone()))
            }
            (None, true) => Ok(Credentials::Anonymous),
            _ => Err(TransferError::configuration(
                "missing credentials, use --access-token, STORAGE_ACCESS_TOKEN, or --anonymous",
            )),
        }
    }

    fn bucket(&self) -> Result<&str, TransferError> {
        self.bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                TransferError::configuration("the bucket name is not set, use --bucket or BUCKET_NAME")
            })
    }

    fn naming(&self) -> Result<ChunkNaming, TransferError> {
        ChunkNaming::new(self.name_template.as_str())
    }
}

fn parse_chunk_size(arg: &str) -> Result<u64, parse_size::Error> {
    parse_size::parse_size(arg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoped_env::ScopedEnv;
    use serial_test::serial;
    use test_case::test_case;

    type Result = anyhow::Result<()>;

    const ENV_VARS: [&str; 10] = [
        "STORAGE_ENDPOINT",
        "BUCKET_NAME",
        "OBJECT_KEY",
        "CHUNK_SIZE",
        "OUTPUT_DIR",
        "CHUNK_NAME_TEMPLATE",
        "STORAGE_ACCESS_TOKEN",
        "FETCH_TIMEOUT",
        "MAX_CHUNKS",
        "RETRY_ATTEMPTS",
    ];

    fn clean_env() -> Vec<ScopedEnv<&'static str>> {
        ENV_VARS.into_iter().map(ScopedEnv::remove).collect()
    }

    #[test]
    #[serial]
    fn defaults() -> Result {
        let _env = clean_env();
        let args = Args::try_parse_from([
            "program",
            "--bucket=test-bucket",
            "--object=media/episode-01.mp3",
            "--anonymous",
        ])?;
        let request = args.validate()?;
        assert_eq!(request.object_id(), "media/episode-01.mp3");
        assert_eq!(request.chunk_size(), 20 * 1024 * 1024);
        assert_eq!(args.endpoint, "https://s3.amazonaws.com");
        assert_eq!(args.output_dir, PathBuf::from("./tmp"));
        assert_eq!(args.fetch_timeout, None);
        assert_eq!(args.max_chunks, None);
        assert_eq!(args.retry_attempts, 1);
        assert!(matches!(args.credentials()?, Credentials::Anonymous));
        assert_eq!(args.sink()?.path(3), PathBuf::from("./tmp/chunk_3"));
        Ok(())
    }

    #[test]
    #[serial]
    fn from_environment() -> Result {
        let _env = clean_env();
        let _e = [
            ScopedEnv::set("STORAGE_ENDPOINT", "http://localhost:9000"),
            ScopedEnv::set("BUCKET_NAME", "env-bucket"),
            ScopedEnv::set("OBJECT_KEY", "env-object"),
            ScopedEnv::set("CHUNK_SIZE", "1MiB"),
            ScopedEnv::set("OUTPUT_DIR", "/tmp/output"),
            ScopedEnv::set("CHUNK_NAME_TEMPLATE", "tmp_{ordinal}.mp3"),
            ScopedEnv::set("STORAGE_ACCESS_TOKEN", "env-token"),
            ScopedEnv::set("FETCH_TIMEOUT", "30s"),
            ScopedEnv::set("MAX_CHUNKS", "100"),
            ScopedEnv::set("RETRY_ATTEMPTS", "5"),
        ];
        let args = Args::try_parse_from(["program"])?;
        let request = args.validate()?;
        assert_eq!(request.object_id(), "env-object");
        assert_eq!(request.chunk_size(), 1024 * 1024);
        assert_eq!(args.bucket.as_deref(), Some("env-bucket"));
        assert_eq!(args.fetch_timeout, Some(Duration::from_secs(30)));
        assert_eq!(args.max_chunks, Some(100));
        assert_eq!(args.retry_attempts, 5);
        assert!(matches!(args.credentials()?, Credentials::BearerToken(t) if t == "env-token"));
        assert_eq!(
            args.fetcher()?.object_url("env-object"),
            "http://localhost:9000/env-bucket/env-object"
        );
        assert_eq!(
            args.sink()?.path(0),
            PathBuf::from("/tmp/output/tmp_0.mp3")
        );
        Ok(())
    }

    #[test]
    #[serial]
    fn flags_override_environment() -> Result {
        let _env = clean_env();
        let _e = ScopedEnv::set("BUCKET_NAME", "env-bucket");
        let args = Args::try_parse_from([
            "program",
            "--bucket=flag-bucket",
            "--object=o",
            "--anonymous",
        ])?;
        assert_eq!(args.bucket.as_deref(), Some("flag-bucket"));
        Ok(())
    }

    #[test_case("42", 42)]
    #[test_case("1KiB", 1024)]
    #[test_case("512KB", 512_000)]
    #[test_case("20MiB", 20 * 1024 * 1024)]
    #[test_case("20MB", 20_000_000)]
    #[serial]
    fn chunk_size(input: &str, want: u64) -> Result {
        let _env = clean_env();
        let args = Args::try_parse_from([
            "program",
            "--bucket=b",
            "--object=o",
            "--anonymous",
            "--chunk-size",
            input,
        ])?;
        assert_eq!(args.chunk_size, want);
        Ok(())
    }

    #[test_case(&["program", "--object=o", "--anonymous"]; "missing bucket")]
    #[test_case(&["program", "--bucket=", "--object=o", "--anonymous"]; "empty bucket")]
    #[test_case(&["program", "--bucket=b", "--anonymous"]; "missing object")]
    #[test_case(&["program", "--bucket=b", "--object=o"]; "missing credentials")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--access-token="]; "empty token")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--chunk-size=0"]; "zero chunk size")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--name-template=chunk"]; "bad template")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--retry-attempts=0"]; "zero attempts")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--max-chunks=0"]; "zero max chunks")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--fetch-timeout=0s"]; "zero timeout")]
    #[serial]
    fn validate_errors(input: &[&str]) -> Result {
        let _env = clean_env();
        let args = Args::try_parse_from(input)?;
        let err = args.validate().expect_err("invalid configuration should fail");
        assert!(err.is_configuration(), "{err:?} {args:?}");
        Ok(())
    }

    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--access-token=t"]; "conflicting credentials")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--chunk-size=lots"]; "bad chunk size")]
    #[test_case(&["program", "--bucket=b", "--object=o", "--anonymous", "--fetch-timeout=soon"]; "bad timeout")]
    #[serial]
    fn parse_errors(input: &[&str]) {
        let _env = clean_env();
        let got = Args::try_parse_from(input);
        assert!(got.is_err(), "{got:?}");
    }
}
