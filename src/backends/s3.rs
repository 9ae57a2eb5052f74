use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use serde::Deserialize;
use url::Url;

use super::{BackendError, BackendResult, StateBackend};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub bucket: String,
    pub key: String,
    pub region: String,
    /// Custom S3-compatible endpoint; switches to path-style addressing.
    pub endpoint: String,
    /// `s3://bucket/path/to/key`, an alternative to `bucket` + `key`.
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

impl S3Location {
    pub fn from_config(config: &S3Config) -> BackendResult<Self> {
        if !config.bucket.is_empty() || !config.key.is_empty() {
            return Self::new(&config.bucket, &config.key);
        }
        if config.address.is_empty() {
            return Err(BackendError::configuration(
                "s3 backend requires bucket and key, or an s3:// address",
            ));
        }
        Self::parse(&config.address)
    }

    /// Parse `s3://bucket/path/to/key`.
    pub fn parse(address: &str) -> BackendResult<Self> {
        let url = Url::parse(address).map_err(|e| {
            BackendError::configuration(format!("invalid s3 address {:?}: {}", address, e))
        })?;
        if url.scheme() != "s3" {
            return Err(BackendError::configuration(format!(
                "s3 address must use the s3:// scheme, got {:?}",
                address
            )));
        }
        let key = urlencoding::decode(url.path().trim_start_matches('/')).map_err(|e| {
            BackendError::configuration(format!("invalid s3 key in {:?}: {}", address, e))
        })?;
        Self::new(url.host_str().unwrap_or_default(), &key)
    }

    fn new(bucket: &str, key: &str) -> BackendResult<Self> {
        if bucket.is_empty() {
            return Err(BackendError::configuration("s3 backend requires a bucket"));
        }
        if key.is_empty() {
            return Err(BackendError::configuration("s3 backend requires a key"));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

/// Downloads the state object into memory.
pub struct S3Backend {
    client: Client,
    location: S3Location,
}

impl S3Backend {
    pub async fn new(config: S3Config) -> BackendResult<Self> {
        let location = S3Location::from_config(&config)?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if !config.region.is_empty() {
            loader = loader.region(Region::new(config.region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if !config.endpoint.is_empty() {
            builder = builder
                .endpoint_url(config.endpoint.clone())
                .force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            location,
        })
    }

    pub fn location(&self) -> &S3Location {
        &self.location
    }
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("location", &self.location)
            .finish()
    }
}

#[async_trait]
impl StateBackend for S3Backend {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn fetch(&self) -> BackendResult<Vec<u8>> {
        let S3Location { bucket, key } = &self.location;
        tracing::debug!(%bucket, %key, "downloading state object");

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                BackendError::S3(format!(
                    "get s3://{}/{}: {}",
                    bucket,
                    key,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BackendError::S3(format!("read s3://{}/{}: {}", bucket, key, e)))?;

        Ok(body.into_bytes().to_vec())
    }
}
