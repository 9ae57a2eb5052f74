//! State backends: where a Terraform state document is fetched from.

pub mod http;
pub mod local;
mod lock;
pub mod s3;

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::providers::strip_nulls;
use crate::terraform::state::{BackendDescriptor, State, StateError};

pub use http::{HttpBackend, HttpConfig};
pub use local::{LocalBackend, LocalConfig};
pub use lock::LockInfo;
pub use s3::{S3Backend, S3Config};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend configuration error: {0}")]
    Configuration(String),

    #[error("unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} request failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} request to {url} returned {status}")]
    Status {
        operation: &'static str,
        url: String,
        status: u16,
    },

    #[error("state is locked{}", lock_holder(.holder))]
    Locked { holder: Option<String> },

    #[error("failed to release state lock: {0}")]
    Unlock(Box<BackendError>),

    #[error("object storage error: {0}")]
    S3(String),

    #[error(transparent)]
    Decode(#[from] StateError),
}

fn lock_holder(holder: &Option<String>) -> String {
    holder
        .as_ref()
        .map(|h| format!(" by {}", h))
        .unwrap_or_default()
}

impl BackendError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A place a raw state document can be fetched from.
#[async_trait]
pub trait StateBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the raw state bytes.
    async fn fetch(&self) -> BackendResult<Vec<u8>>;

    /// Fetch and decode the state document.
    async fn read_state(&self) -> BackendResult<State> {
        let bytes = self.fetch().await?;
        tracing::info!(backend = self.name(), bytes = bytes.len(), "state fetched");
        Ok(State::from_slice(&bytes)?)
    }
}

/// Construct the backend a descriptor names.
///
/// `project_dir` anchors relative paths of the local backend.
pub async fn new_backend(
    descriptor: &BackendDescriptor,
    project_dir: &Path,
) -> BackendResult<Box<dyn StateBackend>> {
    match descriptor.backend_type.as_str() {
        "" => Err(BackendError::configuration("backend type is empty")),
        "local" => Ok(Box::new(LocalBackend::open(
            decode_config(descriptor)?,
            project_dir,
        )?)),
        "http" => Ok(Box::new(HttpBackend::new(decode_config(descriptor)?)?)),
        "s3" => Ok(Box::new(S3Backend::new(decode_config(descriptor)?).await?)),
        other => Err(BackendError::UnsupportedBackend(other.to_string())),
    }
}

/// Decode a backend's config block loosely: unknown keys are ignored and
/// missing keys keep their default.
fn decode_config<T: DeserializeOwned>(descriptor: &BackendDescriptor) -> BackendResult<T> {
    let config = strip_nulls(&serde_json::Value::Object(descriptor.config.clone()));
    serde_json::from_value(config).map_err(|e| {
        BackendError::configuration(format!(
            "invalid {} backend config: {}",
            descriptor.backend_type, e
        ))
    })
}
