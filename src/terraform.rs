//! Terraform project loading: backend discovery and state acquisition.

pub mod module;
pub mod state;

use std::path::{Path, PathBuf};

use crate::backends;
use crate::error::Error;
use crate::providers::ProviderRegistry;
use crate::resource::{ResourceCollection, parse_state};

use state::{BackendDescriptor, State};

/// Written by `terraform init`; records which backend the project uses.
pub const BACKEND_STATE_FILE: &str = ".terraform/terraform.tfstate";

/// A Terraform working directory.
#[derive(Debug, Clone)]
pub struct Project {
    dir: PathBuf,
}

impl Project {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Backend descriptor from `.terraform/terraform.tfstate`.
    ///
    /// A project that was never initialised against a remote backend has no
    /// such file and uses the local backend.
    pub fn backend_descriptor(&self) -> Result<BackendDescriptor, Error> {
        let path = self.dir.join(BACKEND_STATE_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no backend state file, using local backend");
            return Ok(BackendDescriptor {
                backend_type: "local".to_string(),
                ..Default::default()
            });
        }

        let bytes = std::fs::read(&path).map_err(|source| backends::BackendError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let descriptor = State::from_slice(&bytes)?.backend;
        tracing::debug!(backend = %descriptor.backend_type, "found backend descriptor");
        Ok(descriptor)
    }

    /// Fetch and decode the project's state.
    pub async fn read_state(&self) -> Result<State, Error> {
        let descriptor = self.backend_descriptor()?;
        let backend = backends::new_backend(&descriptor, &self.dir).await?;
        Ok(backend.read_state().await?)
    }

    /// Fetch the project's state and resolve every resource instance.
    pub async fn load_resources(
        &self,
        registry: &ProviderRegistry,
    ) -> Result<ResourceCollection, Error> {
        let state = self.read_state().await?;
        tracing::debug!(
            version = state.version,
            instances = state.instance_count(),
            "state decoded"
        );
        Ok(parse_state(&state, registry)?)
    }
}
