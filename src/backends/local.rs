use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::{BackendError, BackendResult, StateBackend};

pub const DEFAULT_STATE_FILE: &str = "terraform.tfstate";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// State file path, relative to the project directory unless absolute.
    pub path: String,
}

/// Reads state from a file opened when the backend is constructed.
#[derive(Debug)]
pub struct LocalBackend {
    path: PathBuf,
    file: File,
}

impl LocalBackend {
    pub fn open(config: LocalConfig, project_dir: &Path) -> BackendResult<Self> {
        let path = if config.path.is_empty() {
            project_dir.join(DEFAULT_STATE_FILE)
        } else {
            project_dir.join(&config.path)
        };

        let file = File::open(&path).map_err(|source| BackendError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self::from_file(path, file))
    }

    pub fn from_file(path: PathBuf, file: File) -> Self {
        Self { path, file }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self) -> BackendResult<Vec<u8>> {
        tracing::debug!(path = %self.path.display(), "reading local state");

        let io_error = |source| BackendError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = &self.file;
        file.rewind().map_err(io_error)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(io_error)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_default_state_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terraform.tfstate"), br#"{"version": 4}"#).unwrap();

        let backend = LocalBackend::open(LocalConfig::default(), dir.path()).unwrap();
        assert_eq!(backend.path(), dir.path().join("terraform.tfstate"));

        let state = backend.read_state().await.unwrap();
        assert_eq!(state.version, 4);
    }

    #[tokio::test]
    async fn test_path_key_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("envs")).unwrap();
        std::fs::write(dir.path().join("envs/prod.tfstate"), b"raw bytes").unwrap();

        let config = LocalConfig {
            path: "envs/prod.tfstate".to_string(),
        };
        let backend = LocalBackend::open(config, dir.path()).unwrap();
        assert_eq!(backend.fetch().await.unwrap(), b"raw bytes");
    }

    #[tokio::test]
    async fn test_repeated_fetch_reads_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terraform.tfstate"), br#"{"version": 4}"#).unwrap();

        let backend = LocalBackend::open(LocalConfig::default(), dir.path()).unwrap();
        let first = backend.fetch().await.unwrap();
        let second = backend.fetch().await.unwrap();
        assert_eq!(first, br#"{"version": 4}"#);
        assert_eq!(second, first);

        assert_eq!(backend.read_state().await.unwrap().version, 4);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalBackend::open(LocalConfig::default(), dir.path());
        match result {
            Err(BackendError::Io { path, .. }) => assert!(path.ends_with("terraform.tfstate")),
            _ => panic!("expected Io error"),
        }
    }

    #[tokio::test]
    async fn test_malformed_state_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("terraform.tfstate"), b"not json").unwrap();

        let backend = LocalBackend::open(LocalConfig::default(), dir.path()).unwrap();
        assert!(matches!(
            backend.read_state().await,
            Err(BackendError::Decode(_))
        ));
    }
}
