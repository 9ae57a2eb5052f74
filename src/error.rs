use thiserror::Error;

use crate::backends::BackendError;
use crate::providers::ProviderError;
use crate::providers::cloudflare::CloudflareError;
use crate::terraform::module::ModuleError;
use crate::terraform::state::StateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("module error: {0}")]
    Module(#[from] ModuleError),

    #[error("cloudflare error: {0}")]
    Cloudflare(#[from] CloudflareError),
}
