//! cf-tf-diff - Terraform state acquisition and Cloudflare resource normalization.
//!
//! Fetches a project's state from its configured backend, decodes it, and
//! resolves every resource instance into a typed Cloudflare record.

pub mod backends;
pub mod error;
pub mod output;
pub mod providers;
pub mod resource;
pub mod terraform;

pub use error::Error;
pub use providers::ProviderRegistry;
pub use providers::cloudflare::{CloudflareClient, CloudflareError};
pub use resource::{ParsedInstance, ResourceCollection, parse_state};
pub use terraform::Project;
