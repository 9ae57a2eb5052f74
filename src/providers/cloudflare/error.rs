use thiserror::Error;

/// Errors from the live Cloudflare API boundary.
///
/// SECURITY: Error messages must NEVER contain the API key.
#[derive(Debug, Error)]
pub enum CloudflareError {
    #[error("cloudflare email and API key are both required")]
    MissingCredentials,

    /// Authentication failed (invalid key or email)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
