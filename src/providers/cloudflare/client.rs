use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::CloudflareError;

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const AUTH_EMAIL: HeaderName = HeaderName::from_static("x-auth-email");
const AUTH_KEY: HeaderName = HeaderName::from_static("x-auth-key");

/// Live Cloudflare API client authenticated with the global API key.
///
/// Only construction and credential verification live here.
#[derive(Clone)]
pub struct CloudflareClient {
    client: reqwest::Client,
    email: String,
    base_url: String,
}

impl CloudflareClient {
    pub fn new(email: String, key: String) -> Result<Self, CloudflareError> {
        Self::with_base_url(email, key, CLOUDFLARE_API_BASE.to_string())
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_base_url(
        email: String,
        key: String,
        base_url: String,
    ) -> Result<Self, CloudflareError> {
        if email.is_empty() || key.is_empty() {
            return Err(CloudflareError::MissingCredentials);
        }

        let mut headers = HeaderMap::new();
        let email_value = HeaderValue::from_str(&email).map_err(|_| CloudflareError::Auth {
            message: "Invalid email format".to_string(),
        })?;
        let mut key_value = HeaderValue::from_str(&key).map_err(|_| CloudflareError::Auth {
            message: "Invalid API key format".to_string(),
        })?;
        key_value.set_sensitive(true);
        headers.insert(AUTH_EMAIL, email_value);
        headers.insert(AUTH_KEY, key_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(CloudflareError::Network)?;

        Ok(Self {
            client,
            email,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check the credentials against `GET /user`.
    pub async fn verify_auth(&self) -> Result<(), CloudflareError> {
        let url = format!("{}/user", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| CloudflareError::Api {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })?;

        if body.get("success").and_then(|v| v.as_bool()) == Some(true) {
            tracing::debug!(email = %self.email, "cloudflare credentials verified");
            return Ok(());
        }

        let error_message = body
            .get("errors")
            .and_then(|e| e.as_array())
            .and_then(|arr| arr.first())
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown authentication error");

        Err(CloudflareError::Auth {
            message: error_message.to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("email", &self.email)
            .field("key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}
