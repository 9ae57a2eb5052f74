//! Lock info body exchanged with an HTTP state lock endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terraform-compatible lock info. Field names are capitalised on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LockInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub operation: String,
    #[serde(default)]
    pub info: String,
    pub who: String,
    #[serde(default)]
    pub version: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub path: String,
}

impl LockInfo {
    pub fn new(operation: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            info: String::new(),
            who: lock_owner(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: Utc::now(),
            path: path.into(),
        }
    }
}

/// `username@hostname`
fn lock_owner() -> String {
    let username = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    format!("{}@{}", username, hostname)
}
