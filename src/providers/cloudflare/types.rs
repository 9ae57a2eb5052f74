//! Cloudflare API shaped records.
//!
//! Field names follow the Cloudflare v4 API. Every struct decodes loosely:
//! unknown keys are ignored and missing keys take their default. Fields
//! marked `skip_deserializing` have no counterpart in Terraform state and are
//! filled in by the synthesis step instead.

use serde::{Deserialize, Serialize};

pub type JsonObject = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificatePack {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub hosts: Vec<String>,
    pub validation_method: String,
    pub validity_days: u32,
    pub certificate_authority: String,
    pub cloudflare_branding: bool,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub name: String,
    #[serde(skip_deserializing)]
    pub content: String,
    pub proxiable: bool,
    pub proxied: Option<bool>,
    pub ttl: u32,
    pub locked: bool,
    pub zone_id: String,
    #[serde(skip_deserializing)]
    pub zone_name: String,
    pub priority: Option<u16>,
    pub comment: String,
    pub tags: Vec<String>,
    pub created_on: String,
    pub modified_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub id: String,
    pub expression: String,
    pub paused: bool,
    pub description: String,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallRule {
    pub id: String,
    pub paused: bool,
    pub description: String,
    pub action: String,
    pub priority: Option<i64>,
    #[serde(skip_deserializing)]
    pub filter: Filter,
    pub products: Vec<String>,
    #[serde(rename = "ref")]
    pub reference: String,
    pub created_on: String,
    pub modified_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpList {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: String,
    #[serde(skip_deserializing)]
    pub num_items: usize,
    pub num_referencing_filters: usize,
    #[serde(skip_deserializing)]
    pub items: Vec<IpListItem>,
    pub created_on: String,
    pub modified_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpListItem {
    pub id: String,
    #[serde(skip_deserializing)]
    pub ip: String,
    pub comment: String,
    pub created_on: String,
    pub modified_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRule {
    pub id: String,
    #[serde(skip_deserializing)]
    pub targets: Vec<PageRuleTarget>,
    #[serde(skip_deserializing)]
    pub actions: Vec<PageRuleAction>,
    pub priority: i64,
    pub status: String,
    pub created_on: String,
    pub modified_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRuleTarget {
    pub target: String,
    pub constraint: PageRuleConstraint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRuleConstraint {
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRuleAction {
    pub id: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerRoute {
    pub id: String,
    pub pattern: String,
    #[serde(skip_deserializing)]
    pub script: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerScript {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(skip_deserializing)]
    pub script: String,
    pub etag: String,
    pub size: u64,
    pub created_on: String,
    pub modified_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    pub id: String,
    // Terraform calls the zone name `zone`.
    #[serde(alias = "zone")]
    pub name: String,
    pub status: String,
    pub paused: bool,
    #[serde(rename = "type")]
    pub type_: String,
    pub name_servers: Vec<String>,
    pub vanity_name_servers: Vec<String>,
    pub original_name_servers: Vec<String>,
    pub original_registrar: String,
    #[serde(skip_deserializing)]
    pub plan: ZonePlan,
    #[serde(skip_deserializing)]
    pub meta: ZoneMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonePlan {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub currency: String,
    pub frequency: String,
    pub legacy_id: String,
}

impl ZonePlan {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneMeta {
    pub page_rule_quota: i64,
    pub wildcard_proxiable: bool,
    pub phishing_detected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSetting {
    pub id: String,
    pub editable: bool,
    pub modified_on: String,
    #[serde(skip_deserializing)]
    pub value: ZoneSettingValues,
}

/// The settings sub-document of `cloudflare_zone_settings_override`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettingValues {
    pub initial_settings: Vec<JsonObject>,
    pub initial_settings_read_at: String,
    pub readonly_settings: Vec<String>,
    pub settings: Vec<JsonObject>,
}
