mod client;
mod error;
pub mod types;

pub use client::CloudflareClient;
pub use error::CloudflareError;

use std::fmt;

use serde::de::{DeserializeOwned, Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Provider, ProviderError, TypedResource, Zoned};
use types::{
    CertificatePack, DnsRecord, Filter, FirewallRule, IpList, IpListItem, JsonObject, PageRule,
    PageRuleAction, PageRuleConstraint, PageRuleTarget, WorkerRoute, WorkerScript, Zone, ZoneMeta,
    ZonePlan, ZoneSetting, ZoneSettingValues,
};

pub const PROVIDER_NAME: &str = "cloudflare";

/// Resource kinds understood by the Cloudflare provider, named as in
/// `cloudflare_<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    CertificatePack,
    Record,
    Filter,
    FirewallRule,
    IpList,
    PageRule,
    WorkerRoute,
    WorkerScript,
    Zone,
    ZoneSettingsOverride,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::CertificatePack,
        ResourceKind::Record,
        ResourceKind::Filter,
        ResourceKind::FirewallRule,
        ResourceKind::IpList,
        ResourceKind::PageRule,
        ResourceKind::WorkerRoute,
        ResourceKind::WorkerScript,
        ResourceKind::Zone,
        ResourceKind::ZoneSettingsOverride,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::CertificatePack => "certificate_pack",
            ResourceKind::Record => "record",
            ResourceKind::Filter => "filter",
            ResourceKind::FirewallRule => "firewall_rule",
            ResourceKind::IpList => "ip_list",
            ResourceKind::PageRule => "page_rule",
            ResourceKind::WorkerRoute => "worker_route",
            ResourceKind::WorkerScript => "worker_script",
            ResourceKind::Zone => "zone",
            ResourceKind::ZoneSettingsOverride => "zone_settings_override",
        }
    }

    pub fn from_name(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }

    /// Attribute holding the owning zone. A zone is scoped by its own id.
    pub fn zone_field(self) -> &'static str {
        match self {
            ResourceKind::Zone => "id",
            _ => "zone_id",
        }
    }

    /// Decode raw instance attributes into this kind's record.
    pub fn decode(
        self,
        attributes: &serde_json::Value,
    ) -> Result<Zoned<CloudflareResource>, serde_json::Error> {
        let resource = match self {
            ResourceKind::CertificatePack => {
                CloudflareResource::CertificatePack(synthesize_from(attributes)?)
            }
            ResourceKind::Record => CloudflareResource::Record(synthesize_from(attributes)?),
            ResourceKind::Filter => CloudflareResource::Filter(synthesize_from(attributes)?),
            ResourceKind::FirewallRule => {
                CloudflareResource::FirewallRule(synthesize_from(attributes)?)
            }
            ResourceKind::IpList => CloudflareResource::IpList(synthesize_from(attributes)?),
            ResourceKind::PageRule => CloudflareResource::PageRule(synthesize_from(attributes)?),
            ResourceKind::WorkerRoute => {
                CloudflareResource::WorkerRoute(synthesize_from(attributes)?)
            }
            ResourceKind::WorkerScript => {
                CloudflareResource::WorkerScript(synthesize_from(attributes)?)
            }
            ResourceKind::Zone => CloudflareResource::Zone(synthesize_from(attributes)?),
            ResourceKind::ZoneSettingsOverride => {
                CloudflareResource::ZoneSettings(synthesize_from(attributes)?)
            }
        };
        Ok(Zoned::decorate(resource, attributes, self.zone_field()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", PROVIDER_NAME, self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CloudflareResource {
    CertificatePack(CertificatePack),
    Record(DnsRecord),
    Filter(Filter),
    FirewallRule(FirewallRule),
    IpList(IpList),
    PageRule(PageRule),
    WorkerRoute(WorkerRoute),
    WorkerScript(WorkerScript),
    Zone(Zone),
    ZoneSettings(ZoneSetting),
}

pub struct CloudflareProvider;

impl Provider for CloudflareProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn resource_kinds(&self) -> Vec<&str> {
        ResourceKind::ALL.iter().map(|k| k.as_str()).collect()
    }

    fn decode(
        &self,
        kind: &str,
        attributes: &serde_json::Value,
    ) -> Result<Zoned<TypedResource>, ProviderError> {
        let kind = ResourceKind::from_name(kind).ok_or_else(|| {
            ProviderError::UnknownResourceType {
                provider: PROVIDER_NAME.to_string(),
                kind: kind.to_string(),
            }
        })?;

        let decoded = kind
            .decode(attributes)
            .map_err(|source| ProviderError::Decode {
                resource_type: kind.to_string(),
                source,
            })?;

        Ok(decoded.map(TypedResource::Cloudflare))
    }
}

/// Folding of Terraform-only attributes into canonical API fields.
///
/// A record is decoded twice from the same payload: once as its API shape
/// and once as `Extra`, the attributes Terraform stores under other names.
/// `synthesize` then combines the two.
pub trait Synthesize: DeserializeOwned {
    type Extra: DeserializeOwned;

    fn synthesize(self, extra: Self::Extra) -> Self;
}

pub fn synthesize_from<T: Synthesize>(attributes: &serde_json::Value) -> serde_json::Result<T> {
    let base = T::deserialize(attributes)?;
    let extra = T::Extra::deserialize(attributes)?;
    Ok(base.synthesize(extra))
}

/// Deserializes a nested value through [`synthesize_from`].
struct Synthesized<T>(T);

impl<'de, T: Synthesize> Deserialize<'de> for Synthesized<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = super::strip_nulls(&serde_json::Value::deserialize(deserializer)?);
        synthesize_from(&raw).map(Synthesized).map_err(D::Error::custom)
    }
}

impl Synthesize for CertificatePack {
    type Extra = IgnoredAny;

    fn synthesize(self, _extra: IgnoredAny) -> Self {
        self
    }
}

impl Synthesize for Filter {
    type Extra = IgnoredAny;

    fn synthesize(self, _extra: IgnoredAny) -> Self {
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DnsRecordExtra {
    hostname: String,
    value: String,
}

impl Synthesize for DnsRecord {
    type Extra = DnsRecordExtra;

    fn synthesize(self, extra: DnsRecordExtra) -> Self {
        Self {
            zone_name: extra.hostname,
            content: extra.value,
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FirewallRuleExtra {
    filter_id: String,
}

impl Synthesize for FirewallRule {
    type Extra = FirewallRuleExtra;

    fn synthesize(self, extra: FirewallRuleExtra) -> Self {
        Self {
            filter: Filter {
                id: extra.filter_id,
                ..Default::default()
            },
            ..self
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct IpListExtra {
    item: Vec<Synthesized<IpListItem>>,
}

impl Synthesize for IpList {
    type Extra = IpListExtra;

    fn synthesize(self, extra: IpListExtra) -> Self {
        let items: Vec<IpListItem> = extra.item.into_iter().map(|i| i.0).collect();
        Self {
            num_items: items.len(),
            items,
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IpListItemExtra {
    value: String,
}

impl Synthesize for IpListItem {
    type Extra = IpListItemExtra;

    fn synthesize(self, extra: IpListItemExtra) -> Self {
        Self {
            ip: extra.value,
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageRuleExtra {
    target: String,
    actions: Vec<JsonObject>,
}

impl Synthesize for PageRule {
    type Extra = PageRuleExtra;

    fn synthesize(self, extra: PageRuleExtra) -> Self {
        let targets = if extra.target.is_empty() {
            Vec::new()
        } else {
            vec![PageRuleTarget {
                target: "url".to_string(),
                constraint: PageRuleConstraint {
                    operator: "matches".to_string(),
                    value: extra.target,
                },
            }]
        };

        let actions = extra
            .actions
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(id, value)| PageRuleAction { id, value })
            .collect();

        Self {
            targets,
            actions,
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkerRouteExtra {
    script_name: String,
}

impl Synthesize for WorkerRoute {
    type Extra = WorkerRouteExtra;

    fn synthesize(self, extra: WorkerRouteExtra) -> Self {
        Self {
            script: extra.script_name,
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkerScriptExtra {
    content: String,
    name: String,
}

impl Synthesize for WorkerScript {
    type Extra = WorkerScriptExtra;

    fn synthesize(self, extra: WorkerScriptExtra) -> Self {
        Self {
            script: extra.content,
            id: extra.name,
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ZoneExtra {
    meta: Option<serde_json::Value>,
    plan: Option<serde_json::Value>,
}

impl Synthesize for Zone {
    type Extra = ZoneExtra;

    fn synthesize(self, extra: ZoneExtra) -> Self {
        let meta = match extra.meta {
            Some(serde_json::Value::Object(meta)) => ZoneMeta {
                page_rule_quota: coerce_quota(meta.get("page_rule_quota")),
                wildcard_proxiable: coerce_flag("wildcard_proxiable", meta.get("wildcard_proxiable")),
                phishing_detected: coerce_flag("phishing_detected", meta.get("phishing_detected")),
            },
            Some(other) => {
                tracing::debug!(value = %other, "coercing non-object zone meta to defaults");
                ZoneMeta::default()
            }
            None => ZoneMeta::default(),
        };

        let plan = match extra.plan {
            Some(serde_json::Value::String(name)) => ZonePlan::named(name),
            _ => ZonePlan::default(),
        };

        Self { meta, plan, ..self }
    }
}

impl Synthesize for ZoneSetting {
    type Extra = ZoneSettingValues;

    fn synthesize(self, extra: ZoneSettingValues) -> Self {
        Self {
            value: extra,
            ..self
        }
    }
}

/// Terraform stores zone meta flags as the strings `"true"` / `"false"`.
/// Only the string `"true"` is true.
fn coerce_flag(field: &str, value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::String(s)) if s == "true" => true,
        Some(serde_json::Value::String(s)) if s == "false" => false,
        None => false,
        Some(other) => {
            tracing::debug!(field, value = %other, "coercing unexpected zone meta flag to false");
            false
        }
    }
}

fn coerce_quota(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
            tracing::debug!(value = %s, "coercing non-numeric page_rule_quota to 0");
            0
        }),
        _ => 0,
    }
}
