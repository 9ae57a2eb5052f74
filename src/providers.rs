pub mod cloudflare;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use cloudflare::CloudflareResource;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid resource type: {0}")]
    InvalidResourceType(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("unknown resource type: {provider}_{kind}")]
    UnknownResourceType { provider: String, kind: String },
    #[error("failed to decode {resource_type} instance: {source}")]
    Decode {
        resource_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A `<provider>_<kind>` resource type tag split on its first underscore.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceTypeName {
    pub provider: String,
    pub kind: String,
}

impl ResourceTypeName {
    pub fn parse(full: &str) -> Result<Self, ProviderError> {
        match full.split_once('_') {
            Some((provider, kind)) if !provider.is_empty() && !kind.is_empty() => Ok(Self {
                provider: provider.to_string(),
                kind: kind.to_string(),
            }),
            _ => Err(ProviderError::InvalidResourceType(full.to_string())),
        }
    }
}

impl fmt::Display for ResourceTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.provider, self.kind)
    }
}

/// A record decorated with the zone it belongs to.
///
/// The zone is read from the raw payload on its own, independent of how the
/// record itself was decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zoned<T> {
    pub zone_id: Option<String>,
    pub item: T,
}

impl<T> Zoned<T> {
    pub fn decorate(item: T, attributes: &serde_json::Value, relation_field: &str) -> Self {
        let zone_id = attributes
            .get(relation_field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        Self { zone_id, item }
    }

    pub fn zone_id(&self) -> Option<&str> {
        self.zone_id.as_deref()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Zoned<U> {
        Zoned {
            zone_id: self.zone_id,
            item: f(self.item),
        }
    }
}

/// Typed record produced for a resource instance, one variant per provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedResource {
    Cloudflare(CloudflareResource),
}

pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn resource_kinds(&self) -> Vec<&str>;

    fn supports(&self, kind: &str) -> bool {
        self.resource_kinds().iter().any(|k| *k == kind)
    }

    /// Decode one instance's raw attributes as `kind`.
    fn decode(
        &self,
        kind: &str,
        attributes: &serde_json::Value,
    ) -> Result<Zoned<TypedResource>, ProviderError>;
}

/// Immutable provider → resource kind lookup table.
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Registry with every provider this crate ships.
    pub fn with_defaults() -> Self {
        Self::new().with_provider(cloudflare::CloudflareProvider)
    }

    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
        self
    }

    pub fn provider(&self, name: &str) -> Result<&dyn Provider, ProviderError> {
        self.providers
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| ProviderError::UnknownProvider(name.to_string()))
    }

    /// Resolve a full type tag such as `cloudflare_zone_settings_override`.
    pub fn resolve(&self, resource_type: &str) -> Result<DecodeTarget<'_>, ProviderError> {
        let name = ResourceTypeName::parse(resource_type)?;
        let provider = self.provider(&name.provider)?;
        if !provider.supports(&name.kind) {
            return Err(ProviderError::UnknownResourceType {
                provider: name.provider,
                kind: name.kind,
            });
        }
        Ok(DecodeTarget { name, provider })
    }

    /// Every registered `<provider>_<kind>` tag.
    pub fn resource_types(&self) -> Vec<String> {
        self.providers
            .values()
            .flat_map(|p| {
                p.resource_kinds()
                    .into_iter()
                    .map(|kind| format!("{}_{}", p.name(), kind))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A resolved resource type, ready to decode instances.
pub struct DecodeTarget<'a> {
    name: ResourceTypeName,
    provider: &'a dyn Provider,
}

impl DecodeTarget<'_> {
    pub fn name(&self) -> &ResourceTypeName {
        &self.name
    }

    /// Decode one instance. Null attributes are treated as absent.
    pub fn decode(
        &self,
        attributes: &serde_json::Value,
    ) -> Result<Zoned<TypedResource>, ProviderError> {
        self.provider
            .decode(&self.name.kind, &strip_nulls(attributes))
    }
}

/// Remove null-valued members of a top-level object. Nested documents are
/// kept verbatim.
pub fn strip_nulls(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudflare::types::Filter;

    struct FakeProvider;

    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn resource_kinds(&self) -> Vec<&str> {
            vec!["filter"]
        }

        fn decode(
            &self,
            _kind: &str,
            attributes: &serde_json::Value,
        ) -> Result<Zoned<TypedResource>, ProviderError> {
            let filter = Filter {
                id: "fake".to_string(),
                ..Default::default()
            };
            Ok(Zoned::decorate(
                TypedResource::Cloudflare(CloudflareResource::Filter(filter)),
                attributes,
                "zone_id",
            ))
        }
    }

    #[test]
    fn test_parse_resource_type_splits_on_first_underscore() {
        let name = ResourceTypeName::parse("cloudflare_zone_settings_override").unwrap();
        assert_eq!(name.provider, "cloudflare");
        assert_eq!(name.kind, "zone_settings_override");
        assert_eq!(name.to_string(), "cloudflare_zone_settings_override");
    }

    #[test]
    fn test_parse_resource_type_without_separator() {
        let result = ResourceTypeName::parse("cloudflare");
        assert!(matches!(result, Err(ProviderError::InvalidResourceType(t)) if t == "cloudflare"));

        assert!(ResourceTypeName::parse("_record").is_err());
        assert!(ResourceTypeName::parse("cloudflare_").is_err());
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let registry = ProviderRegistry::with_defaults();
        let result = registry.resolve("cloudflare_nonexistent");
        match result {
            Err(ProviderError::UnknownResourceType { provider, kind }) => {
                assert_eq!(provider, "cloudflare");
                assert_eq!(kind, "nonexistent");
            }
            _ => panic!("expected UnknownResourceType error"),
        }
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let registry = ProviderRegistry::with_defaults();
        let result = registry.resolve("aws_vpc");
        assert!(matches!(result, Err(ProviderError::UnknownProvider(p)) if p == "aws"));
    }

    #[test]
    fn test_registry_with_fake_provider() {
        let registry = ProviderRegistry::new().with_provider(FakeProvider);
        let target = registry.resolve("fake_filter").unwrap();
        assert_eq!(target.name().kind, "filter");

        let decoded = target
            .decode(&serde_json::json!({"zone_id": "z1"}))
            .unwrap();
        assert_eq!(decoded.zone_id(), Some("z1"));

        assert!(registry.resolve("cloudflare_record").is_err());
    }

    #[test]
    fn test_default_registry_lists_every_cloudflare_type() {
        let types = ProviderRegistry::default().resource_types();
        assert_eq!(types.len(), 10);
        assert!(types.contains(&"cloudflare_record".to_string()));
        assert!(types.contains(&"cloudflare_zone_settings_override".to_string()));
        assert!(types.contains(&"cloudflare_ip_list".to_string()));
    }

    #[test]
    fn test_null_attributes_decode_as_absent() {
        let registry = ProviderRegistry::with_defaults();
        let target = registry.resolve("cloudflare_record").unwrap();
        let decoded = target
            .decode(&serde_json::json!({
                "id": "rec1",
                "zone_id": "z1",
                "ttl": null,
                "priority": null,
                "tags": null,
                "value": "192.0.2.1"
            }))
            .unwrap();

        match decoded.item {
            TypedResource::Cloudflare(CloudflareResource::Record(record)) => {
                assert_eq!(record.ttl, 0);
                assert_eq!(record.priority, None);
                assert!(record.tags.is_empty());
                assert_eq!(record.content, "192.0.2.1");
            }
            other => panic!("expected DNS record, got {:?}", other),
        }
    }

    #[test]
    fn test_strip_nulls_only_touches_top_level() {
        let stripped = strip_nulls(&serde_json::json!({
            "a": null,
            "b": {"c": null, "d": 1},
            "e": [{"f": null}]
        }));
        assert_eq!(
            stripped,
            serde_json::json!({"b": {"c": null, "d": 1}, "e": [{"f": null}]})
        );
    }

    #[test]
    fn test_zone_settings_keep_null_values() {
        let registry = ProviderRegistry::with_defaults();
        let target = registry.resolve("cloudflare_zone_settings_override").unwrap();
        let decoded = target
            .decode(&serde_json::json!({
                "id": "z1",
                "zone_id": "z1",
                "initial_settings_read_at": null,
                "settings": [{"always_online": "on", "mobile_redirect": null}]
            }))
            .unwrap();

        match decoded.item {
            TypedResource::Cloudflare(CloudflareResource::ZoneSettings(setting)) => {
                let settings = &setting.value.settings[0];
                assert!(settings.contains_key("mobile_redirect"));
                assert!(settings["mobile_redirect"].is_null());
                assert_eq!(settings["always_online"], "on");
                assert!(setting.value.initial_settings_read_at.is_empty());
            }
            other => panic!("expected zone settings, got {:?}", other),
        }
    }

    #[test]
    fn test_zoned_decorate_ignores_missing_and_empty_zone() {
        let zoned = Zoned::decorate(1, &serde_json::json!({"zone_id": ""}), "zone_id");
        assert_eq!(zoned.zone_id(), None);

        let zoned = Zoned::decorate(1, &serde_json::json!({}), "zone_id");
        assert_eq!(zoned.zone_id(), None);

        let zoned = Zoned::decorate(1, &serde_json::json!({"id": "abc"}), "id");
        assert_eq!(zoned.zone_id(), Some("abc"));
        assert_eq!(zoned.map(|n| n + 1).item, 2);
    }
}
