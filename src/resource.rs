use std::collections::BTreeMap;

use serde::Serialize;

use crate::providers::{DecodeTarget, ProviderError, ProviderRegistry, TypedResource, Zoned};
use crate::terraform::state::{Resource, State};

/// A state instance whose attributes resolved to a typed record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedInstance {
    /// Fully qualified address, e.g. `module.dns.cloudflare_record.www[0]`.
    pub address: String,
    pub dependencies: Vec<String>,
    pub body: Zoned<TypedResource>,
}

impl ParsedInstance {
    pub fn zone_id(&self) -> Option<&str> {
        self.body.zone_id()
    }
}

/// Parsed instances grouped by full resource type tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceCollection {
    by_type: BTreeMap<String, Vec<ParsedInstance>>,
}

impl ResourceCollection {
    pub fn get(&self, resource_type: &str) -> &[ParsedInstance] {
        self.by_type
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParsedInstance])> {
        self.by_type
            .iter()
            .map(|(resource_type, instances)| (resource_type.as_str(), instances.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, resource_type: &str, instance: ParsedInstance) {
        self.by_type
            .entry(resource_type.to_string())
            .or_default()
            .push(instance);
    }
}

/// Resolve every resource of a state into typed records.
///
/// Root resources come first, then each module's. Any unresolved type or
/// undecodable instance fails the whole parse.
pub fn parse_state(
    state: &State,
    registry: &ProviderRegistry,
) -> Result<ResourceCollection, ProviderError> {
    let mut collection = ResourceCollection::default();

    for resource in &state.resources {
        parse_resource(resource, "", registry, &mut collection)?;
    }

    for module in &state.modules {
        let prefix = module.address_prefix();
        for resource in module.resources.values() {
            parse_resource(resource, &prefix, registry, &mut collection)?;
        }
    }

    tracing::info!(
        instances = collection.len(),
        types = collection.by_type.len(),
        "resources parsed"
    );
    Ok(collection)
}

fn parse_resource(
    resource: &Resource,
    prefix: &str,
    registry: &ProviderRegistry,
    collection: &mut ResourceCollection,
) -> Result<(), ProviderError> {
    let target: DecodeTarget<'_> = registry.resolve(&resource.resource_type)?;
    let address = format!("{}{}", prefix, resource.address());

    for instance in &resource.instances {
        let body = target.decode(&instance.attributes)?;
        let parsed = ParsedInstance {
            address: format!("{}{}", address, instance.address_suffix()),
            dependencies: instance.dependencies.clone(),
            body,
        };
        tracing::debug!(address = %parsed.address, zone_id = ?parsed.zone_id(), "parsed instance");
        collection.push(&resource.resource_type, parsed);
    }
    Ok(())
}
