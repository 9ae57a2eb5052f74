//! Terraform state document decoding.
//!
//! The outer shape (`version`, `backend`, `modules`, `resources`) is decoded
//! here. Instance attributes stay opaque JSON: their shape depends on the
//! resource type and is resolved later by [`crate::resource::parse_state`].

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("malformed state document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decoded Terraform state.
#[derive(Debug, Clone, Deserialize)]
pub struct State {
    pub version: u32,
    #[serde(default)]
    pub backend: BackendDescriptor,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl State {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, StateError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn instance_count(&self) -> usize {
        let root: usize = self.resources.iter().map(|r| r.instances.len()).sum();
        let nested: usize = self
            .modules
            .iter()
            .flat_map(|m| m.resources.values())
            .map(|r| r.instances.len())
            .sum();
        root + nested
    }
}

/// The `backend` block: which backend the state lives in and its raw config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendDescriptor {
    #[serde(rename = "type", default)]
    pub backend_type: String,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
}

impl Module {
    /// Address prefix for resources in this module, e.g. `module.net.module.sub.`.
    ///
    /// Legacy state files name the root module `root`; that segment is not
    /// part of any address.
    pub fn address_prefix(&self) -> String {
        let children = match self.path.split_first() {
            Some((first, rest)) if first == "root" => rest,
            _ => &self.path[..],
        };
        children
            .iter()
            .map(|segment| format!("module.{}.", segment))
            .collect()
    }

    pub fn is_root(&self) -> bool {
        self.address_prefix().is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub mode: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl Resource {
    /// `<type>.<name>`, or `data.<type>.<name>` for data sources.
    pub fn address(&self) -> String {
        if self.mode == "data" {
            format!("data.{}.{}", self.resource_type, self.name)
        } else {
            format!("{}.{}", self.resource_type, self.name)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub attributes: serde_json::Value,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// `count` index or `for_each` key, when the resource has several instances.
    #[serde(default)]
    pub index_key: Option<serde_json::Value>,
}

impl Instance {
    pub fn address_suffix(&self) -> String {
        match &self.index_key {
            Some(serde_json::Value::Number(n)) => format!("[{}]", n),
            Some(serde_json::Value::String(s)) => format!("[\"{}\"]", s),
            _ => String::new(),
        }
    }
}
