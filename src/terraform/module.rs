//! Walks Terraform configuration source and flattens resources declared in
//! nested module calls into one path-qualified map.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module not found: {0}")]
    NotFound(String),

    #[error("circular module call: {0}")]
    CircularModule(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: hcl::Error,
    },
}

/// A `resource "<type>" "<name>"` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigResource {
    pub resource_type: String,
    pub name: String,
    pub provider: String,
    pub file: PathBuf,
}

impl ConfigResource {
    pub fn key(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// A `module "<name>" { source = "..." }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCall {
    pub name: String,
    pub source: String,
}

impl ModuleCall {
    /// Local paths are followed; registry and VCS sources are not.
    pub fn is_local(&self) -> bool {
        self.source.starts_with("./")
            || self.source.starts_with("../")
            || Path::new(&self.source).is_absolute()
    }
}

/// The `*.tf` files of one directory.
#[derive(Debug, Clone, Default)]
pub struct ModuleConfig {
    pub resources: BTreeMap<String, ConfigResource>,
    pub calls: Vec<ModuleCall>,
}

/// Parse every `*.tf` file in `dir`, in file name order.
pub fn load_module(dir: &Path) -> Result<ModuleConfig, ModuleError> {
    let entries = fs::read_dir(dir).map_err(|source| io_error(dir, source))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(ModuleError::NotFound(dir.display().to_string()));
    }

    let mut module = ModuleConfig::default();
    for file in files {
        let content = fs::read_to_string(&file).map_err(|source| io_error(&file, source))?;
        let body: hcl::Body = hcl::parse(&content).map_err(|source| ModuleError::Parse {
            path: file.display().to_string(),
            source,
        })?;

        for block in body.blocks() {
            match (block.identifier(), block.labels()) {
                ("resource", [resource_type, name]) => {
                    let resource_type = resource_type.as_str().to_string();
                    let provider = resource_type
                        .split_once('_')
                        .map(|(provider, _)| provider.to_string())
                        .unwrap_or_default();
                    let resource = ConfigResource {
                        resource_type,
                        name: name.as_str().to_string(),
                        provider,
                        file: file.clone(),
                    };
                    module.resources.insert(resource.key(), resource);
                }
                ("module", [name]) => {
                    let source = block
                        .body()
                        .attributes()
                        .find(|attr| attr.key() == "source")
                        .and_then(|attr| match attr.expr() {
                            hcl::Expression::String(source) => Some(source.clone()),
                            _ => None,
                        });
                    match source {
                        Some(source) => module.calls.push(ModuleCall {
                            name: name.as_str().to_string(),
                            source,
                        }),
                        None => tracing::warn!(
                            module = name.as_str(),
                            file = %file.display(),
                            "module call without a literal source"
                        ),
                    }
                }
                _ => {}
            }
        }
    }

    Ok(module)
}

/// A module with its local child modules resolved.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    pub dir: PathBuf,
    pub resources: BTreeMap<String, ConfigResource>,
    pub children: Vec<(String, ResolvedModule)>,
}

impl ResolvedModule {
    /// Own resources plus every descendant's, keyed
    /// `module.<call>.<key>` per level of nesting.
    pub fn flatten(&self) -> BTreeMap<String, ConfigResource> {
        let mut flat = self.resources.clone();
        for (call, child) in &self.children {
            for (key, resource) in child.flatten() {
                flat.insert(format!("module.{}.{}", call, key), resource);
            }
        }
        flat
    }
}

/// Resolves module calls depth first, rejecting cycles.
#[derive(Debug, Default)]
pub struct ModuleWalker {
    resolving: HashSet<PathBuf>,
}

impl ModuleWalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, dir: &Path) -> Result<ResolvedModule, ModuleError> {
        let dir = fs::canonicalize(dir)
            .map_err(|_| ModuleError::NotFound(dir.display().to_string()))?;

        if self.resolving.contains(&dir) {
            return Err(ModuleError::CircularModule(dir.display().to_string()));
        }
        self.resolving.insert(dir.clone());

        let result = self.resolve_calls(&dir);

        self.resolving.remove(&dir);
        result
    }

    fn resolve_calls(&mut self, dir: &Path) -> Result<ResolvedModule, ModuleError> {
        let config = load_module(dir)?;
        tracing::debug!(
            dir = %dir.display(),
            resources = config.resources.len(),
            calls = config.calls.len(),
            "loaded module"
        );

        let mut children = Vec::new();
        for call in config.calls {
            if !call.is_local() {
                tracing::warn!(module = %call.name, source = %call.source, "skipping non-local module source");
                continue;
            }
            let child = self.resolve(&dir.join(&call.source))?;
            children.push((call.name, child));
        }

        Ok(ResolvedModule {
            dir: dir.to_path_buf(),
            resources: config.resources,
            children,
        })
    }
}

/// Every resource declared under `root_dir`, module calls flattened.
pub fn collect_resources(root_dir: &Path) -> Result<BTreeMap<String, ConfigResource>, ModuleError> {
    Ok(ModuleWalker::new().resolve(root_dir)?.flatten())
}

fn io_error(path: &Path, source: std::io::Error) -> ModuleError {
    ModuleError::Io {
        path: path.display().to_string(),
        source,
    }
}
