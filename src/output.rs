//! Terminal rendering of parsed state and declared configuration.

use std::collections::{BTreeMap, BTreeSet};

use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::resource::ResourceCollection;
use crate::terraform::module::ConfigResource;

#[derive(Debug, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Resource type")]
    resource_type: String,
    #[tabled(rename = "Instances")]
    instances: usize,
    #[tabled(rename = "Zones")]
    zones: usize,
}

/// One row per resource type: instance count and distinct zones.
pub fn summary_table(collection: &ResourceCollection) -> String {
    let rows: Vec<SummaryRow> = collection
        .iter()
        .map(|(resource_type, instances)| SummaryRow {
            resource_type: resource_type.to_string(),
            instances: instances.len(),
            zones: instances
                .iter()
                .filter_map(|i| i.zone_id())
                .collect::<BTreeSet<_>>()
                .len(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Default)]
struct ModuleNode {
    resources: Vec<String>,
    children: BTreeMap<String, ModuleNode>,
}

impl ModuleNode {
    fn insert(&mut self, key: &str) {
        match key
            .strip_prefix("module.")
            .and_then(|rest| rest.split_once('.'))
        {
            Some((call, rest)) => self
                .children
                .entry(call.to_string())
                .or_default()
                .insert(rest),
            None => self.resources.push(key.to_string()),
        }
    }

    fn into_tree(self, label: String) -> Tree<String> {
        let mut tree = Tree::new(label);
        for resource in self.resources {
            tree.push(Tree::new(resource));
        }
        for (call, child) in self.children {
            tree.push(child.into_tree(format!("module.{}", call)));
        }
        tree
    }
}

/// Declared resources nested under the module calls that declare them.
pub fn module_tree(root: &str, resources: &BTreeMap<String, ConfigResource>) -> Tree<String> {
    let mut node = ModuleNode::default();
    for key in resources.keys() {
        node.insert(key);
    }
    node.into_tree(root.to_string())
}
