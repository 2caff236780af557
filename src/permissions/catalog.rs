//! Node catalog for help and listing tools

use std::collections::BTreeMap;
use std::sync::Arc;

use super::defaults::DefaultPolicyTable;
use super::node::{self, WILDCARD_SUFFIX};

/// Validation and discovery of known nodes
#[derive(Debug, Clone)]
pub struct NodeCatalog {
    table: Arc<DefaultPolicyTable>,
}

impl NodeCatalog {
    pub fn new(table: Arc<DefaultPolicyTable>) -> Self {
        Self { table }
    }

    /// Whether a node is known, or is a well-formed prefix wildcard
    pub fn is_valid_node(&self, node: &str) -> bool {
        self.table.contains_literal(node)
            || node
                .strip_suffix(WILDCARD_SUFFIX)
                .is_some_and(node::is_literal)
    }

    /// Every literal node, grouped by top-level segment
    pub fn list_all_nodes(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in self.table.list_all_nodes() {
            groups
                .entry(node::top_level(&node).to_string())
                .or_default()
                .push(node);
        }
        groups
    }

    /// Literal nodes in one top-level group
    pub fn nodes_under(&self, group: &str) -> Vec<String> {
        self.table
            .list_all_nodes()
            .into_iter()
            .filter(|n| node::top_level(n) == group)
            .collect()
    }
}
