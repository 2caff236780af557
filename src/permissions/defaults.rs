//! Built-in default policy
//!
//! The terminal fallback of every resolution. Built once at startup and shared
//! read-only (`Arc<DefaultPolicyTable>`), so lookups take no locks.

use std::collections::BTreeMap;

use crate::core::PolicyResult;

use super::node::{self, NodeMatch};

/// Immutable node → allowed table
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicyTable {
    entries: BTreeMap<String, bool>,
}

impl DefaultPolicyTable {
    /// Build a table from `(key, allowed)` pairs
    ///
    /// Keys are normalized and may be literal nodes or wildcards.
    /// A later duplicate key replaces an earlier one.
    pub fn new<I, K>(entries: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (key, allowed) in entries {
            table.insert(node::validate_key(key.as_ref())?, allowed);
        }
        tracing::debug!("[DefaultPolicyTable] Built with {} entries", table.len());
        Ok(Self { entries: table })
    }

    /// A table with no entries; every node resolves to `false`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve a node to its default answer
    ///
    /// Never "no opinion": anything the table does not cover is denied.
    pub fn resolve_default(&self, node: &str) -> bool {
        self.resolve_match(node).map(|m| m.allowed).unwrap_or(false)
    }

    /// Resolve a node and report which key decided it
    pub fn resolve_match(&self, node: &str) -> Option<NodeMatch> {
        node::resolve(node, |key| self.entries.get(key).copied())
    }

    /// Get the value stored under an exact key
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }

    /// Whether a literal node is present in the table
    pub fn contains_literal(&self, node: &str) -> bool {
        node::is_literal(node) && self.entries.contains_key(node)
    }

    /// Every literal (non-wildcard) key, sorted
    pub fn list_all_nodes(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter(|k| node::is_literal(k))
            .cloned()
            .collect()
    }

    /// Iterate over all entries, wildcards included
    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PolicyError;

    #[test]
    fn test_specific_wildcard_beats_global() {
        let table = DefaultPolicyTable::new([("mod.*", false), ("*", true)]).unwrap();
        assert!(!table.resolve_default("mod.anything"));
        assert!(table.resolve_default("levels.use"));
    }

    #[test]
    fn test_falls_through_to_false() {
        let table =
            DefaultPolicyTable::new([("mod.*", false), ("economy.gambling.slots", true)]).unwrap();

        assert!(!table.resolve_default("mod.ban"));
        assert!(table.resolve_default("economy.gambling.slots"));
        assert!(!table.resolve_default("economy.gambling.dice"));
    }

    #[test]
    fn test_empty_table_denies() {
        let table = DefaultPolicyTable::empty();
        assert!(table.is_empty());
        assert!(!table.resolve_default("anything"));
    }

    #[test]
    fn test_resolve_match_reports_key() {
        let table = DefaultPolicyTable::new([("economy.*", true)]).unwrap();
        let m = table.resolve_match("economy.daily").unwrap();
        assert_eq!(m.key, "economy.*");
        assert!(table.resolve_match("mod.ban").is_none());
    }

    #[test]
    fn test_keys_normalized() {
        let table = DefaultPolicyTable::new([(" Levels.Use ", true)]).unwrap();
        assert_eq!(table.get("levels.use"), Some(true));
        assert!(table.contains_literal("levels.use"));
    }

    #[test]
    fn test_rejects_malformed_key() {
        let err = DefaultPolicyTable::new([("mod.*.ban", true)]).unwrap_err();
        assert!(matches!(err, PolicyError::Validation { .. }));
    }

    #[test]
    fn test_list_all_nodes_skips_wildcards() {
        let table = DefaultPolicyTable::new([
            ("mod.ban", false),
            ("mod.*", false),
            ("*", true),
            ("levels.use", true),
        ])
        .unwrap();
        assert_eq!(table.list_all_nodes(), vec!["levels.use", "mod.ban"]);
        assert_eq!(table.len(), 4);
    }
}
