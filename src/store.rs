//! The scope-keyed store: an in-memory tree of fixture results.
//!
//! Session-scoped fixtures live flat under their fixture-id; every narrower
//! scope nests under the test node-id first, so two tests can hold different
//! results for the same fixture definition.

use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// node-id -> fixture-id -> stored value.
pub type NodeBuckets = BTreeMap<String, BTreeMap<String, Value>>;

/// One run's accumulated fixture results, addressable by scope.
///
/// The serialized form is a single JSON document with one top-level key per
/// scope, which is also the durable snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreTree {
    pub session: BTreeMap<String, Value>,
    pub package: NodeBuckets,
    pub module: NodeBuckets,
    pub r#class: NodeBuckets,
    pub function: NodeBuckets,
}

impl StoreTree {
    /// Write `value` at the address derived from `scope`. Overwrites any
    /// prior value at that exact address.
    pub fn store(&mut self, value: Value, scope: Scope, fixture_id: &str, node_id: &str) {
        match self.nodes_mut(scope) {
            None => {
                self.session.insert(fixture_id.to_string(), value);
            }
            Some(nodes) => {
                nodes
                    .entry(node_id.to_string())
                    .or_default()
                    .insert(fixture_id.to_string(), value);
            }
        }
    }

    /// Look up a stored value. `None` means absent at any level of the
    /// address; a stored empty/zero value is still `Some`.
    pub fn load(&self, scope: Scope, fixture_id: &str, node_id: &str) -> Option<&Value> {
        match self.nodes(scope) {
            None => self.session.get(fixture_id),
            Some(nodes) => nodes.get(node_id)?.get(fixture_id),
        }
    }

    /// Fold a worker's tree into this one. Session entries overwrite per
    /// fixture-id; for node-scoped buckets the whole node bucket is replaced
    /// last-writer-wins, never merged key by key.
    pub fn merge(&mut self, other: StoreTree) {
        self.session.extend(other.session);
        self.package.extend(other.package);
        self.module.extend(other.module);
        self.r#class.extend(other.r#class);
        self.function.extend(other.function);
    }

    fn nodes(&self, scope: Scope) -> Option<&NodeBuckets> {
        match scope {
            Scope::Session => None,
            Scope::Package => Some(&self.package),
            Scope::Module => Some(&self.module),
            Scope::Class => Some(&self.r#class),
            Scope::Function => Some(&self.function),
        }
    }

    fn nodes_mut(&mut self, scope: Scope) -> Option<&mut NodeBuckets> {
        match scope {
            Scope::Session => None,
            Scope::Package => Some(&mut self.package),
            Scope::Module => Some(&mut self.module),
            Scope::Class => Some(&mut self.r#class),
            Scope::Function => Some(&mut self.function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_then_load_round_trips_per_scope() {
        for scope in Scope::all() {
            for value in [json!("result"), json!(42), json!({"key": ["nested"]})] {
                let mut tree = StoreTree::default();
                tree.store(value.clone(), scope, "fix", "tests/test_a.py::test_one");
                assert_eq!(
                    tree.load(scope, "fix", "tests/test_a.py::test_one"),
                    Some(&value)
                );
            }
        }
    }

    #[test]
    fn session_scope_ignores_node_id() {
        let mut tree = StoreTree::default();
        tree.store(json!(1), Scope::Session, "fix", "node-a");
        assert_eq!(tree.load(Scope::Session, "fix", "node-b"), Some(&json!(1)));
    }

    #[test]
    fn absent_address_is_none_not_error() {
        let tree = StoreTree::default();
        assert_eq!(tree.load(Scope::Module, "fix", "node"), None);
        assert_eq!(tree.load(Scope::Session, "fix", "node"), None);
    }

    #[test]
    fn stored_empty_value_is_present() {
        let mut tree = StoreTree::default();
        tree.store(json!([]), Scope::Module, "fix", "node");
        assert_eq!(tree.load(Scope::Module, "fix", "node"), Some(&json!([])));
    }

    #[test]
    fn store_overwrites_same_address() {
        let mut tree = StoreTree::default();
        tree.store(json!(1), Scope::Function, "fix", "node");
        tree.store(json!(2), Scope::Function, "fix", "node");
        assert_eq!(tree.load(Scope::Function, "fix", "node"), Some(&json!(2)));
    }

    #[test]
    fn merge_preserves_disjoint_node_ids() {
        let mut left = StoreTree::default();
        left.store(json!("a"), Scope::Function, "fix", "node-a");
        let mut right = StoreTree::default();
        right.store(json!("b"), Scope::Function, "fix", "node-b");

        left.merge(right);
        assert_eq!(left.load(Scope::Function, "fix", "node-a"), Some(&json!("a")));
        assert_eq!(left.load(Scope::Function, "fix", "node-b"), Some(&json!("b")));
    }

    #[test]
    fn merge_replaces_node_bucket_wholly() {
        let mut left = StoreTree::default();
        left.store(json!("old"), Scope::Function, "only_in_left", "node");
        let mut right = StoreTree::default();
        right.store(json!("new"), Scope::Function, "only_in_right", "node");

        left.merge(right);
        // Last writer wins at node granularity, not a key-wise union.
        assert_eq!(left.load(Scope::Function, "only_in_left", "node"), None);
        assert_eq!(
            left.load(Scope::Function, "only_in_right", "node"),
            Some(&json!("new"))
        );
    }

    #[test]
    fn merge_overwrites_session_per_fixture() {
        let mut left = StoreTree::default();
        left.store(json!(1), Scope::Session, "shared", "");
        left.store(json!(1), Scope::Session, "left_only", "");
        let mut right = StoreTree::default();
        right.store(json!(2), Scope::Session, "shared", "");

        left.merge(right);
        assert_eq!(left.load(Scope::Session, "shared", ""), Some(&json!(2)));
        assert_eq!(left.load(Scope::Session, "left_only", ""), Some(&json!(1)));
    }

    #[test]
    fn serialized_shape_has_one_key_per_scope() {
        let mut tree = StoreTree::default();
        tree.store(json!([]), Scope::Module, "fnc", "tests/mock/test_x.py::test_a");
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!({
                "session": {},
                "package": {},
                "module": {"tests/mock/test_x.py::test_a": {"fnc": []}},
                "class": {},
                "function": {},
            })
        );
    }
}
