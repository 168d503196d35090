//! Serialization gate: decides whether a fixture result can be persisted.
//!
//! Every write into the store goes through an explicit capability check;
//! values that fail land in a failure set instead of the tree. A final sweep
//! re-validates the accumulated tree right before the terminal write.

use crate::store::StoreTree;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Dry-run probe: true iff `value` survives a full serialization pass.
/// No side effects.
pub fn can_persist<T: Serialize>(value: &T) -> bool {
    serde_json::to_vec(value).is_ok()
}

/// Capture a fixture result as a storable snapshot. The error is the typed
/// "unpersistable" outcome consumed by the interception layer.
pub fn snapshot<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

/// Bookkeeping for which fixture definitions persisted this run.
///
/// The two sets stay disjoint: a later failure demotes a previously
/// successful fixture-id, and a later success promotes a failed one.
#[derive(Debug, Default)]
pub struct FixtureSets {
    pub persisted: BTreeSet<String>,
    pub unpersistable: BTreeSet<String>,
}

impl FixtureSets {
    pub fn record_persisted(&mut self, fixture_id: &str) {
        self.unpersistable.remove(fixture_id);
        self.persisted.insert(fixture_id.to_string());
    }

    pub fn record_unpersistable(&mut self, fixture_id: &str) {
        self.persisted.remove(fixture_id);
        self.unpersistable.insert(fixture_id.to_string());
    }
}

/// Final sweep before the terminal write: drop any entry that no longer
/// serializes and reconcile the success/failure sets to match.
pub fn sweep(tree: &mut StoreTree, sets: &mut FixtureSets) {
    sweep_fixtures(&mut tree.session, sets);
    for buckets in [
        &mut tree.package,
        &mut tree.module,
        &mut tree.r#class,
        &mut tree.function,
    ] {
        for fixtures in buckets.values_mut() {
            sweep_fixtures(fixtures, sets);
        }
    }
}

fn sweep_fixtures(fixtures: &mut BTreeMap<String, Value>, sets: &mut FixtureSets) {
    let stale: Vec<String> = fixtures
        .iter()
        .filter(|(_, value)| !can_persist(value))
        .map(|(fixture_id, _)| fixture_id.clone())
        .collect();
    for fixture_id in stale {
        fixtures.remove(&fixture_id);
        sets.record_unpersistable(&fixture_id);
    }
}
