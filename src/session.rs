//! Per-run plugin context: session lifecycle plus fixture interception.
//!
//! A host runner constructs one [`Plugin`] per run and calls the three hooks
//! directly: [`Plugin::on_session_start`] before any test executes,
//! [`Plugin::on_fixture_setup`] wherever a fixture would normally be
//! computed, and [`Plugin::on_session_finish`] after the run.

use crate::config::RunConfig;
use crate::gate::{self, FixtureSets};
use crate::scope::Scope;
use crate::store::StoreTree;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Identities the host runner supplies for one fixture-setup event.
///
/// The fixture-id comes from the fixture's declaration signature and is
/// stable across runs; the node-id addresses the test item being executed.
#[derive(Debug, Clone)]
pub struct FixtureRequest {
    pub fixture_id: String,
    pub scope: Scope,
    pub node_id: String,
}

impl FixtureRequest {
    pub fn new(
        fixture_id: impl Into<String>,
        scope: Scope,
        node_id: impl Into<String>,
    ) -> Self {
        FixtureRequest {
            fixture_id: fixture_id.into(),
            scope,
            node_id: node_id.into(),
        }
    }
}

/// One run's persistence state, constructed once and threaded through every
/// hook call. Never process-global, so parallel in-process runs stay
/// independent and tests can reset by dropping it.
#[derive(Debug, Default)]
pub struct Plugin {
    config: RunConfig,
    output: StoreTree,
    input: Option<StoreTree>,
    sets: FixtureSets,
}

impl Plugin {
    pub fn new(config: RunConfig) -> Self {
        Plugin {
            config,
            ..Plugin::default()
        }
    }

    /// Which fixture definitions persisted (or failed to) so far this run.
    pub fn fixture_sets(&self) -> &FixtureSets {
        &self.sets
    }

    /// This run's accumulated output tree.
    pub fn output(&self) -> &StoreTree {
        &self.output
    }

    /// Validate the destination and load the prior snapshot, before any test
    /// executes. Both failure modes abort the whole run: an existing
    /// destination must not be silently overwritten, and a partial or
    /// corrupt cache must not be replayed.
    pub fn on_session_start(&mut self) -> Result<()> {
        if let Some(dest) = &self.config.store {
            if dest.exists() {
                bail!("store destination {} already exists", dest.display());
            }
        }
        if let Some(source) = &self.config.load {
            let bytes = fs::read(source)
                .with_context(|| format!("read fixture snapshot {}", source.display()))?;
            let tree: StoreTree = serde_json::from_slice(&bytes)
                .with_context(|| format!("parse fixture snapshot {}", source.display()))?;
            self.input = Some(tree);
        }
        Ok(())
    }

    /// Intercept one fixture-setup event.
    ///
    /// Replays the stored result when the loaded snapshot has one at this
    /// address, skipping `compute` entirely; otherwise computes, and (when a
    /// store destination is configured) records the result through the
    /// serialization gate. A result the gate rejects still reaches the
    /// caller — only its persistence is dropped.
    pub fn on_fixture_setup<T, F>(&mut self, request: &FixtureRequest, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(input) = &self.input {
            if let Some(stored) =
                input.load(request.scope, &request.fixture_id, &request.node_id)
            {
                tracing::debug!(
                    fixture = %request.fixture_id,
                    node = %request.node_id,
                    "fixture replayed from snapshot"
                );
                let value = serde_json::from_value(stored.clone()).with_context(|| {
                    format!("replay stored fixture {}", request.fixture_id)
                })?;
                return Ok(value);
            }
        }

        let value = compute()?;

        if self.config.store.is_some() {
            match gate::snapshot(&value) {
                Ok(snapshot) => {
                    self.sets.record_persisted(&request.fixture_id);
                    self.output.store(
                        snapshot,
                        request.scope,
                        &request.fixture_id,
                        &request.node_id,
                    );
                }
                Err(err) => {
                    tracing::debug!(
                        fixture = %request.fixture_id,
                        error = %err,
                        "fixture result not serializable"
                    );
                    self.sets.record_unpersistable(&request.fixture_id);
                }
            }
        }

        Ok(value)
    }

    /// Flush the run's results after the last test.
    ///
    /// A distributed worker writes only its own file and never touches the
    /// shared destination; the coordinator first folds in (and removes)
    /// every worker file, then writes the merged tree as a single blob.
    pub fn on_session_finish(&mut self) -> Result<()> {
        let Some(dest) = self.config.store.clone() else {
            return Ok(());
        };

        if let Some(worker) = self.config.worker.clone() {
            let path = worker_file(&dest, &worker);
            self.write_snapshot(&path)?;
            self.report_summary();
            return Ok(());
        }

        if let Some(count) = self.config.workers {
            for index in 0..count {
                let path = worker_file(&dest, &format!("gw{index}"));
                let bytes = fs::read(&path)
                    .with_context(|| format!("read worker snapshot {}", path.display()))?;
                let tree: StoreTree = serde_json::from_slice(&bytes)
                    .with_context(|| format!("parse worker snapshot {}", path.display()))?;
                self.output.merge(tree);
                fs::remove_file(&path)
                    .with_context(|| format!("remove worker snapshot {}", path.display()))?;
            }
        }

        self.write_snapshot(&dest)?;
        self.report_summary();
        Ok(())
    }

    fn write_snapshot(&mut self, path: &Path) -> Result<()> {
        gate::sweep(&mut self.output, &mut self.sets);
        let bytes =
            serde_json::to_vec_pretty(&self.output).context("serialize fixture snapshot")?;
        fs::write(path, &bytes)
            .with_context(|| format!("write fixture snapshot {}", path.display()))?;
        Ok(())
    }

    fn report_summary(&self) {
        println!("\nStored fixtures:");
        for fixture_id in &self.sets.persisted {
            println!("  {fixture_id}");
        }
        println!("\nUnstored fixtures:");
        for fixture_id in &self.sets.unpersistable {
            println!("  {fixture_id}");
        }
    }
}

/// Worker-local snapshot path: the shared destination with the worker id
/// appended, matching the coordinator's `gw<index>` iteration.
fn worker_file(dest: &Path, worker: &str) -> PathBuf {
    PathBuf::from(format!("{}_{worker}", dest.display()))
}
