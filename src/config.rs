//! Run configuration consumed from the host runner's CLI and environment.
//!
//! The core never owns a top-level CLI; a host flattens these options into
//! its own parser.

use clap::Args;
use std::env;
use std::path::PathBuf;

/// Environment variable naming this process as one worker of a distributed
/// fleet (worker ids follow the `gw<index>` convention).
pub const WORKER_ENV: &str = "FIXTURE_CACHE_WORKER";

/// Persistence options for one test run. Either, both, or neither of
/// `store`/`load` may be set; the plugin is inert when neither is.
#[derive(Args, Debug, Clone, Default)]
pub struct RunConfig {
    /// Store fixture results to this snapshot file at session end
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Load fixture results from a prior run's snapshot file
    #[arg(long, value_name = "FILE")]
    pub load: Option<PathBuf>,

    /// Number of distributed workers whose files the coordinator merges
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Identity of this process when running as a distributed worker
    #[arg(skip)]
    pub worker: Option<String>,
}

impl RunConfig {
    /// True when the run wants persistence at all.
    pub fn is_active(&self) -> bool {
        self.store.is_some() || self.load.is_some()
    }

    /// Fill in the worker identity from the environment, if present.
    pub fn detect_worker(mut self) -> Self {
        if self.worker.is_none() {
            self.worker = env::var(WORKER_ENV).ok().filter(|id| !id.is_empty());
        }
        self
    }
}
