//! Scope-aware fixture result cache for test runners.
//!
//! A run with a store destination captures every serializable fixture result
//! into a scope-keyed tree and writes it as one JSON snapshot at session end;
//! a run with a load source replays stored results instead of recomputing
//! them. The host runner owns fixture semantics, test addressing, and the
//! CLI; this crate owns the cache.
//!
//! ```
//! use fixture_persistence::{FixtureRequest, Plugin, RunConfig, Scope};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = RunConfig::default().detect_worker();
//! let mut plugin = Plugin::new(config);
//! plugin.on_session_start()?;
//! let request = FixtureRequest::new("fnc", Scope::Module, "tests/test_x.py::test_a");
//! let value: Vec<u32> = plugin.on_fixture_setup(&request, || Ok(vec![1, 2]))?;
//! plugin.on_session_finish()?;
//! # assert_eq!(value, vec![1, 2]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gate;
pub mod scope;
pub mod session;
pub mod store;

pub use config::{RunConfig, WORKER_ENV};
pub use gate::{can_persist, FixtureSets};
pub use scope::Scope;
pub use session::{FixtureRequest, Plugin};
pub use store::StoreTree;
