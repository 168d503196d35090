//! Fixture lifetime granularity as classified by the host runner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifetime granularity of a fixture, from widest to narrowest.
///
/// The host runner classifies each fixture; the store uses the scope to pick
/// an addressing shape (session is flat, every other scope is keyed by the
/// test node as well).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Session,
    Package,
    Module,
    Class,
    Function,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Session => "session",
            Scope::Package => "package",
            Scope::Module => "module",
            Scope::Class => "class",
            Scope::Function => "function",
        }
    }

    /// All scopes, in tree-field order.
    pub fn all() -> [Scope; 5] {
        [
            Scope::Session,
            Scope::Package,
            Scope::Module,
            Scope::Class,
            Scope::Function,
        ]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session" => Ok(Scope::Session),
            "package" => Ok(Scope::Package),
            "module" => Ok(Scope::Module),
            "class" => Ok(Scope::Class),
            "function" => Ok(Scope::Function),
            other => Err(anyhow::anyhow!("unknown fixture scope: {other}")),
        }
    }
}
