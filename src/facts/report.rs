//! Outbound Result Documents
//!
//! What the gatherer prints for its caller: either the collected facts or a
//! failure message. Both are plain serde structs so the CLI can render them
//! as JSON or YAML.

use crate::error::Error;
use crate::facts::table::FactSet;
use serde::{Deserialize, Serialize};

/// Requested state; `info` is the only value and does not change behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Info,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Info => write!(f, "info"),
        }
    }
}

/// Successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherResult {
    pub state: State,
    pub changed: bool,
    pub ontap_facts: FactSet,
}

impl GatherResult {
    /// Wrap collected facts; gathering never changes the cluster
    pub fn new(state: State, ontap_facts: FactSet) -> Self {
        Self {
            state,
            changed: false,
            ontap_facts,
        }
    }
}

/// Failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherFailure {
    pub failed: bool,
    pub msg: String,
}

impl From<&Error> for GatherFailure {
    fn from(err: &Error) -> Self {
        Self {
            failed: true,
            msg: err.to_string(),
        }
    }
}
