//! Observable controller state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Address, TopicSet};

/// The phase of the controller's single in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationPhase {
    /// Nothing has happened yet, or the last refresh completed.
    #[default]
    Idle,
    /// A read or a mutation is in flight.
    Loading,
    /// The last mutation was confirmed by the registry.
    Succeeded,
    /// The last operation failed; the controller may be retried.
    Failed,
}

impl OperationPhase {
    /// Intents are accepted in every phase except `Loading`.
    pub fn accepts_intents(self) -> bool { self != Self::Loading }

    /// Lowercase name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OperationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Point-in-time snapshot of the controller, regenerated on every transition.
///
/// This is the only artifact a presentation layer ever sees. Holding on to
/// a `ViewState` never observes later transitions; subscribe to the
/// controller to receive new snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Registry the snapshot was read from, if one is configured.
    pub registry: Option<Address>,
    /// Topics from the last successful read, in registry order.
    pub topics: TopicSet,
    /// Whether the resolved caller is the registry owner.
    pub authorized: bool,
    /// Phase of the current or most recent operation.
    pub phase: OperationPhase,
    /// Human-readable outcome of the most recent operation.
    pub message: Option<String>,
}

impl ViewState {
    /// Whether the snapshot ended in `Failed`.
    pub fn is_failed(&self) -> bool { self.phase == OperationPhase::Failed }
}
