//! Run phases

use serde::{Deserialize, Serialize};

/// Where a sync run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Discovering,
    Classifying,
    Processing,
    Collecting,
    Indexing,
    Committing,
    Done,
    /// Dry-run end state
    Previewing,
    /// Fail-fast or cancelled end state
    Aborted,
}

impl SyncPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Previewing | Self::Aborted)
    }

    /// Whether `next` may follow `self`.
    ///
    /// Any non-terminal phase may abort; cancellation can arrive at any
    /// point before the commit finishes.
    pub fn can_transition_to(self, next: SyncPhase) -> bool {
        use SyncPhase::*;
        match (self, next) {
            (Discovering, Classifying)
            | (Classifying, Previewing)
            | (Classifying, Processing)
            | (Processing, Collecting)
            | (Collecting, Indexing)
            | (Indexing, Committing)
            | (Committing, Done) => true,
            (current, Aborted) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Discovering => "discovering",
            Self::Classifying => "classifying",
            Self::Processing => "processing",
            Self::Collecting => "collecting",
            Self::Indexing => "indexing",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Previewing => "previewing",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Tracks the current phase and logs transitions.
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    current: SyncPhase,
}

impl PhaseTracker {
    pub(crate) fn new() -> Self {
        tracing::info!(phase = %SyncPhase::Discovering, "Sync phase");
        Self {
            current: SyncPhase::Discovering,
        }
    }

    pub(crate) fn current(&self) -> SyncPhase {
        self.current
    }

    pub(crate) fn advance(&mut self, next: SyncPhase) {
        debug_assert!(
            self.current.can_transition_to(next),
            "invalid phase transition {} -> {}",
            self.current,
            next
        );
        tracing::info!(from = %self.current, to = %next, "Sync phase");
        self.current = next;
    }
}
