//! Error types shared across the engine.
//!
//! Only failures a caller can act on are errors. Degraded quiz questions and
//! corrupt persisted state are recovered where they happen and reported
//! through `tracing` instead.

use crate::curriculum::{ItemId, TierId};
use crate::progression::OutcomeSummary;
use thiserror::Error;

/// A tier id outside the curriculum's closed tier set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tier `{0}`")]
pub struct UnknownTier(pub TierId);

/// Failures while loading a curriculum catalog.
#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate item id {0}")]
    DuplicateItem(ItemId),

    #[error("catalog contains no items")]
    Empty,
}

/// Failures while persisting learner state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("learner state I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize learner state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("learner database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Failures while recording a completed quiz.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    UnknownTier(#[from] UnknownTier),

    /// The stored state could not be read, so nothing was recorded.
    #[error("failed to load learner state: {0}")]
    Load(#[source] StoreError),

    /// The outcome was computed but could not be saved. The summary is kept so
    /// the results can still be shown and the save retried.
    #[error("quiz outcome computed but not saved: {source}")]
    Persist {
        summary: Box<OutcomeSummary>,
        #[source]
        source: StoreError,
    },
}

impl RecordError {
    /// The computed summary, if the failure happened after the state transition.
    pub fn summary(&self) -> Option<&OutcomeSummary> {
        match self {
            RecordError::Persist { summary, .. } => Some(summary),
            RecordError::UnknownTier(_) | RecordError::Load(_) => None,
        }
    }

    pub fn into_summary(self) -> Option<OutcomeSummary> {
        match self {
            RecordError::Persist { summary, .. } => Some(*summary),
            RecordError::UnknownTier(_) | RecordError::Load(_) => None,
        }
    }
}
