//! Durable learner state: per-item mastery, per-tier sessions, unlocks, streaks.

pub mod sqlite;
pub mod state;
pub mod store;

pub use sqlite::{QuizRecord, SqliteLearnerStore, TierHistory};
pub use state::{LearnerState, LearnerStats, MasteryRecord};
pub use store::{FileLearnerStore, LearnerStore, MemoryLearnerStore};
