pub mod engine;
pub mod rules;
pub mod summary;

pub use engine::ProgressionEngine;
pub use rules::{overview, quiz_xp, record_outcome, tier_progress, QuizOutcome, TierProgress};
pub use summary::{OutcomeSummary, QuizScore, ScoreBand};
