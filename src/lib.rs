// Progression and mastery engine for Joyo kanji quizzes.
// The presentation layer (screens, navigation, theming) lives elsewhere and
// drives this crate through the re-exports below.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod mastery;
pub mod progression;
pub mod quiz;
pub mod util;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigStore, EngineConfig, FileConfigStore, UnlockThreshold};
pub use curriculum::{Curriculum, Item, ItemId, Tier, TierFilter, TierId};
pub use error::{CurriculumError, RecordError, StoreError, UnknownTier};
pub use mastery::{
    FileLearnerStore, LearnerState, LearnerStore, MasteryRecord, MemoryLearnerStore,
    SqliteLearnerStore,
};
pub use progression::{
    OutcomeSummary, ProgressionEngine, QuizOutcome, QuizScore, ScoreBand, TierProgress,
};
pub use quiz::{QuizGenerator, QuizQuestion};
