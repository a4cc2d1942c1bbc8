use crate::curriculum::TierId;
use crate::mastery::LearnerState;
use crate::util::percentage;
use chrono::{DateTime, Local};
use serde::Serialize;

/// How a quiz went, for the results screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn new(correct: usize, total: usize) -> Self {
        Self { correct, total }
    }

    pub fn percentage(&self) -> u32 {
        percentage(self.correct, self.total)
    }

    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct >= self.total
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_percentage(self.percentage())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum ScoreBand {
    #[strum(to_string = "Excellent!")]
    Excellent,
    #[strum(to_string = "Great job!")]
    Great,
    #[strum(to_string = "Not bad!")]
    Fair,
    #[strum(to_string = "Keep practicing!")]
    KeepPracticing,
}

impl ScoreBand {
    pub fn for_percentage(pct: u32) -> Self {
        match pct {
            90.. => ScoreBand::Excellent,
            70..=89 => ScoreBand::Great,
            50..=69 => ScoreBand::Fair,
            _ => ScoreBand::KeepPracticing,
        }
    }
}

/// Everything a recorded quiz changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeSummary {
    /// Learner state after the quiz.
    pub state: LearnerState,
    pub tier: TierId,
    pub gained_xp: u64,
    /// Tiers opened by this quiz, in ladder order.
    pub newly_unlocked: Vec<TierId>,
    pub newly_mastered: usize,
    pub score: QuizScore,
    pub completed_at: DateTime<Local>,
}
