use crate::curriculum::{ItemId, TierId};
use serde::Serialize;

/// Number of wrong choices a full question carries.
pub const DISTRACTOR_COUNT: usize = 3;

/// One multiple-choice question; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizQuestion {
    pub item_id: ItemId,
    pub glyph: String,
    pub correct_answer: String,
    /// Distinct meanings in display order, `correct_answer` exactly once.
    pub answers: Vec<String>,
    pub tier: TierId,
    pub radical: Option<String>,
    pub strokes: Option<u32>,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.answers.iter().position(|a| a == &self.correct_answer)
    }

    pub fn distractor_count(&self) -> usize {
        self.answers.len().saturating_sub(1)
    }

    /// Fewer wrong choices than usual because the pool was too small.
    pub fn is_degraded(&self) -> bool {
        self.distractor_count() < DISTRACTOR_COUNT
    }
}

/// Item ids of the questions whose chosen answer was right.
///
/// `chosen` is matched to `questions` by position; unanswered questions count as wrong.
pub fn correct_item_ids(questions: &[QuizQuestion], chosen: &[Option<&str>]) -> Vec<ItemId> {
    questions
        .iter()
        .zip(chosen.iter())
        .filter_map(|(question, answer)| match answer {
            Some(a) if question.is_correct(a) => Some(question.item_id),
            _ => None,
        })
        .collect()
}
