use super::question::{QuizQuestion, DISTRACTOR_COUNT};
use crate::curriculum::{Curriculum, Item, TierId};
use crate::error::UnknownTier;
use rand::seq::SliceRandom;
use rand::Rng;

/// Builds multiple-choice quizzes from a curriculum.
#[derive(Debug, Clone, Copy)]
pub struct QuizGenerator<'a> {
    curriculum: &'a Curriculum,
}

impl<'a> QuizGenerator<'a> {
    pub fn new(curriculum: &'a Curriculum) -> Self {
        Self { curriculum }
    }

    /// Up to `count` questions on `tier`, each item at most once.
    ///
    /// A tier without quizzable items borrows from the whole catalog; an
    /// entirely unusable catalog yields an empty quiz.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        tier: &TierId,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<QuizQuestion>, UnknownTier> {
        let pool = self.pool(tier)?;
        if pool.is_empty() {
            tracing::warn!("no quizzable items anywhere, tier {tier} quiz is empty");
            return Ok(Vec::new());
        }

        let mut selected = pool.clone();
        selected.shuffle(rng);
        selected.truncate(count.min(pool.len()));

        let questions: Vec<QuizQuestion> = selected
            .into_iter()
            .map(|item| build_question(item, &pool, &mut *rng))
            .collect();

        tracing::debug!(
            "generated {} questions for tier {tier} from a pool of {}",
            questions.len(),
            pool.len()
        );
        Ok(questions)
    }

    /// Same as [`generate`](Self::generate) with the thread-local RNG.
    pub fn generate_quiz(
        &self,
        tier: &TierId,
        count: usize,
    ) -> Result<Vec<QuizQuestion>, UnknownTier> {
        self.generate(tier, count, &mut rand::thread_rng())
    }

    /// Quizzable items of `tier`, or of the whole catalog when the tier has none.
    fn pool(&self, tier: &TierId) -> Result<Vec<&'a Item>, UnknownTier> {
        let in_tier = self.curriculum.usable_items_in(tier)?;
        if in_tier.is_empty() {
            Ok(self.curriculum.usable_items())
        } else {
            Ok(in_tier)
        }
    }
}

fn build_question<R: Rng + ?Sized>(item: &Item, pool: &[&Item], rng: &mut R) -> QuizQuestion {
    let others: Vec<&Item> = pool
        .iter()
        .copied()
        .filter(|other| other.id != item.id && other.meaning != item.meaning)
        .collect();
    let candidates = Curriculum::distinct_meanings(&others);

    let mut answers: Vec<String> = Vec::with_capacity(DISTRACTOR_COUNT + 1);
    answers.push(item.meaning.clone());
    answers.extend(
        candidates
            .choose_multiple(rng, DISTRACTOR_COUNT)
            .map(|m| m.to_string()),
    );
    answers.shuffle(rng);

    let question = QuizQuestion {
        item_id: item.id,
        glyph: item.glyph.clone(),
        correct_answer: item.meaning.clone(),
        answers,
        tier: item.tier.clone(),
        radical: item.radical.clone(),
        strokes: item.strokes,
    };
    if question.is_degraded() {
        tracing::warn!(
            "question for item {} has only {} distractors",
            item.id,
            question.distractor_count()
        );
    }
    question
}
