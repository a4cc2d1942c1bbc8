//! Pure progression logic: no I/O, no hidden state.
//!
//! `record_outcome` is the only state transition. It takes the learner state
//! before a quiz and returns the state after it, alongside what changed.

use super::summary::{OutcomeSummary, QuizScore};
use crate::config::{EngineConfig, UnlockThreshold};
use crate::curriculum::{Curriculum, ItemId, TierId};
use crate::error::UnknownTier;
use crate::mastery::{LearnerState, MasteryRecord};
use crate::util::percentage;
use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::Serialize;

/// A finished quiz as reported by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub tier: TierId,
    pub correct_item_ids: Vec<ItemId>,
    /// Questions asked; `None` when the caller only tracked correct answers.
    pub question_count: Option<usize>,
}

impl QuizOutcome {
    pub fn new(tier: TierId, correct_item_ids: Vec<ItemId>) -> Self {
        Self {
            tier,
            correct_item_ids,
            question_count: None,
        }
    }

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = Some(count);
        self
    }
}

/// Point-in-time view of one tier, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierProgress {
    pub tier: TierId,
    pub label: String,
    pub mastered_count: usize,
    pub total_items: usize,
    /// Items a quiz can ask; placeholder meanings are left out.
    pub quizzable_items: usize,
    pub sessions_played: u32,
    pub unlock: UnlockThreshold,
    pub unlocked: bool,
    /// This tier's requirement for opening the next one is satisfied.
    pub threshold_met: bool,
    /// Fill level of the tier's progress bar, 0..=100.
    pub percent: u32,
}

/// XP for `correct` answers on a tier at `rank`.
///
/// Grows with both the number of correct answers and the tier rank.
pub fn quiz_xp(config: &EngineConfig, correct: usize, rank: usize, perfect: bool) -> u64 {
    let per_answer = config.xp_per_correct as u64 + rank as u64 * config.xp_tier_bonus as u64;
    let bonus = if perfect && correct > 0 {
        config.perfect_quiz_bonus as u64
    } else {
        0
    };
    correct as u64 * per_answer + bonus
}

/// Requirement on `tier` for the next tier to open.
///
/// Comes from `config`, with the item goal capped at the number of quizzable
/// items so that every tier stays passable.
pub fn unlock_threshold(
    config: &EngineConfig,
    curriculum: &Curriculum,
    tier: &TierId,
) -> Result<UnlockThreshold, UnknownTier> {
    let quizzable = curriculum.usable_count(tier)?;
    Ok(config.unlock_threshold_for(tier).clamped_to(quizzable))
}

/// Apply a finished quiz to `state`.
///
/// Sessions and correct counts are bumped first; unlocks are then evaluated
/// once against the tiers that were already open when the quiz was played,
/// so a single quiz opens at most the tier right after each of them.
pub fn record_outcome(
    state: &LearnerState,
    outcome: &QuizOutcome,
    curriculum: &Curriculum,
    config: &EngineConfig,
    now: DateTime<Local>,
) -> Result<OutcomeSummary, UnknownTier> {
    let played = curriculum.tier(&outcome.tier)?;
    let mut next = state.clone();

    let sessions = next.sessions_by_tier.entry(played.id.clone()).or_insert(0);
    *sessions = sessions.saturating_add(1);

    let mut correct = 0usize;
    let mut newly_mastered = 0usize;
    for &item_id in outcome.correct_item_ids.iter().unique() {
        if curriculum.item(item_id).is_none() {
            tracing::warn!("ignoring unknown item {item_id} in quiz outcome");
            continue;
        }
        correct += 1;

        let record = next
            .mastery_by_item
            .entry(item_id)
            .or_insert_with(|| MasteryRecord::new(item_id));
        record.correct_count = record.correct_count.saturating_add(1);
        if record.mastered_at.is_none() && record.correct_count >= config.mastery_threshold {
            record.mastered_at = Some(now);
            newly_mastered += 1;
            tracing::debug!(
                "item {item_id} mastered after {} correct answers",
                record.correct_count
            );
        }
    }

    let score = QuizScore::new(correct, outcome.question_count.unwrap_or(correct).max(correct));
    let perfect = outcome.question_count.is_some() && score.is_perfect();
    let gained_xp = quiz_xp(config, correct, played.rank, perfect);

    let newly_unlocked = evaluate_unlocks(state, &mut next, curriculum, config);

    if let Some(highest) = newly_unlocked.last() {
        next.current_tier = highest.clone();
    } else if next.is_unlocked(&played.id) {
        next.current_tier = played.id.clone();
    }

    next.stats.mark_active(now.date_naive());
    next.stats.total_xp = next.stats.total_xp.saturating_add(gained_xp);
    next.stats.quizzes_completed = next.stats.quizzes_completed.saturating_add(1);

    Ok(OutcomeSummary {
        state: next,
        tier: played.id.clone(),
        gained_xp,
        newly_unlocked,
        newly_mastered,
        score,
        completed_at: now,
    })
}

/// Open every tier whose predecessor was open before the quiz and now meets
/// its threshold. Returns the tiers opened, in ladder order.
fn evaluate_unlocks(
    before: &LearnerState,
    next: &mut LearnerState,
    curriculum: &Curriculum,
    config: &EngineConfig,
) -> Vec<TierId> {
    let mut opened = Vec::new();
    for (gate, target) in curriculum.tiers().iter().tuple_windows() {
        if !before.is_unlocked(&gate.id) || next.is_unlocked(&target.id) {
            continue;
        }
        let mastered = curriculum
            .count_in_tier(&gate.id, |item| next.is_mastered(item))
            .unwrap_or(0);
        let sessions = next.sessions_played(&gate.id);
        let Ok(threshold) = unlock_threshold(config, curriculum, &gate.id) else {
            continue;
        };
        if threshold.is_met(mastered, sessions) && next.unlock(&target.id) {
            tracing::info!(
                "unlocked {} ({mastered} mastered, {sessions} sessions in {})",
                target.label,
                gate.label
            );
            opened.push(target.id.clone());
        }
    }
    opened
}

/// Progress of `tier` as seen from `state`. Pure read.
pub fn tier_progress(
    state: &LearnerState,
    curriculum: &Curriculum,
    config: &EngineConfig,
    tier: &TierId,
) -> Result<TierProgress, UnknownTier> {
    let meta = curriculum.tier(tier)?;
    let mastered_count = state.mastered_count(curriculum, tier)?;
    let quizzable_items = curriculum.usable_count(tier)?;
    let unlock = unlock_threshold(config, curriculum, tier)?;
    let sessions_played = state.sessions_played(tier);
    let unlocked = meta.rank == 0 || state.is_unlocked(tier);

    Ok(TierProgress {
        tier: meta.id.clone(),
        label: meta.label.clone(),
        mastered_count,
        total_items: meta.item_ids.len(),
        quizzable_items,
        sessions_played,
        unlock,
        unlocked,
        threshold_met: unlock.is_met(mastered_count, sessions_played),
        percent: percentage(mastered_count, quizzable_items).min(100),
    })
}

/// Progress of every tier, in ladder order.
pub fn overview(
    state: &LearnerState,
    curriculum: &Curriculum,
    config: &EngineConfig,
) -> Vec<TierProgress> {
    curriculum
        .tiers()
        .iter()
        .filter_map(|tier| tier_progress(state, curriculum, config, &tier.id).ok())
        .collect()
}
