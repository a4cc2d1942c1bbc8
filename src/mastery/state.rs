use crate::curriculum::{Curriculum, ItemId, TierId};
use crate::error::UnknownTier;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Learner history for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub item_id: ItemId,
    pub correct_count: u32,
    /// Set once, when `correct_count` first reaches the mastery threshold.
    #[serde(default)]
    pub mastered_at: Option<DateTime<Local>>,
}

impl MasteryRecord {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            correct_count: 0,
            mastered_at: None,
        }
    }

    pub fn is_mastered(&self) -> bool {
        self.mastered_at.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearnerStats {
    pub streak_days: u32,
    pub last_active_date: Option<NaiveDate>,
    pub total_xp: u64,
    pub quizzes_completed: u32,
}

impl LearnerStats {
    /// Count `today` as an active day: same day keeps the streak, the next day
    /// extends it, anything else starts over.
    pub fn mark_active(&mut self, today: NaiveDate) {
        self.streak_days = match self.last_active_date {
            Some(last) if last == today => self.streak_days.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.streak_days.saturating_add(1),
            // A clock that went backwards is not a new day.
            Some(last) if last > today => self.streak_days.max(1),
            _ => 1,
        };
        if self.last_active_date.map_or(true, |last| last < today) {
            self.last_active_date = Some(today);
        }
    }
}

/// Everything persisted about one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerState {
    pub current_tier: TierId,
    /// Always a prefix of the tier ladder.
    pub unlocked_tiers: Vec<TierId>,
    #[serde(default)]
    pub sessions_by_tier: BTreeMap<TierId, u32>,
    #[serde(default)]
    pub mastery_by_item: BTreeMap<ItemId, MasteryRecord>,
    #[serde(default)]
    pub stats: LearnerStats,
}

impl LearnerState {
    pub fn new(first_tier: TierId) -> Self {
        Self {
            current_tier: first_tier.clone(),
            unlocked_tiers: vec![first_tier],
            sessions_by_tier: BTreeMap::new(),
            mastery_by_item: BTreeMap::new(),
            stats: LearnerStats::default(),
        }
    }

    /// Fresh learner: first tier open, nothing played.
    pub fn initial(curriculum: &Curriculum) -> Self {
        Self::new(curriculum.first_tier().id.clone())
    }

    pub fn is_unlocked(&self, tier: &TierId) -> bool {
        self.unlocked_tiers.contains(tier)
    }

    pub fn sessions_played(&self, tier: &TierId) -> u32 {
        self.sessions_by_tier.get(tier).copied().unwrap_or(0)
    }

    pub fn record(&self, item: ItemId) -> Option<&MasteryRecord> {
        self.mastery_by_item.get(&item)
    }

    pub fn correct_count(&self, item: ItemId) -> u32 {
        self.record(item).map_or(0, |r| r.correct_count)
    }

    pub fn is_mastered(&self, item: ItemId) -> bool {
        self.record(item).is_some_and(MasteryRecord::is_mastered)
    }

    pub fn mastered_count(
        &self,
        curriculum: &Curriculum,
        tier: &TierId,
    ) -> Result<usize, UnknownTier> {
        curriculum.count_in_tier(tier, |item| self.is_mastered(item))
    }

    pub fn total_mastered(&self) -> usize {
        self.mastery_by_item
            .values()
            .filter(|r| r.is_mastered())
            .count()
    }

    /// Add `tier` to the unlocked set. Returns false if it already was.
    pub(crate) fn unlock(&mut self, tier: &TierId) -> bool {
        if self.is_unlocked(tier) {
            return false;
        }
        self.unlocked_tiers.push(tier.clone());
        true
    }

    /// Fit state saved against an older catalog onto `curriculum`.
    ///
    /// Unknown tier ids are dropped, the unlocked set is widened back into a
    /// prefix reaching the furthest tier the learner had opened, and the
    /// current tier is moved onto an unlocked one. Item records are kept as is.
    pub fn reconcile(&mut self, curriculum: &Curriculum) {
        let furthest = self
            .unlocked_tiers
            .iter()
            .filter_map(|t| curriculum.rank(t))
            .max()
            .unwrap_or(0);
        self.unlocked_tiers = curriculum.tiers()[..=furthest]
            .iter()
            .map(|t| t.id.clone())
            .collect();

        let before = self.sessions_by_tier.len();
        self.sessions_by_tier
            .retain(|tier, _| curriculum.contains_tier(tier));
        if self.sessions_by_tier.len() != before {
            tracing::warn!(
                "dropped session counts for {} unknown tiers",
                before - self.sessions_by_tier.len()
            );
        }

        if !self.is_unlocked(&self.current_tier) {
            if let Some(last) = self.unlocked_tiers.last() {
                self.current_tier = last.clone();
            }
        }

        for (id, record) in self.mastery_by_item.iter_mut() {
            record.item_id = *id;
        }
    }

    /// Whether `unlocked_tiers` is a non-empty prefix of the ladder.
    pub fn unlocked_is_prefix(&self, curriculum: &Curriculum) -> bool {
        let unique: HashSet<&TierId> = self.unlocked_tiers.iter().collect();
        !self.unlocked_tiers.is_empty()
            && unique.len() == self.unlocked_tiers.len()
            && curriculum
                .tiers()
                .iter()
                .take(self.unlocked_tiers.len())
                .all(|t| unique.contains(&t.id))
    }
}
