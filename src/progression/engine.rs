use super::rules::{self, QuizOutcome, TierProgress};
use super::summary::OutcomeSummary;
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, UnlockThreshold};
use crate::curriculum::{Curriculum, ItemId, Tier, TierId};
use crate::error::{RecordError, StoreError, UnknownTier};
use crate::mastery::{LearnerState, LearnerStore};
use crate::quiz::{QuizGenerator, QuizQuestion};
use rand::Rng;
use std::sync::{Mutex, MutexGuard};

/// Front door for the presentation layer.
///
/// Owns the curriculum, the learner store and the clock. Recording a quiz
/// holds the store lock across load, transition and save, so concurrent
/// submissions are applied one after the other instead of overwriting each
/// other.
pub struct ProgressionEngine<S: LearnerStore, C: Clock = SystemClock> {
    curriculum: Curriculum,
    config: EngineConfig,
    store: Mutex<S>,
    clock: C,
}

impl<S: LearnerStore> ProgressionEngine<S, SystemClock> {
    pub fn new(curriculum: Curriculum, store: S, config: EngineConfig) -> Self {
        Self::with_clock(curriculum, store, config, SystemClock)
    }
}

impl<S: LearnerStore, C: Clock> ProgressionEngine<S, C> {
    pub fn with_clock(curriculum: Curriculum, store: S, config: EngineConfig, clock: C) -> Self {
        Self {
            curriculum,
            config,
            store: Mutex::new(store),
            clock,
        }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tiers(&self) -> &[Tier] {
        self.curriculum.tiers()
    }

    pub fn quiz_generator(&self) -> QuizGenerator<'_> {
        QuizGenerator::new(&self.curriculum)
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        tier: &TierId,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<QuizQuestion>, UnknownTier> {
        self.quiz_generator().generate(tier, count, rng)
    }

    /// A quiz of the configured default length.
    pub fn generate_default<R: Rng + ?Sized>(
        &self,
        tier: &TierId,
        rng: &mut R,
    ) -> Result<Vec<QuizQuestion>, UnknownTier> {
        self.generate(tier, self.config.default_question_count, rng)
    }

    fn lock_store(&self) -> MutexGuard<'_, S> {
        // A panic mid-save leaves the store usable; the saved document is
        // either the old or the new one.
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn load_state(&self) -> Result<LearnerState, StoreError> {
        self.lock_store().load(&self.curriculum)
    }

    pub fn tier_progress(
        &self,
        state: &LearnerState,
        tier: &TierId,
    ) -> Result<TierProgress, UnknownTier> {
        rules::tier_progress(state, &self.curriculum, &self.config, tier)
    }

    pub fn overview(&self, state: &LearnerState) -> Vec<TierProgress> {
        rules::overview(state, &self.curriculum, &self.config)
    }

    /// Effective unlock requirement of `tier` under this engine's config.
    pub fn unlock_threshold(&self, tier: &TierId) -> Result<UnlockThreshold, UnknownTier> {
        rules::unlock_threshold(&self.config, &self.curriculum, tier)
    }

    /// Record which items were answered correctly in a quiz on `tier`.
    pub fn record_outcome(
        &self,
        tier: &TierId,
        correct_item_ids: &[ItemId],
    ) -> Result<OutcomeSummary, RecordError> {
        self.record_quiz(&QuizOutcome::new(tier.clone(), correct_item_ids.to_vec()))
    }

    /// Apply `outcome` to the stored learner state and persist the result.
    ///
    /// On a failed save the computed summary travels inside
    /// [`RecordError::Persist`]; nothing is lost, and the store still holds
    /// the previous state. A store that cannot be read is left untouched.
    pub fn record_quiz(&self, outcome: &QuizOutcome) -> Result<OutcomeSummary, RecordError> {
        let mut store = self.lock_store();
        let state = store.load(&self.curriculum).map_err(RecordError::Load)?;
        let summary = rules::record_outcome(
            &state,
            outcome,
            &self.curriculum,
            &self.config,
            self.clock.now(),
        )?;

        match store.save_outcome(&summary) {
            Ok(()) => Ok(summary),
            Err(source) => {
                tracing::warn!("failed to save quiz on tier {}: {source}", summary.tier);
                Err(RecordError::Persist {
                    summary: Box::new(summary),
                    source,
                })
            }
        }
    }

    /// Retry persisting a state whose save failed earlier.
    pub fn save_state(&self, state: &LearnerState) -> Result<(), StoreError> {
        self.lock_store().save(state)
    }

    /// Run `f` against the store, e.g. to read quiz history.
    pub fn with_store<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let store = self.lock_store();
        f(&*store)
    }

    pub fn into_store(self) -> S {
        self.store
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::mastery::MemoryLearnerStore;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    /// Loads like a memory store but refuses every save.
    #[derive(Default)]
    struct ReadOnlyStore {
        inner: MemoryLearnerStore,
    }

    impl LearnerStore for ReadOnlyStore {
        fn load(&self, curriculum: &Curriculum) -> Result<LearnerState, StoreError> {
            self.inner.load(curriculum)
        }

        fn save(&mut self, _state: &LearnerState) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    /// Holds a document it can no longer read.
    #[derive(Default)]
    struct UnreadableStore {
        saves: usize,
    }

    impl LearnerStore for UnreadableStore {
        fn load(&self, _curriculum: &Curriculum) -> Result<LearnerState, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            )))
        }

        fn save(&mut self, _state: &LearnerState) -> Result<(), StoreError> {
            self.saves += 1;
            Ok(())
        }
    }

    fn engine() -> ProgressionEngine<MemoryLearnerStore, FixedClock> {
        let mut config = EngineConfig::default();
        config
            .unlock_thresholds
            .insert("1".into(), UnlockThreshold::new(2, 2));
        ProgressionEngine::with_clock(
            Curriculum::embedded().unwrap(),
            MemoryLearnerStore::new(),
            config,
            FixedClock::on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
        )
    }

    #[test]
    fn test_config_thresholds_are_applied() {
        let engine = engine();
        assert_eq!(
            engine.unlock_threshold(&"1".into()),
            Ok(UnlockThreshold::new(2, 2))
        );
        assert_eq!(
            engine.unlock_threshold(&"2".into()),
            Ok(UnlockThreshold::new(10, 3))
        );
    }

    #[test]
    fn test_record_outcome_persists() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(8);
        let questions = engine.generate_default(&"1".into(), &mut rng).unwrap();
        assert_eq!(questions.len(), 10);

        let correct: Vec<ItemId> = questions.iter().take(4).map(|q| q.item_id).collect();
        let summary = engine.record_outcome(&"1".into(), &correct).unwrap();

        let loaded = engine.load_state().unwrap();
        assert_eq!(loaded, summary.state);
        assert_eq!(loaded.sessions_played(&"1".into()), 1);
        assert_eq!(loaded.stats.last_active_date, NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn test_failed_save_still_returns_summary() {
        let engine = ProgressionEngine::new(
            Curriculum::embedded().unwrap(),
            ReadOnlyStore::default(),
            EngineConfig::default(),
        );
        let outcome =
            QuizOutcome::new("1".into(), vec![ItemId(1), ItemId(2)]).with_question_count(2);
        let err = engine.record_quiz(&outcome).unwrap_err();

        let summary = err.summary().cloned();
        assert_matches!(err, RecordError::Persist { source: StoreError::Io(_), .. });
        let summary = summary.unwrap();
        assert_eq!(summary.state.correct_count(ItemId(1)), 1);
        assert!(summary.gained_xp > 0);
        assert_eq!(engine.load_state().unwrap().correct_count(ItemId(1)), 0);
    }

    #[test]
    fn test_unreadable_store_is_not_overwritten() {
        let engine = ProgressionEngine::new(
            Curriculum::embedded().unwrap(),
            UnreadableStore::default(),
            EngineConfig::default(),
        );
        let err = engine.record_outcome(&"1".into(), &[ItemId(1)]).unwrap_err();

        assert_matches!(err, RecordError::Load(StoreError::Io(_)));
        assert!(err.summary().is_none());
        assert_eq!(engine.into_store().saves, 0);
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let engine = engine();
        assert_matches!(
            engine.record_outcome(&"9".into(), &[ItemId(1)]),
            Err(RecordError::UnknownTier(_))
        );
        assert_eq!(engine.load_state().unwrap().stats.quizzes_completed, 0);
        assert!(engine.into_store().is_empty());
    }

    #[test]
    fn test_concurrent_submissions_are_serialized() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine
                        .record_outcome(&"1".into(), &[ItemId(1)])
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = engine.load_state().unwrap();
        assert_eq!(state.sessions_played(&"1".into()), 8);
        assert_eq!(state.correct_count(ItemId(1)), 8);
        assert_eq!(state.stats.quizzes_completed, 8);
    }

    #[test]
    fn test_snapshot_is_stable_between_records() {
        let engine = engine();
        engine.record_outcome(&"1".into(), &[ItemId(1)]).unwrap();
        let state = engine.load_state().unwrap();
        let first = engine.overview(&state);
        let second = engine.overview(&state);
        assert_eq!(first, second);
        assert_eq!(
            engine.tier_progress(&state, &"1".into()).unwrap(),
            first[0]
        );
    }
}
