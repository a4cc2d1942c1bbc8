use chrono::NaiveDate;
use joyo_ladder::{
    Curriculum, EngineConfig, FileLearnerStore, FixedClock, ItemId, LearnerState, LearnerStore,
    MemoryLearnerStore, ProgressionEngine, QuizOutcome, RecordError, SqliteLearnerStore,
    StoreError, TierId,
};
use tempfile::tempdir;

fn clock() -> FixedClock {
    FixedClock::on(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
}

#[test]
fn corrupt_document_loads_as_fresh_state() {
    let curriculum = Curriculum::embedded().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("learner.json");
    std::fs::write(&path, b"{ not json at all").unwrap();

    let store = FileLearnerStore::with_path(&path);
    let state = store.load(&curriculum).unwrap();

    assert_eq!(state, LearnerState::initial(&curriculum));
    assert_eq!(state.unlocked_tiers, vec![TierId::from("1")]);
    assert_eq!(state.current_tier, TierId::from("1"));

    let memory = MemoryLearnerStore::from_bytes("\u{0}\u{1}garbage");
    assert_eq!(memory.load(&curriculum).unwrap(), LearnerState::initial(&curriculum));
}

#[test]
fn file_store_survives_engine_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("learner.json");

    let engine = ProgressionEngine::with_clock(
        Curriculum::embedded().unwrap(),
        FileLearnerStore::with_path(&path),
        EngineConfig::default(),
        clock(),
    );
    let summary = engine
        .record_outcome(&TierId::from("1"), &[ItemId(1), ItemId(2)])
        .unwrap();
    drop(engine);

    assert!(path.exists());
    let reopened = ProgressionEngine::with_clock(
        Curriculum::embedded().unwrap(),
        FileLearnerStore::with_path(&path),
        EngineConfig::default(),
        clock(),
    );
    let state = reopened.load_state().unwrap();
    assert_eq!(state, summary.state);
    assert_eq!(state.correct_count(ItemId(1)), 1);
    assert_eq!(state.stats.streak_days, 1);

    let mut names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["learner.json".to_string()]);
}

#[test]
fn sqlite_store_keeps_quiz_history() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("learner.db");

    let engine = ProgressionEngine::with_clock(
        Curriculum::embedded().unwrap(),
        SqliteLearnerStore::open(&db).unwrap(),
        EngineConfig::default(),
        clock(),
    );
    let tier = TierId::from("1");
    engine
        .record_quiz(
            &QuizOutcome::new(tier.clone(), vec![ItemId(1), ItemId(2)]).with_question_count(4),
        )
        .unwrap();
    engine
        .record_quiz(&QuizOutcome::new(tier.clone(), vec![ItemId(1)]).with_question_count(4))
        .unwrap();

    let (history, summary) = engine.with_store(|store| {
        (
            store.history_for_tier(&tier).unwrap(),
            store.tier_summary(&tier).unwrap(),
        )
    });
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|record| record.total == 4));
    assert_eq!(summary.quizzes, 2);
    assert_eq!(summary.total_xp, engine.load_state().unwrap().stats.total_xp);
    drop(engine);

    let reopened = SqliteLearnerStore::open(&db).unwrap();
    let state = reopened.load(&Curriculum::embedded().unwrap()).unwrap();
    assert_eq!(state.correct_count(ItemId(1)), 2);
    assert_eq!(state.sessions_played(&tier), 2);
    assert_eq!(reopened.quiz_count().unwrap(), 2);
}

#[test]
fn unreadable_state_file_is_left_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("learner.json");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep.txt"), b"progress").unwrap();

    let engine = ProgressionEngine::with_clock(
        Curriculum::embedded().unwrap(),
        FileLearnerStore::with_path(&path),
        EngineConfig::default(),
        clock(),
    );

    assert!(matches!(engine.load_state(), Err(StoreError::Io(_))));
    let err = engine
        .record_outcome(&TierId::from("1"), &[ItemId(1)])
        .unwrap_err();
    assert!(matches!(err, RecordError::Load(StoreError::Io(_))));
    assert!(path.is_dir());
    assert_eq!(std::fs::read(path.join("keep.txt")).unwrap(), b"progress");
}
