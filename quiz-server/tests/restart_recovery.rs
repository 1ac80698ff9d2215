//! Durability across process restarts (on-disk database)

use quiz_server::{Config, DeliveryEngine, QuizStorage, ServerState};
use shared::QuestionContent;

#[test]
fn sequence_continues_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quiz.redb");

    {
        let engine = DeliveryEngine::new(QuizStorage::open(&path).unwrap(), 16).unwrap();
        for text in ["Q1", "Q2", "Q3"] {
            engine.create_question(QuestionContent::new(text)).unwrap();
        }
        engine.record_ack("c1", 2).unwrap();
    }

    let engine = DeliveryEngine::new(QuizStorage::open(&path).unwrap(), 16).unwrap();
    assert_eq!(engine.current_seq(), 3);

    let next = engine.create_question(QuestionContent::new("Q4")).unwrap();
    assert_eq!(next.seq, 4);

    // Ack records survive too
    let backlog: Vec<u64> = engine.reconcile("c1", 0).unwrap().iter().map(|q| q.seq).collect();
    assert_eq!(backlog, vec![1, 3, 4]);
    assert_eq!(engine.client_ack("c1").unwrap().unwrap().high_water_mark, 2);
}

#[test]
fn server_state_creates_database_under_work_dir() {
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().to_string_lossy().to_string();
    let config = Config::with_overrides(work_dir, 0);

    {
        let state = ServerState::initialize(&config).unwrap();
        state
            .engine
            .create_question(QuestionContent::new("persisted"))
            .unwrap();
    }
    assert!(config.database_path().exists());

    let state = ServerState::initialize(&config).unwrap();
    assert_eq!(state.engine.current_seq(), 1);
    assert_eq!(state.engine.get_question(1).unwrap().text(), "persisted");
}
