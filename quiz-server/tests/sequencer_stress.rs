//! Concurrency stress: parallel creators, ackers and readers

use std::collections::BTreeSet;
use std::sync::Arc;

use quiz_server::{DeliveryEngine, QuizStorage};
use rand::seq::SliceRandom;
use shared::QuestionContent;

const CREATORS: usize = 16;
const PER_CREATOR: usize = 20;
const TOTAL: u64 = (CREATORS * PER_CREATOR) as u64;

fn engine() -> Arc<DeliveryEngine> {
    Arc::new(DeliveryEngine::new(QuizStorage::open_in_memory().unwrap(), TOTAL as usize).unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_creation_is_dense_and_pushed_in_order() {
    let engine = engine();
    let mut live = engine.subscribe("watcher");

    let mut handles = Vec::new();
    for creator in 0..CREATORS {
        let engine = engine.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            (0..PER_CREATOR)
                .map(|i| {
                    engine
                        .create_question(QuestionContent::new(format!("{creator}-{i}")))
                        .unwrap()
                        .seq
                })
                .collect::<Vec<_>>()
        }));
    }

    let mut assigned = BTreeSet::new();
    for handle in handles {
        for seq in handle.await.unwrap() {
            assert!(assigned.insert(seq), "seq {seq} assigned twice");
        }
    }
    assert_eq!(assigned, (1..=TOTAL).collect::<BTreeSet<_>>());

    // The live session saw every item, strictly ascending
    let pushed: Vec<u64> = std::iter::from_fn(|| live.try_recv()).map(|q| q.seq).collect();
    assert_eq!(pushed, (1..=TOTAL).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_acks_for_one_client_lose_nothing() {
    let engine = engine();
    for i in 0..TOTAL {
        engine.create_question(QuestionContent::new(format!("Q{i}"))).unwrap();
    }

    let mut seqs: Vec<i64> = (1..=TOTAL as i64).collect();
    seqs.shuffle(&mut rand::thread_rng());

    let mut handles = Vec::new();
    for chunk in seqs.chunks(TOTAL as usize / 8) {
        let engine = engine.clone();
        let chunk = chunk.to_vec();
        handles.push(tokio::task::spawn_blocking(move || {
            for seq in chunk {
                engine.record_ack("busy-client", seq).unwrap();
                // Duplicate acks from retry paths
                engine.record_ack("busy-client", seq).unwrap();
            }
        }));
    }

    // Readers run alongside the writers
    let reader = {
        let engine = engine.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..50 {
                let backlog = engine.reconcile("busy-client", 0).unwrap();
                assert!(backlog.windows(2).all(|w| w[0].seq < w[1].seq));
            }
        })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    reader.await.unwrap();

    let record = engine.client_ack("busy-client").unwrap().unwrap();
    assert_eq!(record.acked_seqs.len() as u64, TOTAL);
    assert_eq!(record.high_water_mark, TOTAL);
    assert!(engine.reconcile("busy-client", 0).unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn acks_for_different_clients_are_independent() {
    let engine = engine();
    for i in 0..10 {
        engine.create_question(QuestionContent::new(format!("Q{i}"))).unwrap();
    }

    let handles: Vec<_> = (0..10)
        .map(|c| {
            let engine = engine.clone();
            tokio::task::spawn_blocking(move || {
                let client = format!("client-{c}");
                for seq in 1..=c + 1 {
                    engine.record_ack(&client, seq).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    for c in 0..10i64 {
        let record = engine.client_ack(&format!("client-{c}")).unwrap().unwrap();
        assert_eq!(record.high_water_mark, (c + 1) as u64);
        assert_eq!(
            engine.reconcile(&format!("client-{c}"), 0).unwrap().len() as i64,
            10 - (c + 1)
        );
    }
}
