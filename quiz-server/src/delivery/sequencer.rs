//! Sequencer - single authority for assigning `seq`
//!
//! ```text
//! create_question(content)
//!     ├─ 1. Validate content (text required)
//!     ├─ 2. Lock counter
//!     ├─ 3. seq = current_max + 1
//!     ├─ 4. Insert + commit (unique constraint on seq)
//!     ├─ 5. current_max = seq
//!     ├─ 6. Broadcast to live sessions
//!     └─ 7. Unlock
//! ```
//!
//! The counter only advances after a successful commit, so a failed write
//! leaves no hole in the numbering. Broadcasting under the lock keeps pushes
//! in `seq` order for every session.

use super::error::{DeliveryError, DeliveryResult};
use super::fanout::LiveFanout;
use super::storage::QuizStorage;
use parking_lot::Mutex;
use shared::{Question, QuestionContent};

pub struct Sequencer {
    storage: QuizStorage,
    fanout: LiveFanout,
    /// Highest committed seq
    current_max: Mutex<u64>,
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("current_max", &*self.current_max.lock())
            .finish_non_exhaustive()
    }
}

impl Sequencer {
    /// Recover the counter from the Sequence Store
    pub fn new(storage: QuizStorage, fanout: LiveFanout) -> DeliveryResult<Self> {
        let current_max = storage.max_seq()?;
        tracing::info!(current_max, "Sequencer recovered counter");
        Ok(Self {
            storage,
            fanout,
            current_max: Mutex::new(current_max),
        })
    }

    /// Highest sequence number assigned so far
    pub fn current_seq(&self) -> u64 {
        *self.current_max.lock()
    }

    /// Create, persist and broadcast a new question
    pub fn create_question(&self, content: QuestionContent) -> DeliveryResult<Question> {
        let content = normalize(content)?;

        let mut current_max = self.current_max.lock();
        let seq = current_max.checked_add(1).ok_or_else(|| {
            DeliveryError::ConsistencyViolation("sequence number space exhausted".to_string())
        })?;
        let question = Question::new(seq, content, chrono::Utc::now().timestamp_millis());

        let txn = self.storage.begin_write()?;
        self.storage.insert_question(&txn, &question)?;
        self.storage.commit(txn)?;
        *current_max = seq;

        let report = self.fanout.broadcast(&question);
        tracing::info!(
            seq,
            delivered = report.delivered,
            dropped = report.dropped,
            "Question created"
        );

        Ok(question)
    }
}

/// Trim text and options; reject blank text
fn normalize(content: QuestionContent) -> DeliveryResult<QuestionContent> {
    let text = content.text.trim();
    if text.is_empty() {
        return Err(DeliveryError::invalid("text is required"));
    }

    Ok(QuestionContent {
        text: text.to_string(),
        options: content
            .options
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
        correct_answer: content
            .correct_answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn sequencer() -> Sequencer {
        let storage = QuizStorage::open_in_memory().unwrap();
        Sequencer::new(storage, LiveFanout::default()).unwrap()
    }

    #[test]
    fn test_first_question_gets_seq_one() {
        let seq = sequencer();
        assert_eq!(seq.current_seq(), 0);

        let q = seq.create_question(QuestionContent::new("What is 2+2?")).unwrap();
        assert_eq!(q.seq, 1);
        assert_eq!(seq.current_seq(), 1);
    }

    #[test]
    fn test_blank_text_rejected_without_consuming_seq() {
        let seq = sequencer();
        let err = seq.create_question(QuestionContent::new("   ")).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Invalid input: text is required");

        let q = seq.create_question(QuestionContent::new("ok")).unwrap();
        assert_eq!(q.seq, 1);
    }

    #[test]
    fn test_content_is_trimmed() {
        let seq = sequencer();
        let q = seq
            .create_question(
                QuestionContent::new("  Pick one ")
                    .with_options(vec![" a ".into(), "".into(), "b".into()])
                    .with_correct_answer("  "),
            )
            .unwrap();
        assert_eq!(q.text(), "Pick one");
        assert_eq!(q.content.options, vec!["a", "b"]);
        assert!(q.content.correct_answer.is_none());
    }

    #[test]
    fn test_counter_recovered_from_storage() {
        let storage = QuizStorage::open_in_memory().unwrap();
        {
            let first = Sequencer::new(storage.clone(), LiveFanout::default()).unwrap();
            for i in 0..3 {
                first.create_question(QuestionContent::new(format!("Q{i}"))).unwrap();
            }
        }

        let second = Sequencer::new(storage, LiveFanout::default()).unwrap();
        assert_eq!(second.current_seq(), 3);
        assert_eq!(second.create_question(QuestionContent::new("next")).unwrap().seq, 4);
    }

    #[test]
    fn test_live_session_receives_in_order() {
        let fanout = LiveFanout::default();
        let storage = QuizStorage::open_in_memory().unwrap();
        let seq = Sequencer::new(storage, fanout.clone()).unwrap();
        let mut sub = fanout.subscribe("c1");

        for i in 1..=5 {
            seq.create_question(QuestionContent::new(format!("Q{i}"))).unwrap();
        }

        let received: Vec<u64> = std::iter::from_fn(|| sub.try_recv()).map(|q| q.seq).collect();
        assert_eq!(received, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_concurrent_creation_is_dense() {
        let seq = Arc::new(sequencer());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let seq = seq.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| {
                            seq.create_question(QuestionContent::new(format!("T{t}-{i}")))
                                .unwrap()
                                .seq
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = BTreeSet::new();
        for handle in handles {
            for s in handle.join().unwrap() {
                assert!(all.insert(s), "seq {s} assigned twice");
            }
        }
        assert_eq!(all, (1..=200).collect::<BTreeSet<u64>>());
    }
}
