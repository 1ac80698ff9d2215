use super::acks::{AckOutcome, AckRecorder};
use super::error::{DeliveryError, DeliveryResult};
use super::fanout::{LiveFanout, SessionId, Subscription};
use super::reconcile::ReconcileService;
use super::sequencer::Sequencer;
use super::storage::QuizStorage;
use shared::{ClientAck, Question, QuestionContent};

/// Delivery engine - the operations exposed to the transport layer
///
/// | Operation | Component |
/// |-----------|-----------|
/// | `create_question` | [`Sequencer`] (+ fanout) |
/// | `list_questions` / `get_question` | [`QuizStorage`] |
/// | `reconcile` | [`ReconcileService`] |
/// | `record_ack` / `client_ack` | [`AckRecorder`] |
/// | `subscribe` / `unsubscribe` | [`LiveFanout`] |
#[derive(Debug)]
pub struct DeliveryEngine {
    storage: QuizStorage,
    sequencer: Sequencer,
    acks: AckRecorder,
    reconciler: ReconcileService,
    fanout: LiveFanout,
}

impl DeliveryEngine {
    /// Build the engine on top of an opened store
    ///
    /// Recovers the sequence counter before accepting any write.
    pub fn new(storage: QuizStorage, session_queue_capacity: usize) -> DeliveryResult<Self> {
        let fanout = LiveFanout::new(session_queue_capacity);
        let sequencer = Sequencer::new(storage.clone(), fanout.clone())?;
        Ok(Self {
            acks: AckRecorder::new(storage.clone()),
            reconciler: ReconcileService::new(storage.clone()),
            storage,
            sequencer,
            fanout,
        })
    }

    // ========== Items ==========

    pub fn create_question(&self, content: QuestionContent) -> DeliveryResult<Question> {
        self.sequencer.create_question(content)
    }

    pub fn list_questions(&self) -> DeliveryResult<Vec<Question>> {
        Ok(self.storage.list_questions()?)
    }

    pub fn get_question(&self, seq: u64) -> DeliveryResult<Question> {
        self.storage
            .get_question(seq)?
            .ok_or(DeliveryError::QuestionNotFound(seq))
    }

    pub fn current_seq(&self) -> u64 {
        self.sequencer.current_seq()
    }

    // ========== Reconciliation & acks ==========

    pub fn reconcile(&self, client_id: &str, last_seq: i64) -> DeliveryResult<Vec<Question>> {
        self.reconciler.reconcile(client_id, last_seq)
    }

    pub fn record_ack(&self, client_id: &str, seq: i64) -> DeliveryResult<AckOutcome> {
        self.acks.record_ack(client_id, seq)
    }

    pub fn client_ack(&self, client_id: &str) -> DeliveryResult<Option<ClientAck>> {
        self.acks.get(client_id)
    }

    // ========== Live sessions ==========

    pub fn subscribe(&self, client_id: &str) -> Subscription {
        self.fanout.subscribe(client_id)
    }

    pub fn unsubscribe(&self, id: SessionId) -> bool {
        self.fanout.unsubscribe(id)
    }

    pub fn live_sessions(&self) -> usize {
        self.fanout.session_count()
    }

    /// Whether the store answers a read
    pub fn storage_healthy(&self) -> bool {
        match self.storage.question_count() {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "Storage health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DeliveryEngine {
        DeliveryEngine::new(QuizStorage::open_in_memory().unwrap(), 16).unwrap()
    }

    fn create(engine: &DeliveryEngine, text: &str) -> Question {
        engine.create_question(QuestionContent::new(text)).unwrap()
    }

    #[test]
    fn test_reconcile_then_ack_flow() {
        let engine = engine();
        for text in ["Q1", "Q2", "Q3"] {
            create(&engine, text);
        }

        let backlog = engine.reconcile("c1", 0).unwrap();
        assert_eq!(
            backlog.iter().map(Question::text).collect::<Vec<_>>(),
            vec!["Q1", "Q2", "Q3"]
        );

        engine.record_ack("c1", 2).unwrap();
        let backlog: Vec<u64> = engine.reconcile("c1", 0).unwrap().iter().map(|q| q.seq).collect();
        assert_eq!(backlog, vec![1, 3]);

        let ack = engine.client_ack("c1").unwrap().unwrap();
        assert_eq!(ack.high_water_mark, 2);
    }

    #[test]
    fn test_get_question_not_found() {
        let engine = engine();
        create(&engine, "only");
        assert_eq!(engine.get_question(1).unwrap().text(), "only");
        assert!(matches!(
            engine.get_question(2).unwrap_err(),
            DeliveryError::QuestionNotFound(2)
        ));
    }

    #[test]
    fn test_subscriber_after_creation_needs_reconcile() {
        let engine = engine();
        create(&engine, "before");

        let mut sub = engine.subscribe("late");
        assert_eq!(engine.live_sessions(), 1);
        assert!(sub.try_recv().is_none());
        assert_eq!(engine.reconcile("late", 0).unwrap().len(), 1);

        create(&engine, "after");
        assert_eq!(sub.try_recv().unwrap().seq, 2);

        assert!(engine.unsubscribe(sub.id()));
        assert_eq!(engine.live_sessions(), 0);
    }

    #[test]
    fn test_invalid_inputs_do_not_mutate() {
        let engine = engine();
        create(&engine, "Q1");

        assert!(engine.record_ack("c1", 0).is_err());
        assert!(engine.reconcile("c1", -5).is_err());
        assert!(engine.create_question(QuestionContent::new("")).is_err());

        assert!(engine.client_ack("c1").unwrap().is_none());
        assert_eq!(engine.current_seq(), 1);
        assert!(engine.storage_healthy());
    }
}
