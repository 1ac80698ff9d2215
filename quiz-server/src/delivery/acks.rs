//! Ack Recorder - the only mutator of acknowledgement records
//!
//! Read-modify-write of a client's `acked_seqs` is serialized per client id
//! through a keyed lock table; acks for different clients only contend on
//! redb's single writer for the duration of the commit.

use super::error::{DeliveryError, DeliveryResult};
use super::storage::QuizStorage;
use dashmap::DashMap;
use parking_lot::Mutex;
use shared::ClientAck;
use std::sync::Arc;

/// Outcome of one acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// First ack from this client, record created
    Created,
    /// `seq` merged into an existing record
    Merged,
    /// Record already held `seq`; nothing written
    Unchanged,
}

pub struct AckRecorder {
    storage: QuizStorage,
    client_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for AckRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AckRecorder")
            .field("locked_clients", &self.client_locks.len())
            .finish_non_exhaustive()
    }
}

impl AckRecorder {
    pub fn new(storage: QuizStorage) -> Self {
        Self {
            storage,
            client_locks: DashMap::new(),
        }
    }

    /// Merge `seq` into `client_id`'s acknowledgement record
    ///
    /// `seq` is signed so that a negative value from the wire is reported as
    /// invalid input rather than a parse failure.
    pub fn record_ack(&self, client_id: &str, seq: i64) -> DeliveryResult<AckOutcome> {
        if client_id.trim().is_empty() {
            return Err(DeliveryError::invalid("clientId is required"));
        }
        if seq < 1 {
            return Err(DeliveryError::invalid("seq must be a positive number"));
        }
        let seq = seq as u64;

        let lock = self
            .client_locks
            .entry(client_id.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock();
            self.merge_locked(client_id, seq)
        };

        // Drop the entry once no other caller holds it
        drop(lock);
        self.client_locks
            .remove_if(client_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    fn merge_locked(&self, client_id: &str, seq: u64) -> DeliveryResult<AckOutcome> {
        let txn = self.storage.begin_write()?;

        if !self.storage.contains_question_txn(&txn, seq)? {
            return Err(DeliveryError::ConsistencyViolation(format!(
                "ack for unknown seq {} from client {}",
                seq, client_id
            )));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let (record, outcome) = match self.storage.get_ack_txn(&txn, client_id)? {
            None => (ClientAck::first(client_id, seq, now), AckOutcome::Created),
            Some(mut record) => {
                if !record.merge(seq, now) {
                    // Dropping txn aborts it
                    return Ok(AckOutcome::Unchanged);
                }
                (record, AckOutcome::Merged)
            }
        };

        self.storage.store_ack(&txn, &record)?;
        self.storage.commit(txn)?;

        tracing::debug!(
            client_id = %client_id,
            seq,
            high_water_mark = record.high_water_mark,
            ?outcome,
            "Ack recorded"
        );
        Ok(outcome)
    }

    /// Current acknowledgement record for a client
    pub fn get(&self, client_id: &str) -> DeliveryResult<Option<ClientAck>> {
        Ok(self.storage.get_ack(client_id)?)
    }
}
