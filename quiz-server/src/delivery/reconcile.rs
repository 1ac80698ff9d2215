//! Reconciliation for reconnecting clients
//!
//! # Protocol
//!
//! 1. Client sends the highest `seq` below which it holds everything (0 if none)
//! 2. Server collects every question with `seq > last_seq`
//! 3. Anything the client has durably acknowledged is filtered out
//! 4. The backlog is returned ascending; the client merges and acks it
//!
//! # Guarantees
//!
//! - Pure read: never mutates state, safe to retry
//! - Ordered by `seq`
//! - Nothing to deliver is an empty backlog, not an error
//!
//! A client that saw a gap sends the `seq` just below the hole, not its
//! highest seen `seq`, so the range may cover items it already holds. The ack
//! set is the ground truth for what was delivered, hence the filter.

use super::error::{DeliveryError, DeliveryResult};
use super::storage::QuizStorage;
use shared::Question;

/// Reconciliation resolver
#[derive(Debug, Clone)]
pub struct ReconcileService {
    storage: QuizStorage,
}

impl ReconcileService {
    pub fn new(storage: QuizStorage) -> Self {
        Self { storage }
    }

    /// Unacknowledged backlog for `client_id` after `last_seq`
    pub fn reconcile(&self, client_id: &str, last_seq: i64) -> DeliveryResult<Vec<Question>> {
        if client_id.trim().is_empty() {
            return Err(DeliveryError::invalid("clientId is required"));
        }
        if last_seq < 0 {
            return Err(DeliveryError::invalid("lastSeq must be a non-negative integer"));
        }

        let backlog = self.storage.unacked_after(client_id, last_seq as u64)?;
        tracing::debug!(
            client_id = %client_id,
            last_seq,
            backlog = backlog.len(),
            "Reconciled"
        );
        Ok(backlog)
    }
}
