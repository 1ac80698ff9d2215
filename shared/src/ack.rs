//! Per-client acknowledgement record

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Acknowledgement record - one per client id
///
/// `acked_seqs` is the durable ground truth for "already delivered and
/// confirmed"; `high_water_mark` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAck {
    pub client_id: String,
    pub acked_seqs: BTreeSet<u64>,
    pub high_water_mark: u64,
    /// Last mutation (Unix milliseconds)
    pub updated_at: i64,
}

impl ClientAck {
    /// Record created by a client's first acknowledgement
    pub fn first(client_id: impl Into<String>, seq: u64, now: i64) -> Self {
        Self {
            client_id: client_id.into(),
            acked_seqs: BTreeSet::from([seq]),
            high_water_mark: seq,
            updated_at: now,
        }
    }

    /// Merge one confirmation into the record
    ///
    /// Returns `false` when the record already holds `seq` (no-op).
    pub fn merge(&mut self, seq: u64, now: i64) -> bool {
        if !self.acked_seqs.insert(seq) {
            return false;
        }
        self.high_water_mark = self.high_water_mark.max(seq);
        self.updated_at = now;
        true
    }

    pub fn has_acked(&self, seq: u64) -> bool {
        self.acked_seqs.contains(&seq)
    }
}
