//! Live fanout - forward-only push of newly sequenced questions
//!
//! # Delivery policy
//!
//! Every session owns a bounded `mpsc` queue. [`LiveFanout::broadcast`]
//! never awaits:
//!
//! | Queue state | Action |
//! |-------------|--------|
//! | has room | item enqueued |
//! | full | item dropped for this session only (warn) |
//! | closed | session unregistered |
//!
//! A dropped item shows up as a gap on the client's next push. The client
//! then reconciles from below the hole and gets the dropped item back from
//! storage. Fanout keeps no history: a session only sees items
//! broadcast after it subscribed.
//!
//! # Ordering
//!
//! The Sequencer calls `broadcast` inside its critical section, so a
//! continuously connected session receives ascending `seq` with no gaps
//! unless its own queue overflowed.

use dashmap::DashMap;
use shared::Question;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default per-session queue capacity
pub const DEFAULT_SESSION_QUEUE_CAPACITY: usize = 256;

/// Opaque handle identifying one live session
pub type SessionId = u64;

#[derive(Debug)]
struct LiveSession {
    client_id: String,
    tx: mpsc::Sender<Arc<Question>>,
}

/// Receiving side of a live session
#[derive(Debug)]
pub struct Subscription {
    id: SessionId,
    client_id: String,
    receiver: mpsc::Receiver<Arc<Question>>,
}

impl Subscription {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Wait for the next pushed question
    ///
    /// Returns `None` once the session has been unregistered.
    pub async fn recv(&mut self) -> Option<Arc<Question>> {
        self.receiver.recv().await
    }

    /// Take a queued question without waiting
    pub fn try_recv(&mut self) -> Option<Arc<Question>> {
        self.receiver.try_recv().ok()
    }
}

/// Outcome of one broadcast
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
    pub closed: usize,
}

/// Registry of connected sessions
#[derive(Clone, Debug)]
pub struct LiveFanout {
    sessions: Arc<DashMap<SessionId, LiveSession>>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
}

impl LiveFanout {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            capacity: capacity.max(1),
        }
    }

    /// Register a session for `client_id`
    pub fn subscribe(&self, client_id: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, receiver) = mpsc::channel(self.capacity);
        self.sessions.insert(
            id,
            LiveSession {
                client_id: client_id.to_string(),
                tx,
            },
        );
        tracing::debug!(session_id = id, client_id = %client_id, "Live session registered");

        Subscription {
            id,
            client_id: client_id.to_string(),
            receiver,
        }
    }

    /// Remove a session; returns `false` if it was already gone
    pub fn unsubscribe(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::debug!(session_id = id, "Live session unregistered");
        }
        removed
    }

    /// Push `question` to every registered session without blocking
    pub fn broadcast(&self, question: &Question) -> BroadcastReport {
        let question = Arc::new(question.clone());
        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        for entry in self.sessions.iter() {
            match entry.value().tx.try_send(question.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    tracing::warn!(
                        session_id = *entry.key(),
                        client_id = %entry.value().client_id,
                        seq = question.seq,
                        "Session queue full, dropping push (client will reconcile)"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        // Removal must happen after iteration releases the shard locks
        for id in closed {
            if self.sessions.remove(&id).is_some() {
                report.closed += 1;
                tracing::debug!(session_id = id, "Removed closed live session");
            }
        }

        report
    }

    /// Number of registered sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of registered sessions for one client id
    pub fn client_session_count(&self, client_id: &str) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().client_id == client_id)
            .count()
    }
}

impl Default for LiveFanout {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_QUEUE_CAPACITY)
    }
}
