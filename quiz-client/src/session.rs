//! Client session state machine
//!
//! # States
//!
//! ```text
//!              begin_connect()            on_connected()
//! Disconnected ──────────────▶ Connecting ──────────────▶ Connected
//!      ▲                           │                          │
//!      └───────────────────────────┴──── on_disconnected() ◀──┘
//! ```
//!
//! # Local view
//!
//! Questions are kept in a map keyed by `seq`, so a question arriving through
//! both push and reconciliation is stored once. Nothing is discarded on
//! disconnect.
//!
//! Two watermarks are tracked:
//!
//! - `last_seq`: highest `seq` seen; drives gap detection
//! - `contiguous_seq`: highest `seq` such that every `seq` up to it is held
//!
//! Reconciliation always starts from `contiguous_seq`. Starting from
//! `last_seq` would skip any hole left behind by a gap; the server's ack
//! filter keeps the extra range from returning what was already confirmed.
//!
//! # Push handling
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | `seq == last_seq + 1` | accepted, gap warning cleared |
//! | `seq > last_seq + 1`, `last_seq > 0` | accepted, gap flagged, caller reconciles |
//! | `seq > last_seq + 1`, `last_seq == 0` | accepted (first item is exempt) |
//! | `seq <= last_seq` | duplicate, discarded |

use std::collections::BTreeMap;
use std::fmt;

use shared::Question;

/// Connection state of one client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// A pushed `seq` jumped past the expected next one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub expected: u64,
    pub received: u64,
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WARNING: Gap detected - expected seq {}, received seq {}",
            self.expected, self.received
        )
    }
}

/// Result of handling one pushed question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Merged into the view; must be acknowledged
    Accepted { gap: Option<Gap> },
    /// Already seen; dropped without error
    Duplicate,
    /// Not connected; the next reconciliation will deliver it
    Ignored,
}

/// Per-connection session logic, independent of any transport
#[derive(Debug, Clone)]
pub struct ClientSession {
    client_id: String,
    state: ConnectionState,
    questions: BTreeMap<u64, Question>,
    last_seq: u64,
    contiguous_seq: u64,
    gap_warning: Option<Gap>,
}

impl ClientSession {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            state: ConnectionState::Disconnected,
            questions: BTreeMap::new(),
            last_seq: 0,
            contiguous_seq: 0,
            gap_warning: None,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Highest `seq` seen so far (0 if none)
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Highest `seq` with no hole below it (0 if none)
    pub fn contiguous_seq(&self) -> u64 {
        self.contiguous_seq
    }

    /// `lastSeq` to send when reconciling
    pub fn reconcile_from(&self) -> u64 {
        self.contiguous_seq
    }

    /// Whether the view is missing any `seq` below `last_seq`
    pub fn has_holes(&self) -> bool {
        self.contiguous_seq < self.last_seq
    }

    pub fn gap_warning(&self) -> Option<Gap> {
        self.gap_warning
    }

    /// Local view, ascending by `seq`
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    pub fn question(&self, seq: u64) -> Option<&Question> {
        self.questions.get(&seq)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    // ========== Transitions ==========

    /// `Disconnected → Connecting`; false if already connecting or connected
    pub fn begin_connect(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// `Connecting → Connected`
    ///
    /// Returns the `lastSeq` to reconcile with, or `None` if the session
    /// was not connecting.
    pub fn on_connected(&mut self) -> Option<u64> {
        if self.state != ConnectionState::Connecting {
            return None;
        }
        self.state = ConnectionState::Connected;
        Some(self.reconcile_from())
    }

    /// Any state `→ Disconnected`; the local view is kept
    pub fn on_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    // ========== Delivery ==========

    /// Handle a question pushed over the live channel
    pub fn on_push(&mut self, question: Question) -> PushOutcome {
        if self.state != ConnectionState::Connected {
            return PushOutcome::Ignored;
        }

        let seq = question.seq;
        if seq <= self.last_seq {
            return PushOutcome::Duplicate;
        }

        let expected = self.last_seq + 1;
        let gap = (seq > expected && self.last_seq > 0).then_some(Gap {
            expected,
            received: seq,
        });
        self.gap_warning = gap;

        self.questions.insert(seq, question);
        self.last_seq = seq;
        self.advance_contiguous();
        PushOutcome::Accepted { gap }
    }

    /// Merge a reconciliation backlog into the view
    ///
    /// Returns every backlog `seq` for acknowledgement, including ones the
    /// view already held: the server listed them because their ack never
    /// landed. The gap warning is cleared once no hole remains.
    pub fn merge_backlog(&mut self, backlog: Vec<Question>) -> Vec<u64> {
        let mut to_ack = Vec::with_capacity(backlog.len());
        for question in backlog {
            let seq = question.seq;
            self.last_seq = self.last_seq.max(seq);
            self.questions.entry(seq).or_insert(question);
            to_ack.push(seq);
        }
        self.advance_contiguous();
        if !self.has_holes() {
            self.gap_warning = None;
        }
        to_ack
    }

    fn advance_contiguous(&mut self) {
        while self.questions.contains_key(&(self.contiguous_seq + 1)) {
            self.contiguous_seq += 1;
        }
    }
}
