//! redb-based storage layer for sequenced delivery
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `questions` | `seq` | `Question` | Sequence Store (append-only) |
//! | `client_acks` | `client_id` | `ClientAck` | Acknowledgement Store |
//!
//! Values are JSON-serialized.
//!
//! # Durability
//!
//! redb uses `Durability::Immediate` by default: a commit is persistent as
//! soon as `commit()` returns, and the file is always in a consistent state
//! (copy-on-write with atomic pointer swap).
//!
//! # Concurrency
//!
//! redb admits a single write transaction at a time; read transactions are
//! MVCC snapshots and never wait on writers. Reconciliation therefore never
//! blocks on item creation or ack recording.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::{ClientAck, Question};
use std::collections::BTreeSet;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for sequenced questions: key = seq, value = JSON-serialized Question
const QUESTIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("questions");

/// Table for acknowledgement records: key = client_id, value = JSON-serialized ClientAck
const CLIENT_ACKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("client_acks");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unique constraint on `seq` violated
    #[error("Sequence number already assigned: {0}")]
    DuplicateSequence(u64),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Question and acknowledgement storage backed by redb
#[derive(Clone)]
pub struct QuizStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for QuizStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizStorage").finish_non_exhaustive()
    }
}

impl QuizStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(QUESTIONS_TABLE)?;
            let _ = write_txn.open_table(CLIENT_ACKS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is open.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Commit a write transaction
    pub fn commit(&self, txn: WriteTransaction) -> StorageResult<()> {
        txn.commit()?;
        Ok(())
    }

    // ========== Sequence Store ==========

    /// Highest persisted sequence number (0 if empty)
    pub fn max_seq(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS_TABLE)?;
        Ok(table.last()?.map(|(key, _value)| key.value()).unwrap_or(0))
    }

    /// Number of persisted questions
    pub fn question_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS_TABLE)?;
        Ok(table.len()?)
    }

    /// Store a question (within transaction)
    ///
    /// Refuses to overwrite: an existing `seq` yields
    /// [`StorageError::DuplicateSequence`].
    pub fn insert_question(&self, txn: &WriteTransaction, question: &Question) -> StorageResult<()> {
        let mut table = txn.open_table(QUESTIONS_TABLE)?;
        if table.get(question.seq)?.is_some() {
            return Err(StorageError::DuplicateSequence(question.seq));
        }
        let value = serde_json::to_vec(question)?;
        table.insert(question.seq, value.as_slice())?;
        Ok(())
    }

    /// Check whether a question exists (within transaction)
    pub fn contains_question_txn(&self, txn: &WriteTransaction, seq: u64) -> StorageResult<bool> {
        let table = txn.open_table(QUESTIONS_TABLE)?;
        Ok(table.get(seq)?.is_some())
    }

    /// Get a question by sequence number
    pub fn get_question(&self, seq: u64) -> StorageResult<Option<Question>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS_TABLE)?;

        match table.get(seq)? {
            Some(value) => {
                let question: Question = serde_json::from_slice(value.value())?;
                Ok(Some(question))
            }
            None => Ok(None),
        }
    }

    /// All questions, ascending by `seq`
    pub fn list_questions(&self) -> StorageResult<Vec<Question>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS_TABLE)?;

        let mut questions = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            questions.push(serde_json::from_slice(value.value())?);
        }
        Ok(questions)
    }

    /// Questions with `seq > after`, ascending
    pub fn questions_after(&self, after: u64) -> StorageResult<Vec<Question>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS_TABLE)?;

        let mut questions = Vec::new();
        for result in table.range((Bound::Excluded(after), Bound::Unbounded))? {
            let (_key, value) = result?;
            questions.push(serde_json::from_slice(value.value())?);
        }
        Ok(questions)
    }

    // ========== Acknowledgement Store ==========

    /// Get a client's acknowledgement record
    pub fn get_ack(&self, client_id: &str) -> StorageResult<Option<ClientAck>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLIENT_ACKS_TABLE)?;

        match table.get(client_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a client's acknowledgement record (within transaction)
    pub fn get_ack_txn(
        &self,
        txn: &WriteTransaction,
        client_id: &str,
    ) -> StorageResult<Option<ClientAck>> {
        let table = txn.open_table(CLIENT_ACKS_TABLE)?;

        match table.get(client_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Store an acknowledgement record (within transaction)
    pub fn store_ack(&self, txn: &WriteTransaction, ack: &ClientAck) -> StorageResult<()> {
        let mut table = txn.open_table(CLIENT_ACKS_TABLE)?;
        let value = serde_json::to_vec(ack)?;
        table.insert(ack.client_id.as_str(), value.as_slice())?;
        Ok(())
    }

    // ========== Reconciliation ==========

    /// Questions after `after` that `client_id` has not acknowledged
    ///
    /// Reads both tables from one snapshot so the result is consistent even
    /// while acks and new questions are being committed.
    pub fn unacked_after(&self, client_id: &str, after: u64) -> StorageResult<Vec<Question>> {
        let read_txn = self.db.begin_read()?;
        let acks = read_txn.open_table(CLIENT_ACKS_TABLE)?;
        let questions = read_txn.open_table(QUESTIONS_TABLE)?;

        let acked: BTreeSet<u64> = match acks.get(client_id)? {
            Some(value) => serde_json::from_slice::<ClientAck>(value.value())?.acked_seqs,
            None => BTreeSet::new(),
        };

        let mut backlog = Vec::new();
        for result in questions.range((Bound::Excluded(after), Bound::Unbounded))? {
            let (key, value) = result?;
            if acked.contains(&key.value()) {
                continue;
            }
            backlog.push(serde_json::from_slice(value.value())?);
        }
        Ok(backlog)
    }
}
