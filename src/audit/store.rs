// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Storage backends for the audit chain.
//!
//! ## Table Layout (redb)
//!
//! - `audit_records`: seq (u64, big-endian ordered) → serialized AdminAction
//!
//! Records are keyed by their writer-assigned sequence number, so scans in
//! key order are chain order regardless of wall-clock timestamps.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::record::AdminAction;

/// Primary table: seq → serialized AdminAction (JSON bytes).
const AUDIT_RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_records");

#[derive(Debug, thiserror::Error)]
pub enum AuditStoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("record not found: seq {0}")]
    NotFound(u64),
}

pub type AuditStoreResult<T> = Result<T, AuditStoreError>;

/// Append-only record storage for one audit chain.
///
/// `annotate` is the single permitted mutation and touches only the
/// remediation fields, never `record_hash`/`prev_hash`.
pub trait AuditStore: Send + Sync {
    /// Persist a new record under its sequence number.
    fn append(&self, record: &AdminAction) -> AuditStoreResult<()>;

    /// The record with the highest sequence number, if any.
    fn last(&self) -> AuditStoreResult<Option<AdminAction>>;

    /// Up to `limit` records in chain order (oldest first). `0` means all.
    fn scan(&self, limit: usize) -> AuditStoreResult<Vec<AdminAction>>;

    /// Set the remediation annotation on one record.
    fn annotate(&self, seq: u64, expected_hash: &str, tampered: bool) -> AuditStoreResult<()>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// In-memory audit store, ordered by sequence number.
#[derive(Default)]
pub struct MemoryAuditStore {
    records: Mutex<BTreeMap<u64, AdminAction>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, AdminAction>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Out-of-band record replacement, simulating storage-level tampering.
    #[cfg(test)]
    pub(crate) fn tamper(&self, seq: u64, mutate: impl FnOnce(&mut AdminAction)) {
        if let Some(record) = self.lock().get_mut(&seq) {
            mutate(record);
        }
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, record: &AdminAction) -> AuditStoreResult<()> {
        self.lock().insert(record.seq, record.clone());
        Ok(())
    }

    fn last(&self) -> AuditStoreResult<Option<AdminAction>> {
        Ok(self.lock().values().next_back().cloned())
    }

    fn scan(&self, limit: usize) -> AuditStoreResult<Vec<AdminAction>> {
        let records = self.lock();
        let iter = records.values().cloned();
        Ok(if limit == 0 {
            iter.collect()
        } else {
            iter.take(limit).collect()
        })
    }

    fn annotate(&self, seq: u64, expected_hash: &str, tampered: bool) -> AuditStoreResult<()> {
        let mut records = self.lock();
        let record = records.get_mut(&seq).ok_or(AuditStoreError::NotFound(seq))?;
        record.expected_hash = Some(expected_hash.to_string());
        record.tampered = tampered;
        Ok(())
    }
}

// =============================================================================
// redb-backed store
// =============================================================================

/// Durable audit store backed by redb (pure Rust, ACID).
pub struct RedbAuditStore {
    db: Database,
}

impl RedbAuditStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> AuditStoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(AUDIT_RECORDS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl AuditStore for RedbAuditStore {
    fn append(&self, record: &AdminAction) -> AuditStoreResult<()> {
        let json = serde_json::to_vec(record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUDIT_RECORDS)?;
            table.insert(record.seq, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn last(&self) -> AuditStoreResult<Option<AdminAction>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_RECORDS)?;
        // The access guard borrows the table; deserialize into a local so
        // the guard drops before the table does.
        let record = match table.last()? {
            Some((_, value)) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(record)
    }

    fn scan(&self, limit: usize) -> AuditStoreResult<Vec<AdminAction>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_RECORDS)?;

        let mut records = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let record: AdminAction = serde_json::from_slice(value.value())?;
            records.push(record);
            if limit != 0 && records.len() >= limit {
                break;
            }
        }
        Ok(records)
    }

    fn annotate(&self, seq: u64, expected_hash: &str, tampered: bool) -> AuditStoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUDIT_RECORDS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table.get(seq)?.ok_or(AuditStoreError::NotFound(seq))?;
                existing.value().to_vec()
            };

            let mut record: AdminAction = serde_json::from_slice(&existing_bytes)?;
            record.expected_hash = Some(expected_hash.to_string());
            record.tampered = tampered;

            let json = serde_json::to_vec(&record)?;
            table.insert(seq, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
