// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The tamper-evident audit chain.
//!
//! `append` is the only mutation and is serialized through a single writer
//! lock: the "read last hash, write next record" step must never interleave,
//! or two records would claim the same `prev_hash` and silently fork the
//! chain. Reads never take the writer lock.
//!
//! Verification recomputes every hash with the *recomputed* predecessor
//! hash as input, so divergence introduced at one record propagates to
//! every record downstream of it — forward, never backward.
//!
//! Remediation only reports. Rewriting a compromised record would itself be
//! indistinguishable from the original tampering, so `remediate` annotates
//! each record with its recomputed hash and a tampered flag while leaving
//! `record_hash`/`prev_hash` as forensic evidence.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use super::record::AdminAction;
use super::store::AuditStore;
use crate::auth::Tier;
use crate::error::{TrustError, TrustResult};

/// Outcome of a chain verification walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    /// True when every checked record matches the recomputed chain.
    pub valid: bool,
    /// How many records were checked.
    pub checked: usize,
    /// Ids of records that diverge from the recomputed chain.
    pub divergent: Vec<String>,
}

/// Append-only, hash-linked log of privileged actions.
pub struct AuditChain {
    store: Arc<dyn AuditStore>,
    writer: Mutex<()>,
}

impl AuditChain {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// Append a record for one privileged action.
    ///
    /// Holds the writer lock across the last-hash read and the write, so
    /// concurrent appends serialize into one linear chain.
    pub fn append(
        &self,
        action_type: &str,
        actor_id: &str,
        actor_tier: Tier,
        payload: serde_json::Value,
        correlation_id: Option<String>,
    ) -> TrustResult<AdminAction> {
        let _writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let (seq, prev_hash) = match self.store.last().map_err(storage_err)? {
            Some(last) => (last.seq + 1, last.record_hash),
            None => (1, String::new()),
        };

        let created_at = Utc::now();
        let record_hash = AdminAction::compute_hash(
            &prev_hash,
            action_type,
            actor_id,
            actor_tier,
            &payload,
            correlation_id.as_deref(),
            created_at,
        );

        let record = AdminAction {
            id: Uuid::new_v4().to_string(),
            seq,
            action_type: action_type.to_string(),
            actor_id: actor_id.to_string(),
            actor_tier,
            payload,
            correlation_id,
            prev_hash,
            record_hash,
            created_at,
            expected_hash: None,
            tampered: false,
        };

        self.store.append(&record).map_err(storage_err)?;

        tracing::info!(
            action = action_type,
            actor = actor_id,
            tier = %actor_tier,
            seq,
            "audit record appended"
        );

        Ok(record)
    }

    /// Read up to `limit` records in chain order (`0` = all).
    pub fn records(&self, limit: usize) -> TrustResult<Vec<AdminAction>> {
        self.store.scan(limit).map_err(storage_err)
    }

    /// Walk the chain oldest-to-newest, recomputing every hash.
    ///
    /// Returns findings, never an error: a tampered chain is a reportable
    /// fact, not a request failure.
    pub fn verify_chain(&self, limit: usize) -> TrustResult<ChainVerification> {
        let records = self.store.scan(limit).map_err(storage_err)?;
        let mut divergent = Vec::new();

        let mut expected_prev = String::new();
        for (i, record) in records.iter().enumerate() {
            let expected = record.hash_with_prev(&expected_prev);
            if Self::diverges(&records, i, &expected) {
                divergent.push(record.id.clone());
            }
            expected_prev = expected;
        }

        Ok(ChainVerification {
            valid: divergent.is_empty(),
            checked: records.len(),
            divergent,
        })
    }

    /// Like [`verify_chain`](Self::verify_chain), but annotates every record
    /// with its recomputed hash and a tampered flag. Never rewrites
    /// `record_hash` or `prev_hash`.
    pub fn remediate(&self, limit: usize) -> TrustResult<ChainVerification> {
        let records = self.store.scan(limit).map_err(storage_err)?;
        let mut divergent = Vec::new();

        let mut expected_prev = String::new();
        for (i, record) in records.iter().enumerate() {
            let expected = record.hash_with_prev(&expected_prev);
            let tampered = Self::diverges(&records, i, &expected);
            self.store
                .annotate(record.seq, &expected, tampered)
                .map_err(storage_err)?;
            if tampered {
                tracing::warn!(
                    id = %record.id,
                    seq = record.seq,
                    "audit record diverges from recomputed chain"
                );
                divergent.push(record.id.clone());
            }
            expected_prev = expected;
        }

        Ok(ChainVerification {
            valid: divergent.is_empty(),
            checked: records.len(),
            divergent,
        })
    }

    /// Export the chain as ordered JSONL, sufficient to re-run verification
    /// offline, independent of the live storage engine.
    pub fn export_jsonl(&self) -> TrustResult<String> {
        let records = self.store.scan(0).map_err(storage_err)?;
        let mut out = String::new();
        for record in &records {
            let line = serde_json::to_string(record)
                .map_err(|e| TrustError::Storage(format!("serialize audit record: {e}")))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Whether record `i` diverges from the recomputed chain: either its
    /// recomputed hash disagrees with the stored one, or its stored
    /// `prev_hash` disagrees with its stored predecessor's `record_hash`.
    fn diverges(records: &[AdminAction], i: usize, expected: &str) -> bool {
        let record = &records[i];
        let stored_prev = if i == 0 {
            ""
        } else {
            records[i - 1].record_hash.as_str()
        };
        expected != record.record_hash || record.prev_hash != stored_prev
    }
}

/// Parse a JSONL artifact back into a store, preserving hashes and
/// sequence numbers so `verify_chain` can re-run against it.
pub fn import_jsonl(store: &dyn AuditStore, artifact: &str) -> TrustResult<usize> {
    let mut imported = 0;
    for line in artifact.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let record: AdminAction = serde_json::from_str(line)
            .map_err(|e| TrustError::Storage(format!("parse audit record: {e}")))?;
        store.append(&record).map_err(storage_err)?;
        imported += 1;
    }
    Ok(imported)
}

fn storage_err(e: super::store::AuditStoreError) -> TrustError {
    TrustError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::store::MemoryAuditStore;
    use serde_json::json;

    fn chain_with_store() -> (AuditChain, Arc<MemoryAuditStore>) {
        let store = Arc::new(MemoryAuditStore::new());
        (AuditChain::new(store.clone()), store)
    }

    fn fill(chain: &AuditChain, n: usize) {
        for i in 0..n {
            chain
                .append(
                    "config.update",
                    "wallet_a",
                    Tier::Operator,
                    json!({"step": i}),
                    None,
                )
                .unwrap();
        }
    }

    #[test]
    fn appended_records_link_and_number_correctly() {
        let (chain, _) = chain_with_store();
        let first = chain
            .append("a", "wallet_a", Tier::Owner, json!({}), None)
            .unwrap();
        let second = chain
            .append("b", "wallet_a", Tier::Owner, json!({}), Some("corr".into()))
            .unwrap();

        assert_eq!(first.seq, 1);
        assert_eq!(first.prev_hash, "");
        assert_eq!(second.seq, 2);
        assert_eq!(second.prev_hash, first.record_hash);
    }

    #[test]
    fn untampered_chain_verifies_clean() {
        let (chain, _) = chain_with_store();
        fill(&chain, 5);

        let report = chain.verify_chain(0).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 5);
        assert!(report.divergent.is_empty());
    }

    #[test]
    fn empty_chain_is_valid() {
        let (chain, _) = chain_with_store();
        let report = chain.verify_chain(0).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 0);
    }

    #[test]
    fn payload_tampering_propagates_forward_only() {
        let (chain, store) = chain_with_store();
        fill(&chain, 5);

        store.tamper(3, |record| {
            record.payload = json!({"step": "forged"});
        });

        let records = chain.records(0).unwrap();
        let report = chain.verify_chain(0).unwrap();

        assert!(!report.valid);
        // Records 3, 4, 5 diverge; 1 and 2 stay clean.
        let expected: Vec<String> = records[2..].iter().map(|r| r.id.clone()).collect();
        assert_eq!(report.divergent, expected);
    }

    #[test]
    fn actor_tampering_is_detected() {
        let (chain, store) = chain_with_store();
        fill(&chain, 3);

        store.tamper(2, |record| {
            record.actor_id = "wallet_evil".to_string();
        });

        let report = chain.verify_chain(0).unwrap();
        assert!(!report.valid);
        assert_eq!(report.divergent.len(), 2); // records 2 and 3
    }

    #[test]
    fn record_hash_tampering_flags_the_broken_link() {
        let (chain, store) = chain_with_store();
        fill(&chain, 4);

        store.tamper(2, |record| {
            record.record_hash = "0".repeat(64);
        });

        let records = chain.records(0).unwrap();
        let report = chain.verify_chain(0).unwrap();

        assert!(!report.valid);
        // Record 2 fails recomputation; record 3's prev_hash no longer
        // matches its stored predecessor. Record 4's link is intact.
        assert_eq!(
            report.divergent,
            vec![records[1].id.clone(), records[2].id.clone()]
        );
    }

    #[test]
    fn remediate_annotates_without_rewriting() {
        let (chain, store) = chain_with_store();
        fill(&chain, 3);

        let before = chain.records(0).unwrap();
        store.tamper(2, |record| {
            record.payload = json!({"forged": true});
        });

        let report = chain.remediate(0).unwrap();
        assert!(!report.valid);
        assert_eq!(report.divergent.len(), 2);

        let after = chain.records(0).unwrap();
        for (b, a) in before.iter().zip(&after) {
            // Chain-critical fields are preserved as forensic evidence.
            assert_eq!(a.prev_hash, b.prev_hash);
            assert!(a.expected_hash.is_some());
        }
        assert!(!after[0].tampered);
        assert!(after[1].tampered);
        assert!(after[2].tampered);
        // The clean head's annotation matches its stored hash.
        assert_eq!(after[0].expected_hash.as_deref(), Some(after[0].record_hash.as_str()));
    }

    #[test]
    fn export_import_roundtrip_reverifies() {
        let (chain, _) = chain_with_store();
        fill(&chain, 4);

        let artifact = chain.export_jsonl().unwrap();
        assert_eq!(artifact.lines().count(), 4);

        let offline_store = Arc::new(MemoryAuditStore::new());
        let imported = import_jsonl(offline_store.as_ref(), &artifact).unwrap();
        assert_eq!(imported, 4);

        let offline_chain = AuditChain::new(offline_store);
        let report = offline_chain.verify_chain(0).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 4);
    }

    #[test]
    fn concurrent_appends_form_one_linear_chain() {
        let (chain, _) = chain_with_store();
        let chain = Arc::new(chain);

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let chain = Arc::clone(&chain);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        chain
                            .append(
                                "stress.append",
                                &format!("wallet_{worker}"),
                                Tier::Operator,
                                json!({"worker": worker, "i": i}),
                                None,
                            )
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let records = chain.records(0).unwrap();
        assert_eq!(records.len(), 200);

        // One linear chain: contiguous seqs, each prev_hash matching.
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.seq, i as u64 + 1);
            if i > 0 {
                assert_eq!(record.prev_hash, records[i - 1].record_hash);
            }
        }

        let report = chain.verify_chain(0).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 200);
    }

    #[test]
    fn limit_bounds_the_walk() {
        let (chain, _) = chain_with_store();
        fill(&chain, 6);

        let report = chain.verify_chain(3).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 3);
    }
}
