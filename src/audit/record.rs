// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit records and their hash invariant.
//!
//! Every privileged administrative action is recorded as an [`AdminAction`].
//! Records are hash-linked:
//!
//! ```text
//! record_hash = SHA256(prev_hash | action_type | actor_id | actor_tier
//!                      | payload | correlation_id | created_at)
//! ```
//!
//! and `prev_hash` of record N must equal `record_hash` of record N-1
//! (empty string for the first record ever). Records are immutable once
//! written except for the remediation annotation fields, which never alter
//! `record_hash` or `prev_hash`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Tier;
use crate::crypto;

/// An append-only audit record of one privileged action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminAction {
    /// Unique record id.
    pub id: String,
    /// Writer-assigned monotonic sequence number; defines chain order
    /// independently of wall-clock time.
    pub seq: u64,
    /// What was done.
    pub action_type: String,
    /// Wallet address of the actor.
    pub actor_id: String,
    /// The actor's tier at the time of the action.
    pub actor_tier: Tier,
    /// Action payload as recorded.
    pub payload: serde_json::Value,
    /// Optional cross-system correlation id.
    pub correlation_id: Option<String>,
    /// `record_hash` of the preceding record; empty for the first.
    pub prev_hash: String,
    /// Hash over this record's chain-critical fields.
    pub record_hash: String,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
    /// Remediation only: the hash this record *should* carry.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expected_hash: Option<String>,
    /// Remediation only: set when the record diverges from the recomputed
    /// chain.
    #[serde(default)]
    pub tampered: bool,
}

impl AdminAction {
    /// Compute the chain hash for a record's fields.
    ///
    /// Fields are pipe-joined UTF-8: the payload as compact JSON text, the
    /// timestamp as RFC 3339 with fixed nanosecond precision, an absent
    /// correlation id as the empty string. All inputs round-trip through
    /// serde unchanged, so an exported chain re-verifies offline.
    pub fn compute_hash(
        prev_hash: &str,
        action_type: &str,
        actor_id: &str,
        actor_tier: Tier,
        payload: &serde_json::Value,
        correlation_id: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> String {
        let input = format!(
            "{prev_hash}|{action_type}|{actor_id}|{tier}|{payload}|{correlation}|{created}",
            tier = actor_tier,
            payload = payload,
            correlation = correlation_id.unwrap_or(""),
            created = created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        );
        crypto::sha256_hex(input.as_bytes())
    }

    /// Recompute this record's hash assuming `prev_hash` as the predecessor.
    pub fn hash_with_prev(&self, prev_hash: &str) -> String {
        Self::compute_hash(
            prev_hash,
            &self.action_type,
            &self.actor_id,
            self.actor_tier,
            &self.payload,
            self.correlation_id.as_deref(),
            self.created_at,
        )
    }
}
