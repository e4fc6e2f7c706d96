// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Short-lived, single-use challenge records and their store abstraction.
//!
//! Two kinds of challenge flow through this store:
//!
//! - [`WalletChallenge`], keyed by wallet address, for one-time wallet
//!   ownership proofs. Exactly one live challenge per wallet; a new request
//!   overwrites the prior one.
//! - [`ActionChallenge`], keyed by nonce, binding one actor to one action
//!   type and one payload digest for per-action replay protection.
//!
//! Single-use consumption happens through [`ChallengeStore::take`], which is
//! an atomic lookup-then-delete: a replayed signature racing a successful
//! verification sees `None` instead of a second acceptance.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending wallet ownership proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletChallenge {
    /// Single-use random value bound into the signable message.
    pub nonce: String,
    /// The exact message the client must sign.
    pub message: String,
    /// Issue time; challenges expire after the configured TTL.
    pub created_at: DateTime<Utc>,
}

/// A pending per-action signature challenge.
///
/// The binding is three-way: nonce ↔ actor ↔ (action type, payload hash).
/// A signature valid for one binding must be rejected for any other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionChallenge {
    /// Wallet address of the actor the challenge was issued to.
    pub actor_id: String,
    /// The privileged action this challenge authorizes.
    pub action_type: String,
    /// SHA-256 hex digest of the action payload.
    pub payload_hash: String,
    /// Issue time; challenges expire after the configured TTL.
    pub created_at: DateTime<Utc>,
}

/// Records that know when they were created, so stores can purge them.
pub trait Expires {
    fn created_at(&self) -> DateTime<Utc>;
}

impl Expires for WalletChallenge {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Expires for ActionChallenge {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Key-value store for ephemeral challenge records.
///
/// Implementations must make [`take`](Self::take) atomic per key: a
/// lookup-then-delete that can hand the record to at most one caller.
pub trait ChallengeStore<V: Clone + Send>: Send + Sync {
    /// Insert or overwrite the record under `key`.
    fn put(&self, key: &str, value: V);

    /// Read without consuming.
    fn get(&self, key: &str) -> Option<V>;

    /// Atomically remove and return the record under `key`.
    fn take(&self, key: &str) -> Option<V>;

    /// Remove the record under `key`, if any.
    fn remove(&self, key: &str);

    /// Drop every record created before `cutoff`. Returns how many were
    /// removed.
    fn purge_expired(&self, cutoff: DateTime<Utc>) -> usize;
}

/// In-memory challenge store backed by a mutex-guarded map.
pub struct MemoryChallengeStore<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V> MemoryChallengeStore<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, V>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V> Default for MemoryChallengeStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Expires> ChallengeStore<V> for MemoryChallengeStore<V> {
    fn put(&self, key: &str, value: V) {
        self.lock().insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    fn take(&self, key: &str) -> Option<V> {
        self.lock().remove(key)
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn purge_expired(&self, cutoff: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, v| v.created_at() >= cutoff);
        before - entries.len()
    }
}
