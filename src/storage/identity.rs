// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable identity records keyed by wallet address.
//!
//! Identities are created on first successful wallet verification, updated
//! on re-verification or tier elevation, and never deleted — only
//! superseded by the next upsert. The concrete engine behind
//! [`IdentityStore`] is the hosting service's choice; this subsystem only
//! needs atomic upsert and point lookup.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Tier;
use crate::error::TrustResult;

/// A verified admin identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Wallet address (base64 Ed25519 public key) — the primary identity key.
    pub wallet_address: String,
    /// Authorization tier.
    pub tier: Tier,
    /// Legacy elevation flag, kept for older deployments.
    pub admin: bool,
    /// Set once wallet ownership has been proven.
    pub owner_verified: bool,
    /// Last successful wallet verification, if any.
    pub wallet_verified_at: Option<DateTime<Utc>>,
}

/// Storage seam for identity records.
pub trait IdentityStore: Send + Sync {
    /// Insert or replace the record keyed by its wallet address.
    fn upsert(&self, identity: Identity) -> TrustResult<()>;

    /// Point lookup by wallet address.
    fn get(&self, wallet_address: &str) -> TrustResult<Option<Identity>>;
}

/// In-memory identity store.
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: Mutex<HashMap<String, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Identity>> {
        self.identities
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn upsert(&self, identity: Identity) -> TrustResult<()> {
        self.lock()
            .insert(identity.wallet_address.clone(), identity);
        Ok(())
    }

    fn get(&self, wallet_address: &str) -> TrustResult<Option<Identity>> {
        Ok(self.lock().get(wallet_address).cloned())
    }
}
