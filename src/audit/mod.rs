// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tamper-evident audit logging for privileged administrative actions.
//!
//! Records form a hash chain: each entry's hash input includes the previous
//! entry's hash, so silent alteration of history is detectable by walking
//! the chain and recomputing. See [`chain::AuditChain`].

pub mod chain;
pub mod record;
pub mod store;

pub use chain::{import_jsonl, AuditChain, ChainVerification};
pub use record::AdminAction;
pub use store::{AuditStore, AuditStoreError, MemoryAuditStore, RedbAuditStore};
