// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Multi-signature approval workflow.
//!
//! Privileged actions that require collective approval flow through an
//! M-of-N proposal: the initiator counts as signer #1, further distinct
//! signers are collected, and once `required_signers` is reached the
//! proposal becomes `Complete`. Only an owner-tier actor may then execute
//! it; `Executed` is terminal.
//!
//! `sign` is an atomic read-modify-write per proposal: the signature append
//! and the completeness decision happen inside one critical section, so two
//! racing signatures can neither both trigger the transition nor drop one
//! signature.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Tier;
use crate::config::TrustConfig;
use crate::error::{ConflictKind, TrustError, TrustResult};

/// Proposal lifecycle. Transitions are monotonic:
/// `Pending → Complete → Executed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Complete,
    Executed,
}

/// A proposal awaiting M-of-N approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSigProposal {
    pub id: String,
    pub action_type: String,
    pub payload: serde_json::Value,
    /// How many distinct signers are required (including the initiator).
    pub required_signers: usize,
    /// Signers in the order they signed; the initiator is first.
    pub collected_signers: Vec<String>,
    /// Signatures parallel to `collected_signers`.
    pub signatures: Vec<String>,
    /// Replay-protection nonce presented at proposal time.
    pub nonce: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

/// Proposal lifecycle engine.
pub struct MultiSigEngine {
    proposals: Mutex<HashMap<String, MultiSigProposal>>,
    limiter: RateLimiter,
}

impl MultiSigEngine {
    pub fn new(config: &TrustConfig) -> Self {
        Self {
            proposals: Mutex::new(HashMap::new()),
            limiter: RateLimiter::new(config.proposal_rate_max, config.proposal_rate_window),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MultiSigProposal>> {
        self.proposals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a proposal with the initiator pre-counted as signer #1.
    ///
    /// # Errors
    /// - [`TrustError::Validation`] when `required_signers` is zero
    /// - [`TrustError::RateLimited`] when the actor exceeds the sliding
    ///   window (the only retryable failure in the subsystem)
    pub fn propose(
        &self,
        actor_id: &str,
        action_type: &str,
        payload: serde_json::Value,
        required_signers: usize,
        nonce: &str,
        signature: &str,
    ) -> TrustResult<MultiSigProposal> {
        if required_signers < 1 {
            return Err(TrustError::validation("required_signers must be at least 1"));
        }

        self.limiter.check(actor_id)?;

        let proposal = MultiSigProposal {
            id: Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            payload,
            required_signers,
            collected_signers: vec![actor_id.to_string()],
            signatures: vec![signature.to_string()],
            nonce: nonce.to_string(),
            // A 1-of-N proposal is complete at creation.
            status: if required_signers == 1 {
                ProposalStatus::Complete
            } else {
                ProposalStatus::Pending
            },
            created_at: Utc::now(),
        };

        tracing::info!(
            id = %proposal.id,
            action = action_type,
            initiator = actor_id,
            required = required_signers,
            "multi-sig proposal created"
        );

        self.lock().insert(proposal.id.clone(), proposal.clone());
        Ok(proposal)
    }

    /// Add a signature to a pending proposal.
    ///
    /// Silently returns the current state when the proposal is not pending
    /// or the signer already signed; idempotent re-signing is not an error.
    pub fn sign(&self, id: &str, signer_id: &str, signature: &str) -> TrustResult<MultiSigProposal> {
        let mut proposals = self.lock();
        let proposal = proposals
            .get_mut(id)
            .ok_or_else(|| TrustError::not_found("proposal", id))?;

        if proposal.status != ProposalStatus::Pending
            || proposal.collected_signers.iter().any(|s| s == signer_id)
        {
            return Ok(proposal.clone());
        }

        proposal.collected_signers.push(signer_id.to_string());
        proposal.signatures.push(signature.to_string());

        if proposal.collected_signers.len() >= proposal.required_signers {
            proposal.status = ProposalStatus::Complete;
            tracing::info!(
                id = %proposal.id,
                signers = proposal.collected_signers.len(),
                "multi-sig proposal complete"
            );
        }

        Ok(proposal.clone())
    }

    /// Execute a complete proposal. Owner tier only; `Executed` is terminal.
    ///
    /// # Errors
    /// - [`TrustError::NotFound`] for unknown ids
    /// - [`ConflictKind::AlreadyExecuted`] after execution
    /// - [`ConflictKind::NotComplete`] before enough signatures
    /// - [`TrustError::InsufficientTier`] for non-owner actors
    pub fn execute(&self, id: &str, actor_tier: Tier) -> TrustResult<MultiSigProposal> {
        let mut proposals = self.lock();
        let proposal = proposals
            .get_mut(id)
            .ok_or_else(|| TrustError::not_found("proposal", id))?;

        match proposal.status {
            ProposalStatus::Executed => return Err(ConflictKind::AlreadyExecuted.into()),
            ProposalStatus::Pending => return Err(ConflictKind::NotComplete.into()),
            ProposalStatus::Complete => {}
        }

        if actor_tier != Tier::Owner {
            return Err(TrustError::InsufficientTier {
                operation: "multisig.execute".to_string(),
                tier: actor_tier,
            });
        }

        proposal.status = ProposalStatus::Executed;
        tracing::info!(id = %proposal.id, action = %proposal.action_type, "multi-sig proposal executed");
        Ok(proposal.clone())
    }

    /// Current state of a proposal.
    pub fn get(&self, id: &str) -> TrustResult<MultiSigProposal> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| TrustError::not_found("proposal", id))
    }
}

// =============================================================================
// Rate limiting
// =============================================================================

/// Per-actor sliding-window rate limiter.
struct RateLimiter {
    max: usize,
    window: std::time::Duration,
    events: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    fn new(max: usize, window: std::time::Duration) -> Self {
        Self {
            max,
            window,
            events: Mutex::new(HashMap::new()),
        }
    }

    /// Record one event for `actor`, or fail with the delay after which a
    /// retry can succeed.
    fn check(&self, actor: &str) -> TrustResult<()> {
        let now = Instant::now();
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let queue = events.entry(actor.to_string()).or_default();

        while let Some(front) = queue.front() {
            if now.duration_since(*front) >= self.window {
                queue.pop_front();
            } else {
                break;
            }
        }

        if queue.len() >= self.max {
            let oldest = *queue.front().unwrap_or(&now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(TrustError::RateLimited { retry_after });
        }

        queue.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> MultiSigEngine {
        MultiSigEngine::new(&TrustConfig::default())
    }

    fn propose_n(engine: &MultiSigEngine, required: usize) -> MultiSigProposal {
        engine
            .propose(
                "wallet_a",
                "treasury.sweep",
                json!({"amount": 10}),
                required,
                "nonce-1",
                "sig-a",
            )
            .unwrap()
    }

    #[test]
    fn initiator_counts_as_first_signer() {
        let engine = engine();
        let proposal = propose_n(&engine, 2);

        assert_eq!(proposal.collected_signers, vec!["wallet_a"]);
        assert_eq!(proposal.signatures.len(), 1);
        assert_eq!(proposal.status, ProposalStatus::Pending);
    }

    #[test]
    fn two_signer_flow_completes_and_executes() {
        let engine = engine();
        let proposal = propose_n(&engine, 2);

        let signed = engine.sign(&proposal.id, "wallet_b", "sig-b").unwrap();
        assert_eq!(signed.collected_signers, vec!["wallet_a", "wallet_b"]);
        assert_eq!(signed.status, ProposalStatus::Complete);

        let executed = engine.execute(&proposal.id, Tier::Owner).unwrap();
        assert_eq!(executed.status, ProposalStatus::Executed);
    }

    #[test]
    fn three_signer_lifecycle() {
        let engine = engine();
        let proposal = propose_n(&engine, 3);

        let after_b = engine.sign(&proposal.id, "wallet_b", "sig-b").unwrap();
        assert_eq!(after_b.status, ProposalStatus::Pending);

        // Execute before complete fails.
        let err = engine.execute(&proposal.id, Tier::Owner).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Conflict(ConflictKind::NotComplete)
        ));

        let after_c = engine.sign(&proposal.id, "wallet_c", "sig-c").unwrap();
        assert_eq!(after_c.status, ProposalStatus::Complete);
        assert_eq!(after_c.collected_signers.len(), 3);

        // A 4th signer (already counted) is a no-op.
        let after_dup = engine.sign(&proposal.id, "wallet_b", "sig-b2").unwrap();
        assert_eq!(after_dup.collected_signers.len(), 3);
        assert_eq!(after_dup.signatures.len(), 3);

        // Non-owner execution fails.
        let err = engine.execute(&proposal.id, Tier::Operator).unwrap_err();
        assert!(matches!(err, TrustError::InsufficientTier { .. }));

        let executed = engine.execute(&proposal.id, Tier::Owner).unwrap();
        assert_eq!(executed.status, ProposalStatus::Executed);

        // Executed is terminal.
        let err = engine.execute(&proposal.id, Tier::Owner).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Conflict(ConflictKind::AlreadyExecuted)
        ));

        // Signing after execution is a silent no-op.
        let after_late = engine.sign(&proposal.id, "wallet_d", "sig-d").unwrap();
        assert_eq!(after_late.collected_signers.len(), 3);
        assert_eq!(after_late.status, ProposalStatus::Executed);
    }

    #[test]
    fn one_of_n_is_complete_at_creation() {
        let engine = engine();
        let proposal = propose_n(&engine, 1);
        assert_eq!(proposal.status, ProposalStatus::Complete);
    }

    #[test]
    fn zero_required_signers_is_rejected() {
        let engine = engine();
        let err = engine
            .propose("wallet_a", "t", json!({}), 0, "n", "s")
            .unwrap_err();
        assert!(matches!(err, TrustError::Validation(_)));
    }

    #[test]
    fn unknown_proposal_ids_fail() {
        let engine = engine();
        assert!(matches!(
            engine.sign("missing", "wallet_b", "sig").unwrap_err(),
            TrustError::NotFound { .. }
        ));
        assert!(matches!(
            engine.execute("missing", Tier::Owner).unwrap_err(),
            TrustError::NotFound { .. }
        ));
        assert!(matches!(
            engine.get("missing").unwrap_err(),
            TrustError::NotFound { .. }
        ));
    }

    #[test]
    fn proposals_are_rate_limited_per_actor() {
        let mut config = TrustConfig::default();
        config.proposal_rate_max = 2;
        config.proposal_rate_window = std::time::Duration::from_secs(60);
        let engine = MultiSigEngine::new(&config);

        for _ in 0..2 {
            engine
                .propose("wallet_a", "t", json!({}), 2, "n", "s")
                .unwrap();
        }

        let err = engine
            .propose("wallet_a", "t", json!({}), 2, "n", "s")
            .unwrap_err();
        match err {
            TrustError::RateLimited { retry_after } => {
                assert!(retry_after <= std::time::Duration::from_secs(60));
                assert!(retry_after > std::time::Duration::ZERO);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }

        // A different actor is unaffected.
        engine
            .propose("wallet_b", "t", json!({}), 2, "n", "s")
            .unwrap();
    }

    #[test]
    fn concurrent_signatures_are_not_dropped() {
        use std::sync::Arc;

        let engine = Arc::new(engine());
        let proposal = engine
            .propose("wallet_a", "t", json!({}), 5, "n", "sig-a")
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                let id = proposal.id.clone();
                std::thread::spawn(move || {
                    engine
                        .sign(&id, &format!("wallet_{i}"), &format!("sig_{i}"))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let final_state = engine.get(&proposal.id).unwrap();
        assert_eq!(final_state.status, ProposalStatus::Complete);
        // Exactly required_signers collected; signatures stayed parallel.
        assert_eq!(final_state.collected_signers.len(), 5);
        assert_eq!(final_state.signatures.len(), 5);
    }
}
