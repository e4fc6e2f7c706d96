// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate.
//!
//! A declarative mapping from operation name to the allow-list of tiers
//! permitted to request it. The gate is a pure function of
//! `(tier, operation)` and holds no mutable state; it runs before every
//! privileged mutation in the subsystem.
//!
//! Unknown operations are denied for every tier.

use std::collections::HashMap;

use crate::auth::Tier;
use crate::config::TrustConfig;
use crate::error::{TrustError, TrustResult};

/// Well-known operation names used by the default policy.
pub mod operations {
    /// Read-only statistics.
    pub const STATS_READ: &str = "stats.read";
    /// Review submission.
    pub const REVIEW_SUBMIT: &str = "review.submit";
    /// Audit chain reads, verification and remediation.
    pub const AUDIT_ADMIN: &str = "audit.admin";
    /// Multi-sig proposal creation and signing.
    pub const MULTISIG_ADMIN: &str = "multisig.admin";
    /// Multi-sig proposal execution.
    pub const MULTISIG_EXECUTE: &str = "multisig.execute";
}

/// Tier allow-lists per operation.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: HashMap<String, Vec<Tier>>,
    open_gate: bool,
}

impl AccessPolicy {
    /// Build the default policy from configuration.
    pub fn new(config: &TrustConfig) -> Self {
        let mut policy = Self {
            rules: HashMap::new(),
            open_gate: config.insecure_open_gate(),
        };

        policy.allow(
            operations::STATS_READ,
            &[Tier::Observer, Tier::Analyst, Tier::Operator, Tier::Owner],
        );
        policy.allow(
            operations::REVIEW_SUBMIT,
            &[Tier::Analyst, Tier::Operator, Tier::Owner],
        );
        policy.allow(operations::AUDIT_ADMIN, &[Tier::Operator, Tier::Owner]);
        policy.allow(operations::MULTISIG_ADMIN, &[Tier::Operator, Tier::Owner]);
        policy.allow(operations::MULTISIG_EXECUTE, &[Tier::Owner]);

        if policy.open_gate {
            tracing::error!(
                "authorization gate running in insecure open mode: every tier is allowed"
            );
        }

        policy
    }

    /// Register (or replace) the allow-list for an operation.
    pub fn allow(&mut self, operation: impl Into<String>, tiers: &[Tier]) {
        self.rules.insert(operation.into(), tiers.to_vec());
    }

    /// Check whether `tier` may perform `operation`.
    ///
    /// # Errors
    /// Returns [`TrustError::InsufficientTier`] when the tier is not on the
    /// operation's allow-list, or the operation is unknown.
    pub fn check(&self, operation: &str, tier: Tier) -> TrustResult<()> {
        if self.open_gate {
            tracing::warn!(operation, %tier, "insecure open gate allowed operation");
            return Ok(());
        }

        let allowed = self
            .rules
            .get(operation)
            .map(|tiers| tiers.contains(&tier))
            .unwrap_or(false);

        if allowed {
            Ok(())
        } else {
            Err(TrustError::InsufficientTier {
                operation: operation.to_string(),
                tier,
            })
        }
    }
}
