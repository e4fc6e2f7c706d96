// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain RPC collaborator contract.
//!
//! The subsystem asks the chain exactly one question: does wallet W hold a
//! positive balance of mint M. Everything else an RPC client can do
//! (balances, transfers, history) is irrelevant here and deliberately
//! absent from this trait.

use std::collections::HashSet;

use async_trait::async_trait;

/// Errors surfaced by the ownership collaborator.
///
/// Callers treat any error (and any timeout) as ownership not proven;
/// the check fails closed.
#[derive(Debug, thiserror::Error)]
pub enum OwnershipError {
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Yes/no token-ownership oracle.
#[async_trait]
pub trait OwnershipClient: Send + Sync {
    /// Whether `owner` holds a positive balance of `mint`.
    ///
    /// Implementations typically issue a "token accounts by owner,
    /// restricted to mint" query and report whether any account has a
    /// non-zero amount.
    async fn holds_token(&self, owner: &str, mint: &str) -> Result<bool, OwnershipError>;
}

/// Fixed-answer ownership client for tests and local development.
#[derive(Debug, Default)]
pub struct StaticOwnership {
    holdings: HashSet<(String, String)>,
}

impl StaticOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` holds `mint`.
    pub fn grant(mut self, owner: &str, mint: &str) -> Self {
        self.holdings.insert((owner.to_string(), mint.to_string()));
        self
    }
}

#[async_trait]
impl OwnershipClient for StaticOwnership {
    async fn holds_token(&self, owner: &str, mint: &str) -> Result<bool, OwnershipError> {
        Ok(self
            .holdings
            .contains(&(owner.to_string(), mint.to_string())))
    }
}
