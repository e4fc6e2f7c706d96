// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration for the trust subsystem. The hosting service loads this
//! from the environment at startup and hands it to the components.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TRUST_CHALLENGE_TTL_SECS` | Lifetime of wallet/action challenges | `300` |
//! | `TRUST_SESSION_TTL_SECS` | Lifetime of admin sessions | `86400` |
//! | `TRUST_REQUIRE_ACTION_SIGNATURES` | Gate privileged writes behind per-action signatures | `true` |
//! | `TRUST_OWNERSHIP_MINTS` | Comma-separated proof-of-ownership mint addresses | empty (verification fails closed) |
//! | `TRUST_OWNER_WALLETS` | Comma-separated wallet addresses elevated to owner tier | empty |
//! | `TRUST_PROPOSAL_RATE_MAX` | Max proposals per actor per window | `5` |
//! | `TRUST_PROPOSAL_RATE_WINDOW_SECS` | Proposal rate-limit window | `300` |
//! | `TRUST_OWNERSHIP_TIMEOUT_SECS` | Bound on each ownership RPC call | `5` |
//! | `TRUST_INSECURE_OPEN_GATE` | Allow every tier through the gate (dev builds only) | `false` |

use std::env;
use std::time::Duration;

/// Configuration for the trust subsystem.
#[derive(Debug, Clone)]
pub struct TrustConfig {
    /// How long wallet and action challenges stay valid.
    pub challenge_ttl: chrono::Duration,
    /// How long sessions stay valid without re-verification.
    pub session_ttl: chrono::Duration,
    /// When false, per-action signature checks are skipped entirely.
    pub require_action_signatures: bool,
    /// Mint addresses whose positive balance proves wallet ownership.
    /// Empty fails verification closed unless the insecure open-gate mode
    /// is active.
    pub ownership_mints: Vec<String>,
    /// Wallet addresses elevated to the owner tier on verification.
    pub owner_wallets: Vec<String>,
    /// Maximum proposals per actor inside the rate-limit window.
    pub proposal_rate_max: usize,
    /// Sliding rate-limit window for proposals.
    pub proposal_rate_window: Duration,
    /// Upper bound on each ownership RPC call; timeouts fail closed.
    pub ownership_timeout: Duration,
    /// Insecure open-gate mode: every tier passes the authorization gate.
    /// Only settable in `dev` builds; production builds refuse it.
    insecure_open_gate: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            challenge_ttl: chrono::Duration::seconds(300),
            session_ttl: chrono::Duration::seconds(86_400),
            require_action_signatures: true,
            ownership_mints: Vec::new(),
            owner_wallets: Vec::new(),
            proposal_rate_max: 5,
            proposal_rate_window: Duration::from_secs(300),
            ownership_timeout: Duration::from_secs(5),
            insecure_open_gate: false,
        }
    }
}

impl TrustConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = read_u64("TRUST_CHALLENGE_TTL_SECS") {
            config.challenge_ttl = chrono::Duration::seconds(secs as i64);
        }
        if let Some(secs) = read_u64("TRUST_SESSION_TTL_SECS") {
            config.session_ttl = chrono::Duration::seconds(secs as i64);
        }
        if let Some(flag) = read_bool("TRUST_REQUIRE_ACTION_SIGNATURES") {
            config.require_action_signatures = flag;
        }
        config.ownership_mints = read_list("TRUST_OWNERSHIP_MINTS");
        config.owner_wallets = read_list("TRUST_OWNER_WALLETS");
        if let Some(max) = read_u64("TRUST_PROPOSAL_RATE_MAX") {
            config.proposal_rate_max = max as usize;
        }
        if let Some(secs) = read_u64("TRUST_PROPOSAL_RATE_WINDOW_SECS") {
            config.proposal_rate_window = Duration::from_secs(secs);
        }
        if let Some(secs) = read_u64("TRUST_OWNERSHIP_TIMEOUT_SECS") {
            config.ownership_timeout = Duration::from_secs(secs);
        }

        if read_bool("TRUST_INSECURE_OPEN_GATE").unwrap_or(false) {
            #[cfg(feature = "dev")]
            {
                tracing::error!(
                    "TRUST_INSECURE_OPEN_GATE enabled: the authorization gate will \
                     allow every tier. Never run this configuration in production."
                );
                config.insecure_open_gate = true;
            }
            #[cfg(not(feature = "dev"))]
            tracing::error!(
                "TRUST_INSECURE_OPEN_GATE is set but this is not a dev build; \
                 refusing to open the authorization gate"
            );
        }

        config
    }

    /// Whether the insecure open-gate mode is active.
    pub fn insecure_open_gate(&self) -> bool {
        self.insecure_open_gate
    }

    /// Enable the insecure open-gate mode (dev builds only).
    #[cfg(feature = "dev")]
    pub fn with_insecure_open_gate(mut self) -> Self {
        tracing::error!(
            "insecure open-gate mode enabled: the authorization gate will allow every tier"
        );
        self.insecure_open_gate = true;
        self
    }
}

fn read_u64(name: &str) -> Option<u64> {
    env::var(name).ok()?.trim().parse().ok()
}

fn read_bool(name: &str) -> Option<bool> {
    match env::var(name).ok()?.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn read_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
