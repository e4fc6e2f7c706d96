// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet challenge-response authentication.
//!
//! ## Flow
//!
//! 1. Client calls [`WalletAuthenticator::request_challenge`] and receives a
//!    human-readable message binding its wallet address to a fresh nonce.
//! 2. Client signs the message with its wallet key and calls
//!    [`WalletAuthenticator::verify`].
//! 3. On success the wallet must additionally prove ownership of one of the
//!    configured assets (NFT gating); the identity is upserted, the
//!    challenge consumed, and a session created.
//!
//! The ownership RPC call is the only network I/O in the subsystem; it runs
//! under a bounded timeout and fails closed (timeout reads as ownership not
//! proven, never as success).

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::challenge::{ChallengeStore, WalletChallenge};
use crate::auth::session::{Session, SessionStore};
use crate::auth::Tier;
use crate::config::TrustConfig;
use crate::crypto;
use crate::error::{AuthFailure, TrustResult};
use crate::rpc::OwnershipClient;
use crate::storage::identity::{Identity, IdentityStore};

/// Result of a successful wallet verification.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    pub identity: Identity,
    pub session: Session,
}

/// Wallet challenge-response authenticator.
pub struct WalletAuthenticator {
    config: TrustConfig,
    challenges: Arc<dyn ChallengeStore<WalletChallenge>>,
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<SessionStore>,
    ownership: Arc<dyn OwnershipClient>,
}

impl WalletAuthenticator {
    pub fn new(
        config: TrustConfig,
        challenges: Arc<dyn ChallengeStore<WalletChallenge>>,
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<SessionStore>,
        ownership: Arc<dyn OwnershipClient>,
    ) -> Self {
        if config.ownership_mints.is_empty() {
            if config.insecure_open_gate() {
                tracing::error!(
                    "no proof-of-ownership mints configured and insecure mode is \
                     active: wallet verification will skip NFT gating"
                );
            } else {
                tracing::warn!(
                    "no proof-of-ownership mints configured: wallet verification \
                     will fail closed"
                );
            }
        }
        Self {
            config,
            challenges,
            identities,
            sessions,
            ownership,
        }
    }

    /// Issue a fresh challenge for `wallet_address`.
    ///
    /// Overwrites any prior live challenge for the same wallet. Returns the
    /// exact message the client must sign.
    pub fn request_challenge(&self, wallet_address: &str) -> TrustResult<String> {
        // Reject addresses that don't decode to a public key before we
        // store anything.
        crypto::decode_wallet_address(wallet_address)?;

        let nonce = Uuid::new_v4().to_string();
        let message = format!(
            "Admin verification request\nwallet: {wallet_address}\nnonce: {nonce}"
        );

        self.challenges.put(
            wallet_address,
            WalletChallenge {
                nonce,
                message: message.clone(),
                created_at: Utc::now(),
            },
        );

        tracing::debug!(wallet = wallet_address, "issued wallet challenge");
        Ok(message)
    }

    /// Verify a signed challenge and establish a session.
    ///
    /// # Errors
    /// - [`AuthFailure::NoChallenge`] if no live challenge exists
    /// - [`AuthFailure::ChallengeExpired`] past the configured TTL
    /// - [`AuthFailure::BadSignature`] if Ed25519 verification fails
    /// - [`AuthFailure::OwnershipNotProven`] if NFT gating fails or times out
    pub async fn verify(
        &self,
        wallet_address: &str,
        signature: &str,
        ip: Option<String>,
    ) -> TrustResult<VerifiedSession> {
        let challenge = self
            .challenges
            .get(wallet_address)
            .ok_or(AuthFailure::NoChallenge)?;

        if Utc::now() - challenge.created_at > self.config.challenge_ttl {
            self.challenges.remove(wallet_address);
            return Err(AuthFailure::ChallengeExpired.into());
        }

        crypto::verify_wallet_signature(wallet_address, challenge.message.as_bytes(), signature)?;

        self.prove_ownership(wallet_address).await?;

        // Consume the challenge exactly once. A concurrent verification that
        // already won the race reads as "no challenge" here.
        let consumed = self
            .challenges
            .take(wallet_address)
            .ok_or(AuthFailure::NoChallenge)?;

        // If the wallet requested a fresh challenge while the ownership
        // check was in flight, the consumed record is not the one this
        // signature was verified against; reject rather than accept a
        // signature over a superseded message.
        if consumed.nonce != challenge.nonce {
            return Err(AuthFailure::NoChallenge.into());
        }

        let identity = self.upsert_identity(wallet_address)?;
        let session = self
            .sessions
            .create(wallet_address, identity.tier, ip);

        tracing::info!(
            wallet = wallet_address,
            tier = %identity.tier,
            session = %session.id,
            "identity verified"
        );

        Ok(VerifiedSession { identity, session })
    }

    /// NFT ownership gating: succeed on the first configured mint the wallet
    /// holds. RPC errors and timeouts count as "not held" for that mint.
    ///
    /// An empty mint list fails closed; skipping the gate requires the
    /// dev-only insecure open-gate mode.
    async fn prove_ownership(&self, wallet_address: &str) -> TrustResult<()> {
        if self.config.ownership_mints.is_empty() {
            if self.config.insecure_open_gate() {
                tracing::error!(
                    wallet = wallet_address,
                    "ownership gating skipped: insecure open-gate mode"
                );
                return Ok(());
            }
            return Err(AuthFailure::OwnershipNotProven.into());
        }

        for mint in &self.config.ownership_mints {
            let check = self.ownership.holds_token(wallet_address, mint);
            match tokio::time::timeout(self.config.ownership_timeout, check).await {
                Ok(Ok(true)) => return Ok(()),
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(wallet = wallet_address, mint, error = %e, "ownership check failed");
                }
                Err(_) => {
                    tracing::warn!(wallet = wallet_address, mint, "ownership check timed out");
                }
            }
        }

        Err(AuthFailure::OwnershipNotProven.into())
    }

    /// Create or refresh the identity record for a verified wallet.
    ///
    /// New identities start at the observer tier unless the wallet is on the
    /// configured owner allow-list; existing identities keep their tier.
    fn upsert_identity(&self, wallet_address: &str) -> TrustResult<Identity> {
        let existing = self.identities.get(wallet_address)?;
        let is_owner_wallet = self
            .config
            .owner_wallets
            .iter()
            .any(|w| w == wallet_address);

        let mut identity = existing.unwrap_or_else(|| Identity {
            wallet_address: wallet_address.to_string(),
            tier: Tier::Observer,
            admin: false,
            owner_verified: false,
            wallet_verified_at: None,
        });

        if is_owner_wallet {
            identity.tier = Tier::Owner;
            identity.admin = true;
        }
        identity.owner_verified = true;
        identity.wallet_verified_at = Some(Utc::now());

        self.identities.upsert(identity.clone())?;
        Ok(identity)
    }
}
