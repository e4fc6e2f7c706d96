// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-action signature challenges.
//!
//! Before a privileged write is accepted, the actor requests a challenge
//! bound three ways: nonce ↔ actor ↔ (action type, payload digest). The
//! actor signs the returned message and presents nonce + signature with the
//! write. Verification consumes the nonce atomically *before* the side
//! effect is applied, so a retried request can never be accepted twice.
//!
//! The whole mechanism is optional per deployment
//! (`TrustConfig::require_action_signatures`); when disabled both
//! operations become no-ops and callers proceed ungated.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::challenge::{ActionChallenge, ChallengeStore};
use crate::config::TrustConfig;
use crate::crypto;
use crate::error::{AuthFailure, TrustResult};

/// A challenge handed to the client for signing.
#[derive(Debug, Clone)]
pub struct ActionGrant {
    /// Nonce to present alongside the signature.
    pub nonce: String,
    /// The exact message the client must sign.
    pub message: String,
}

/// Issues and verifies per-action signature challenges.
pub struct ActionChallengeService {
    config: TrustConfig,
    challenges: Arc<dyn ChallengeStore<ActionChallenge>>,
}

impl ActionChallengeService {
    pub fn new(config: TrustConfig, challenges: Arc<dyn ChallengeStore<ActionChallenge>>) -> Self {
        if !config.require_action_signatures {
            tracing::warn!("action signature enforcement disabled by configuration");
        }
        Self { config, challenges }
    }

    /// Whether enforcement is active in this deployment.
    pub fn enabled(&self) -> bool {
        self.config.require_action_signatures
    }

    /// Issue a challenge for one specific action with one specific payload.
    pub fn request_action_challenge(
        &self,
        actor_id: &str,
        action_type: &str,
        payload: &serde_json::Value,
    ) -> TrustResult<ActionGrant> {
        crypto::decode_wallet_address(actor_id)?;

        let payload_hash = crypto::sha256_hex(payload.to_string().as_bytes());
        let nonce = Uuid::new_v4().to_string();
        let message = signable_message(actor_id, action_type, &payload_hash, &nonce);

        self.challenges.put(
            &nonce,
            ActionChallenge {
                actor_id: actor_id.to_string(),
                action_type: action_type.to_string(),
                payload_hash,
                created_at: Utc::now(),
            },
        );

        tracing::debug!(actor = actor_id, action = action_type, "issued action challenge");
        Ok(ActionGrant { nonce, message })
    }

    /// Verify a signed action challenge and consume the nonce.
    ///
    /// The nonce is removed atomically with the successful check, before the
    /// caller applies any side effect; a concurrent retry with the same
    /// nonce reads as [`AuthFailure::UnknownNonce`].
    ///
    /// No-op when enforcement is disabled.
    pub fn verify_action_signature(
        &self,
        actor_wallet: &str,
        signature: &str,
        nonce: &str,
    ) -> TrustResult<()> {
        if !self.config.require_action_signatures {
            return Ok(());
        }

        let challenge = self
            .challenges
            .get(nonce)
            .ok_or(AuthFailure::UnknownNonce)?;

        if challenge.actor_id != actor_wallet {
            return Err(AuthFailure::ActorMismatch.into());
        }

        if Utc::now() - challenge.created_at > self.config.challenge_ttl {
            self.challenges.remove(nonce);
            return Err(AuthFailure::ChallengeExpired.into());
        }

        let message = signable_message(
            &challenge.actor_id,
            &challenge.action_type,
            &challenge.payload_hash,
            nonce,
        );
        crypto::verify_wallet_signature(actor_wallet, message.as_bytes(), signature)?;

        // Single use: consume before the caller applies the action.
        self.challenges
            .take(nonce)
            .ok_or(AuthFailure::UnknownNonce)?;

        Ok(())
    }
}

/// The message format clients sign. Reconstructed from the stored binding
/// at verification time, so a signature can only match its own binding.
fn signable_message(actor_id: &str, action_type: &str, payload_hash: &str, nonce: &str) -> String {
    format!(
        "Admin action authorization\nactor: {actor_id}\naction: {action_type}\npayload-sha256: {payload_hash}\nnonce: {nonce}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::challenge::MemoryChallengeStore;
    use crate::crypto::test_keys::TestWallet;
    use crate::error::TrustError;
    use serde_json::json;

    fn service(config: TrustConfig) -> ActionChallengeService {
        ActionChallengeService::new(config, Arc::new(MemoryChallengeStore::new()))
    }

    #[test]
    fn request_sign_verify_roundtrip() {
        let wallet = TestWallet::generate();
        let service = service(TrustConfig::default());

        let grant = service
            .request_action_challenge(&wallet.address, "config.rotate", &json!({"key": "v2"}))
            .unwrap();
        let signature = wallet.sign(grant.message.as_bytes());

        service
            .verify_action_signature(&wallet.address, &signature, &grant.nonce)
            .unwrap();
    }

    #[test]
    fn nonce_is_consumed_on_success() {
        let wallet = TestWallet::generate();
        let service = service(TrustConfig::default());

        let grant = service
            .request_action_challenge(&wallet.address, "config.rotate", &json!({}))
            .unwrap();
        let signature = wallet.sign(grant.message.as_bytes());

        service
            .verify_action_signature(&wallet.address, &signature, &grant.nonce)
            .unwrap();

        let err = service
            .verify_action_signature(&wallet.address, &signature, &grant.nonce)
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::UnknownNonce)
        ));
    }

    #[test]
    fn challenge_is_bound_to_the_actor() {
        // A structurally valid signature from B's own key over B's view of
        // the message must not satisfy a challenge issued to A.
        let actor_a = TestWallet::generate();
        let actor_b = TestWallet::generate();
        let service = service(TrustConfig::default());

        let grant = service
            .request_action_challenge(&actor_a.address, "config.rotate", &json!({"k": 1}))
            .unwrap();
        let signature = actor_b.sign(grant.message.as_bytes());

        let err = service
            .verify_action_signature(&actor_b.address, &signature, &grant.nonce)
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::ActorMismatch)
        ));
    }

    #[test]
    fn unknown_nonce_is_rejected() {
        let wallet = TestWallet::generate();
        let service = service(TrustConfig::default());

        let err = service
            .verify_action_signature(&wallet.address, &wallet.sign(b"x"), "missing-nonce")
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::UnknownNonce)
        ));
    }

    #[test]
    fn expired_challenge_is_rejected() {
        let wallet = TestWallet::generate();
        let mut config = TrustConfig::default();
        config.challenge_ttl = chrono::Duration::seconds(-1);
        let service = service(config);

        let grant = service
            .request_action_challenge(&wallet.address, "config.rotate", &json!({}))
            .unwrap();
        let signature = wallet.sign(grant.message.as_bytes());

        let err = service
            .verify_action_signature(&wallet.address, &signature, &grant.nonce)
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::ChallengeExpired)
        ));
    }

    #[test]
    fn bad_signature_is_rejected_and_challenge_survives() {
        let wallet = TestWallet::generate();
        let service = service(TrustConfig::default());

        let grant = service
            .request_action_challenge(&wallet.address, "config.rotate", &json!({}))
            .unwrap();

        let err = service
            .verify_action_signature(&wallet.address, &wallet.sign(b"wrong message"), &grant.nonce)
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::BadSignature)
        ));

        // The challenge was not consumed by the failed attempt.
        service
            .verify_action_signature(
                &wallet.address,
                &wallet.sign(grant.message.as_bytes()),
                &grant.nonce,
            )
            .unwrap();
    }

    #[test]
    fn disabled_enforcement_passes_everything() {
        let mut config = TrustConfig::default();
        config.require_action_signatures = false;
        let service = service(config);

        assert!(!service.enabled());
        service
            .verify_action_signature("anyone", "not-a-signature", "no-such-nonce")
            .unwrap();
    }

    #[test]
    fn different_payloads_produce_different_bindings() {
        let wallet = TestWallet::generate();
        let service = service(TrustConfig::default());

        let grant_a = service
            .request_action_challenge(&wallet.address, "config.rotate", &json!({"v": 1}))
            .unwrap();
        let grant_b = service
            .request_action_challenge(&wallet.address, "config.rotate", &json!({"v": 2}))
            .unwrap();

        // Signature over A's message cannot satisfy B's nonce.
        let err = service
            .verify_action_signature(
                &wallet.address,
                &wallet.sign(grant_a.message.as_bytes()),
                &grant_b.nonce,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::BadSignature)
        ));
    }
}
