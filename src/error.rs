// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-wide error taxonomy.
//!
//! Authentication and authorization failures are local and non-retryable
//! without new input (a fresh signature). `RateLimited` is the only variant
//! that is retryable after a delay. Chain tampering is *not* an error:
//! `verify_chain`/`remediate` return findings instead.

use std::time::Duration;

use crate::auth::Tier;

/// Result alias used throughout the crate.
pub type TrustResult<T> = Result<T, TrustError>;

/// Top-level error type for all trust subsystem operations.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    /// Malformed input rejected before any state change.
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication failure (challenge/signature/ownership).
    #[error(transparent)]
    Authentication(#[from] AuthFailure),

    /// The presented tier is not allowed to perform the operation.
    #[error("tier '{tier}' may not perform '{operation}'")]
    InsufficientTier { operation: String, tier: Tier },

    /// Referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// State machine conflict (e.g. executing an incomplete proposal).
    #[error(transparent)]
    Conflict(#[from] ConflictKind),

    /// Sliding-window rate limit exceeded; retry after the given delay.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Authentication failure reasons.
///
/// Each variant carries a stable snake_case code so callers can map
/// failures to wire-level error codes without string matching.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthFailure {
    /// No live challenge exists for this wallet.
    #[error("no challenge issued for this wallet")]
    NoChallenge,

    /// The challenge exists but is older than the configured TTL.
    #[error("challenge has expired")]
    ChallengeExpired,

    /// Ed25519 verification of the signed message failed.
    #[error("signature verification failed")]
    BadSignature,

    /// The action challenge was issued to a different actor.
    #[error("challenge was issued to a different actor")]
    ActorMismatch,

    /// No action challenge exists for the presented nonce.
    #[error("unknown action nonce")]
    UnknownNonce,

    /// The wallet holds none of the configured proof-of-ownership assets.
    #[error("wallet ownership not proven")]
    OwnershipNotProven,
}

impl AuthFailure {
    /// Stable error code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::NoChallenge => "no_challenge",
            AuthFailure::ChallengeExpired => "challenge_expired",
            AuthFailure::BadSignature => "bad_signature",
            AuthFailure::ActorMismatch => "actor_mismatch",
            AuthFailure::UnknownNonce => "unknown_nonce",
            AuthFailure::OwnershipNotProven => "ownership_not_proven",
        }
    }
}

/// State-machine conflicts for the multi-signature workflow.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConflictKind {
    /// The proposal has not collected the required signatures.
    #[error("proposal has not collected the required signatures")]
    NotComplete,

    /// The proposal was already executed; `Executed` is terminal.
    #[error("proposal has already been executed")]
    AlreadyExecuted,
}

impl TrustError {
    /// Shorthand for [`TrustError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        TrustError::Validation(message.into())
    }

    /// Shorthand for [`TrustError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        TrustError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_codes_are_stable() {
        assert_eq!(AuthFailure::NoChallenge.code(), "no_challenge");
        assert_eq!(AuthFailure::BadSignature.code(), "bad_signature");
        assert_eq!(
            AuthFailure::OwnershipNotProven.code(),
            "ownership_not_proven"
        );
    }

    #[test]
    fn auth_failure_converts_to_trust_error() {
        let err: TrustError = AuthFailure::ChallengeExpired.into();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::ChallengeExpired)
        ));
    }

    #[test]
    fn constructors_build_expected_variants() {
        let err = TrustError::not_found("proposal", "abc");
        assert_eq!(err.to_string(), "proposal not found: abc");

        let err = TrustError::validation("bad address");
        assert_eq!(err.to_string(), "validation error: bad address");
    }
}
