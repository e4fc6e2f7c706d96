// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication & Authorization Module
//!
//! Wallet-signature authentication and tier-based authorization.
//!
//! ## Auth Flow
//!
//! 1. Client requests a challenge for its wallet address
//! 2. Client signs the challenge message with its Ed25519 wallet key
//! 3. The subsystem:
//!    - Verifies the signature against the wallet's public key
//!    - Proves asset ownership via the blockchain RPC collaborator
//!    - Upserts the identity and opens a session
//! 4. Every subsequent privileged write passes the [`gate::AccessPolicy`]
//!    and, when enforcement is enabled, a per-action signed nonce
//!
//! ## Security
//!
//! - Challenges are single-use and expire after the configured TTL
//! - Challenge consumption is an atomic lookup-then-delete
//! - Ownership checks run with a bounded timeout and fail closed

pub mod action;
pub mod challenge;
pub mod gate;
pub mod session;
pub mod tiers;
pub mod wallet;

pub use action::{ActionChallengeService, ActionGrant};
pub use challenge::{ActionChallenge, ChallengeStore, MemoryChallengeStore, WalletChallenge};
pub use gate::AccessPolicy;
pub use session::{Session, SessionStore};
pub use tiers::Tier;
pub use wallet::{VerifiedSession, WalletAuthenticator};
