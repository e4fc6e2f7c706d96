// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Admin Trust & Audit Subsystem
//!
//! Wallet-signature authentication, tiered authorization, tamper-evident
//! audit logging, and multi-signature approval for the administrative
//! surface of the service. The hosting layer (HTTP, bot commands) calls
//! into this crate; nothing here speaks a wire protocol.
//!
//! ## Modules
//!
//! - [`auth`]: challenge-response wallet verification, sessions, the
//!   tier-based authorization gate, and per-action signature challenges
//! - [`audit`]: the SHA-256 hash-chained admin action log with
//!   verification and remediation
//! - [`multisig`]: M-of-N proposal approval with per-actor rate limiting
//! - [`storage`]: verified identity persistence
//! - [`rpc`]: the ownership-proof client boundary
//! - [`config`]: environment-driven runtime configuration
//! - [`crypto`]: Ed25519 signature verification and hashing primitives
//! - [`error`]: the subsystem error taxonomy
//!
//! ## Dev feature
//!
//! The `dev` cargo feature unlocks the insecure open-gate mode for local
//! development. Production builds refuse it even when the environment
//! asks for it.

pub mod audit;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod multisig;
pub mod rpc;
pub mod storage;

pub use audit::{AuditChain, ChainVerification};
pub use auth::{AccessPolicy, Tier, WalletAuthenticator};
pub use config::TrustConfig;
pub use error::{TrustError, TrustResult};
pub use multisig::{MultiSigEngine, MultiSigProposal, ProposalStatus};
