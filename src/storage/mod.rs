// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistence for verified admin identities.

pub mod identity;

pub use identity::{Identity, IdentityStore, MemoryIdentityStore};
