// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin tiers for authorization.

use serde::{Deserialize, Serialize};

/// Admin tiers for authorization.
///
/// ## Tier Hierarchy
///
/// - `Owner` - full access, including multi-sig execution
/// - `Operator` - audit and multi-sig administration
/// - `Analyst` - review submission
/// - `Observer` - read-only statistics
///
/// Tiers are linearly ordered; a higher tier carries every privilege of the
/// tiers below it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Read-only statistics access.
    Observer,
    /// Can submit reviews.
    Analyst,
    /// Audit and multi-sig administration.
    Operator,
    /// Full access, including multi-sig execution.
    Owner,
}

impl Tier {
    /// Check if this tier has at least the privileges of the required tier.
    pub fn has_privilege(&self, required: Tier) -> bool {
        *self >= required
    }

    /// Parse a tier from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Tier> {
        match s.to_lowercase().as_str() {
            "observer" => Some(Tier::Observer),
            "analyst" => Some(Tier::Analyst),
            "operator" => Some(Tier::Operator),
            "owner" => Some(Tier::Owner),
            _ => None,
        }
    }

    /// Lowercase label, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Observer => "observer",
            Tier::Analyst => "analyst",
            Tier::Operator => "operator",
            Tier::Owner => "owner",
        }
    }
}

impl Default for Tier {
    /// Default tier is Observer (least privilege for verified identities).
    fn default() -> Self {
        Tier::Observer
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
